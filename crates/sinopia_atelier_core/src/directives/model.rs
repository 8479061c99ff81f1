//! Component `v-model`: `model:{value,callback,expression}` on the data object.

use sinopia_armature::gen_assignment_code;
use sinopia_carton::{format_compact, js_string, String};
use sinopia_relief::{ComponentModel, Modifiers};

const BASE_VALUE_EXPRESSION: &str = "$$v";

/// Model data for `v-model` on a component, honoring `.trim` and `.number`.
pub fn gen_component_model(value: &str, modifiers: Option<&Modifiers>) -> ComponentModel {
    let has = |m: &str| modifiers.is_some_and(|mods| mods.contains(m));

    let mut value_expression = String::from(BASE_VALUE_EXPRESSION);
    if has("trim") {
        value_expression = format_compact!(
            "(typeof {0} === 'string'? {0}.trim(): {0})",
            BASE_VALUE_EXPRESSION
        );
    }
    if has("number") {
        value_expression = format_compact!("_n({})", value_expression);
    }

    ComponentModel {
        value: format_compact!("({})", value),
        expression: js_string(value).into(),
        assignment: gen_assignment_code(value, &value_expression),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_model() {
        let model = gen_component_model("msg", None);
        assert_eq!(model.value, "(msg)");
        assert_eq!(model.expression, "\"msg\"");
        assert_eq!(model.assignment, "msg=$$v");
    }

    #[test]
    fn test_member_target_uses_set() {
        let model = gen_component_model("form.name", None);
        assert_eq!(model.assignment, "$set(form, \"name\", $$v)");
    }

    #[test]
    fn test_trim_and_number() {
        let modifiers: Modifiers = ["trim", "number"].into_iter().collect();
        let model = gen_component_model("n", Some(&modifiers));
        assert_eq!(
            model.assignment,
            "n=_n((typeof $$v === 'string'? $$v.trim(): $$v))"
        );
    }
}
