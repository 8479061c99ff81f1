//! `v-model` on form elements and components.

use sinopia_armature::gen_assignment_code;
use sinopia_atelier_core::gen_component_model;
use sinopia_carton::{format_compact, is_reserved_tag, String};
use sinopia_relief::{
    Attr, Diagnostics, DirectiveGenerator, DirectiveNode, DirectiveOutput, ElementNode, Handler,
    SourceRange,
};

/// Event name the runtime maps to `change` or `input` for range inputs,
/// depending on the browser.
pub const RANGE_TOKEN: &str = "__r";

pub struct ModelDirective;

impl DirectiveGenerator for ModelDirective {
    fn generate(
        &self,
        el: &ElementNode,
        dir: &DirectiveNode,
        diag: &mut Diagnostics,
    ) -> DirectiveOutput {
        let value = dir.value.as_str();
        let tag = el.tag.as_str();
        let input_type = el.attr("type");

        if tag == "input" && input_type == Some("file") {
            diag.warn(
                format_compact!(
                    "<{} v-model=\"{}\" type=\"file\">:\nFile inputs are read only. Use a v-on:change listener instead.",
                    tag,
                    value
                ),
                el.raw_attr_range("v-model"),
            );
        }

        if el.component.is_some() {
            return component_model(dir);
        }
        match tag {
            // option syncing needs the live DOM
            "select" => DirectiveOutput::runtime(),
            "input" if matches!(input_type, Some("checkbox" | "radio")) => DirectiveOutput::runtime(),
            "input" | "textarea" => gen_default_model(el, dir, diag),
            _ if !is_reserved_tag(tag) => component_model(dir),
            _ => {
                diag.warn(
                    format_compact!(
                        "<{} v-model=\"{}\">: v-model is not supported on this element type. \
                         If you are working with contenteditable, it's recommended to wrap a \
                         library dedicated for that purpose inside a custom element.",
                        tag,
                        value
                    ),
                    el.raw_attr_range("v-model"),
                );
                DirectiveOutput::runtime()
            }
        }
    }
}

fn component_model(dir: &DirectiveNode) -> DirectiveOutput {
    DirectiveOutput {
        model: Some(gen_component_model(&dir.value, dir.modifiers.as_ref())),
        ..DirectiveOutput::default()
    }
}

fn listener(value: String, range: Option<SourceRange>) -> Handler {
    Handler {
        value,
        dynamic: false,
        modifiers: None,
        range,
    }
}

/// Text-like inputs: a `value` DOM prop plus an input listener assigning
/// back to the model.
fn gen_default_model(el: &ElementNode, dir: &DirectiveNode, diag: &mut Diagnostics) -> DirectiveOutput {
    let value = dir.value.as_str();
    let input_type = el.attr("type");

    let bound_value = ["v-bind:value", ":value"]
        .into_iter()
        .find_map(|binding| el.attr(binding).map(|v| (binding, v)));
    let has_type_binding = el.has_attr("v-bind:type") || el.has_attr(":type");
    if let (Some((binding, bound)), false) = (bound_value, has_type_binding) {
        diag.warn(
            format_compact!(
                "{}=\"{}\" conflicts with v-model on the same element because the latter already expands to a value binding internally",
                binding,
                bound
            ),
            el.raw_attr_range(binding),
        );
    }

    let has = |m: &str| dir.modifiers.as_ref().is_some_and(|mods| mods.contains(m));
    let (lazy, number, trim) = (has("lazy"), has("number"), has("trim"));
    let is_range = input_type == Some("range");
    let need_composition_guard = !lazy && !is_range;
    let event = if lazy {
        "change"
    } else if is_range {
        RANGE_TOKEN
    } else {
        "input"
    };

    let mut value_expression = String::from("$event.target.value");
    if trim {
        value_expression = String::from("$event.target.value.trim()");
    }
    if number {
        value_expression = format_compact!("_n({})", value_expression);
    }
    let mut code = gen_assignment_code(value, &value_expression);
    if need_composition_guard {
        code = format_compact!("if($event.target.composing)return;{}", code);
    }

    let mut handlers = vec![(String::from(event), listener(code, dir.range), true)];
    if trim || number {
        handlers.push((
            String::from("blur"),
            listener(String::from("$forceUpdate()"), dir.range),
            false,
        ));
    }
    DirectiveOutput {
        needs_runtime: true,
        props: vec![Attr {
            range: dir.range,
            ..Attr::new("value", format_compact!("({})", value))
        }],
        handlers,
        ..DirectiveOutput::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sinopia_relief::{Modifiers, RawAttr};

    fn element(tag: &str, attrs: &[(&str, &str)]) -> ElementNode {
        ElementNode::new(
            tag,
            attrs
                .iter()
                .map(|(name, value)| RawAttr {
                    name: (*name).into(),
                    value: (*value).into(),
                    range: SourceRange::default(),
                })
                .collect(),
        )
    }

    fn model(value: &str, modifiers: &[&str]) -> DirectiveNode {
        DirectiveNode {
            name: "model".into(),
            raw_name: "v-model".into(),
            value: value.into(),
            arg: None,
            is_dynamic_arg: false,
            modifiers: (!modifiers.is_empty()).then(|| modifiers.iter().copied().collect::<Modifiers>()),
            range: None,
        }
    }

    #[test]
    fn test_text_input() {
        let mut diag = Diagnostics::new();
        let el = element("input", &[("v-model", "msg")]);
        let output = ModelDirective.generate(&el, &model("msg", &[]), &mut diag);
        assert!(output.needs_runtime);
        assert_eq!(output.props, [Attr::new("value", "(msg)")]);
        let (event, handler, important) = &output.handlers[0];
        assert_eq!(event.as_str(), "input");
        assert_eq!(handler.value, "if($event.target.composing)return;msg=$event.target.value");
        assert!(*important);
        assert!(diag.errors().is_empty());
    }

    #[test]
    fn test_lazy_trim_number() {
        let mut diag = Diagnostics::new();
        let el = element("textarea", &[("v-model.lazy.trim.number", "form.n")]);
        let output = ModelDirective.generate(&el, &model("form.n", &["lazy", "trim", "number"]), &mut diag);
        let events: Vec<&str> = output.handlers.iter().map(|(e, _, _)| e.as_str()).collect();
        assert_eq!(events, ["change", "blur"]);
        assert_eq!(
            output.handlers[0].1.value,
            "$set(form, \"n\", _n($event.target.value.trim()))"
        );
        assert_eq!(output.handlers[1].1.value, "$forceUpdate()");
    }

    #[test]
    fn test_range_input() {
        let mut diag = Diagnostics::new();
        let el = element("input", &[("type", "range"), ("v-model", "v")]);
        let output = ModelDirective.generate(&el, &model("v", &[]), &mut diag);
        assert_eq!(output.handlers[0].0, RANGE_TOKEN);
        assert_eq!(output.handlers[0].1.value, "v=$event.target.value");
    }

    #[test]
    fn test_value_binding_conflict() {
        let mut diag = Diagnostics::new();
        let el = element("input", &[(":value", "x"), ("v-model", "v")]);
        ModelDirective.generate(&el, &model("v", &[]), &mut diag);
        assert_eq!(
            diag.errors()[0].msg,
            ":value=\"x\" conflicts with v-model on the same element because the latter already expands to a value binding internally"
        );
    }

    #[test]
    fn test_components_get_model_data() {
        let mut diag = Diagnostics::new();
        let el = element("my-input", &[("v-model", "v")]);
        let output = ModelDirective.generate(&el, &model("v", &[]), &mut diag);
        assert!(!output.needs_runtime);
        assert_eq!(output.model.map(|m| m.assignment), Some("v=$$v".into()));
    }

    #[test]
    fn test_select_and_checkbox_left_to_runtime() {
        let mut diag = Diagnostics::new();
        for el in [
            element("select", &[("v-model", "v")]),
            element("input", &[("type", "checkbox"), ("v-model", "v")]),
        ] {
            let output = ModelDirective.generate(&el, &model("v", &[]), &mut diag);
            assert_eq!(output, DirectiveOutput::runtime());
        }
    }

    #[test]
    fn test_file_and_unsupported_warnings() {
        let mut diag = Diagnostics::new();
        let el = element("input", &[("type", "file"), ("v-model", "f")]);
        ModelDirective.generate(&el, &model("f", &[]), &mut diag);
        let el = element("div", &[("v-model", "d")]);
        let output = ModelDirective.generate(&el, &model("d", &[]), &mut diag);
        assert!(output.needs_runtime);
        assert_eq!(
            diag.errors()[0].msg,
            "<input v-model=\"f\" type=\"file\">:\nFile inputs are read only. Use a v-on:change listener instead."
        );
        assert!(diag.errors()[1]
            .msg
            .starts_with("<div v-model=\"d\">: v-model is not supported on this element type."));
    }
}
