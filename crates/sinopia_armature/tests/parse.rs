//! Tree builder tests.

use sinopia_armature::{parse, parse_for};
use sinopia_relief::{
    CompilerOptions, Diagnostics, ElementNode, TemplateNode, WhitespaceStrategy,
};

fn parse_with(src: &str, options: &CompilerOptions) -> (Option<ElementNode>, Vec<String>) {
    let mut diag = Diagnostics::new();
    let root = parse(src, options, &mut diag);
    let errors = diag
        .errors()
        .iter()
        .map(|e| e.msg.to_string())
        .collect();
    (root, errors)
}

fn parse_ok(src: &str) -> ElementNode {
    let (root, errors) = parse_with(src, &CompilerOptions::default());
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    root.expect("template has a root")
}

fn parse_errors(src: &str) -> Vec<String> {
    parse_with(src, &CompilerOptions::default()).1
}

fn element(node: &TemplateNode) -> &ElementNode {
    node.as_element().expect("element child")
}

// =============================================================================
// Elements and text
// =============================================================================

mod elements {
    use super::*;

    #[test]
    fn nested_elements_and_interpolation() {
        let root = parse_ok(r#"<div id="app"><span>{{ msg }}</span></div>"#);
        assert_eq!(root.tag, "div");
        assert_eq!(root.attrs.len(), 1);
        assert_eq!(root.attrs[0].name, "id");
        assert_eq!(root.attrs[0].value, "\"app\"");

        let span = element(&root.children[0]);
        assert!(span.plain);
        let TemplateNode::Expression(text) = &span.children[0] else {
            panic!("expected interpolation");
        };
        assert_eq!(text.expression, "_s(msg)");
        assert_eq!(text.text, "{{ msg }}");
    }

    #[test]
    fn entities_are_decoded_in_text() {
        let root = parse_ok("<p>a &amp; b</p>");
        assert_eq!(root.children[0].text(), Some("a & b"));
    }

    #[test]
    fn whitespace_between_elements_is_kept_as_a_space() {
        let root = parse_ok("<div>\n  <span>a</span>\n  <span>b</span>\n</div>");
        assert_eq!(root.children.len(), 3);
        assert_eq!(root.children[1].text(), Some(" "));
    }

    #[test]
    fn condense_drops_whitespace_with_line_breaks() {
        let options = CompilerOptions {
            whitespace: Some(WhitespaceStrategy::Condense),
            ..Default::default()
        };
        let (root, _) = parse_with(
            "<div>\n  <span>a  b</span> <i></i>\n</div>",
            &options,
        );
        let root = root.unwrap();
        assert_eq!(root.children.len(), 3);
        assert_eq!(root.children[1].text(), Some(" "));
        assert_eq!(element(&root.children[0]).children[0].text(), Some("a b"));
    }

    #[test]
    fn comments_kept_only_when_asked() {
        let src = "<div><!-- note --></div>";
        assert!(parse_ok(src).children.is_empty());

        let options = CompilerOptions {
            comments: true,
            ..Default::default()
        };
        let root = parse_with(src, &options).0.unwrap();
        assert!(matches!(&root.children[0], TemplateNode::Comment(c) if c.text == " note "));
    }

    #[test]
    fn v_pre_keeps_raw_content() {
        let root = parse_ok(r#"<div v-pre><span :id="x">{{ raw }}</span></div>"#);
        assert!(root.pre);
        let span = element(&root.children[0]);
        assert_eq!(span.attrs[0].name, ":id");
        assert_eq!(span.attrs[0].value, "\"x\"");
        assert!(matches!(&span.children[0], TemplateNode::Text(t) if t.text == "{{ raw }}"));
    }
}

// =============================================================================
// Structural directives
// =============================================================================

mod structure {
    use super::*;

    #[test]
    fn for_clause() {
        let root = parse_ok(r#"<ul><li v-for="(item, i) in items" :key="item.id"></li></ul>"#);
        let li = element(&root.children[0]);
        let clause = li.for_clause.as_ref().unwrap();
        assert_eq!(clause.source, "items");
        assert_eq!(clause.alias, "item");
        assert_eq!(clause.iterator1.as_deref(), Some("i"));
        assert_eq!(clause.iterator2, None);
        assert_eq!(li.key.as_deref(), Some("item.id"));
        assert!(!li.plain);
    }

    #[test]
    fn parse_for_forms() {
        let clause = parse_for("(value, key, index) of object").unwrap();
        assert_eq!(clause.alias, "value");
        assert_eq!(clause.iterator1.as_deref(), Some("key"));
        assert_eq!(clause.iterator2.as_deref(), Some("index"));

        let clause = parse_for("{ a, b } in list").unwrap();
        assert_eq!(clause.alias, "{ a, b }");
        assert_eq!(clause.iterator1, None);

        assert!(parse_for("items").is_none());
    }

    #[test]
    fn invalid_for_warns() {
        assert_eq!(
            parse_errors(r#"<div><p v-for="item items"></p></div>"#),
            ["Invalid v-for expression: item items"]
        );
    }

    #[test]
    fn if_chain_is_attached_to_head() {
        let root = parse_ok(r#"<div><p v-if="a">A</p><p v-else-if="b">B</p><p v-else>C</p></div>"#);
        assert_eq!(root.children.len(), 1);
        let head = element(&root.children[0]);
        assert_eq!(head.if_exp.as_deref(), Some("a"));
        assert_eq!(head.if_conditions.len(), 2);
        assert_eq!(head.if_conditions[0].exp.as_deref(), Some("b"));
        assert_eq!(head.if_conditions[1].exp, None);
        assert!(head.if_conditions[1].block.is_else);
    }

    #[test]
    fn text_between_branches_is_dropped() {
        assert_eq!(
            parse_errors(r#"<div><p v-if="a"></p>text<p v-else></p></div>"#),
            ["text \"text\" between v-if and v-else(-if) will be ignored."]
        );
    }

    #[test]
    fn else_without_if() {
        assert_eq!(
            parse_errors(r#"<div><p v-else></p></div>"#),
            ["v-else used on element <p> without corresponding v-if."]
        );
        assert_eq!(
            parse_errors(r#"<div><p v-else-if="x"></p></div>"#),
            ["v-else-if=\"x\" used on element <p> without corresponding v-if."]
        );
    }

    #[test]
    fn root_if_chain() {
        let root = parse_ok(r#"<div v-if="a"></div><span v-else></span>"#);
        assert_eq!(root.if_conditions.len(), 1);
        assert_eq!(root.if_conditions[0].block.tag, "span");
    }

    #[test]
    fn once() {
        let root = parse_ok(r#"<div v-once>{{ a }}</div>"#);
        assert!(root.once);
    }
}

// =============================================================================
// Root constraints
// =============================================================================

mod root {
    use super::*;

    #[test]
    fn multiple_roots() {
        let (root, errors) = parse_with("<div></div><span></span>", &CompilerOptions::default());
        assert_eq!(root.unwrap().tag, "div");
        assert_eq!(
            errors,
            ["Component template should contain exactly one root element. If you are using v-if on multiple elements, use v-else-if to chain them instead."]
        );
    }

    #[test]
    fn text_only_template() {
        let (root, errors) = parse_with("hello", &CompilerOptions::default());
        assert!(root.is_none());
        assert_eq!(
            errors,
            ["Component template requires a root element, rather than just text."]
        );
    }

    #[test]
    fn text_outside_root() {
        assert_eq!(
            parse_errors("<div></div> tail"),
            ["text \"tail\" outside root element will be ignored."]
        );
    }

    #[test]
    fn slot_as_root() {
        assert_eq!(
            parse_errors("<slot></slot>"),
            ["Cannot use <slot> as component root element because it may contain multiple nodes."]
        );
    }

    #[test]
    fn for_on_root() {
        assert_eq!(
            parse_errors(r#"<div v-for="i in list"></div>"#),
            ["Cannot use v-for on stateful component root element because it renders multiple elements."]
        );
    }

    #[test]
    fn forbidden_tags_are_dropped() {
        let (root, errors) = parse_with("<div><style>a{}</style></div>", &CompilerOptions::default());
        assert!(root.unwrap().children.is_empty());
        assert_eq!(
            errors,
            ["Templates should only be responsible for mapping the state to the UI. Avoid placing tags with side-effects in your templates, such as <style>, as they will not be parsed."]
        );
    }
}

// =============================================================================
// Slots
// =============================================================================

mod slots {
    use super::*;

    #[test]
    fn named_template_slot() {
        let root = parse_ok(
            r#"<comp><template v-slot:header="{ title }">{{ title }}</template><p>body</p></comp>"#,
        );
        assert_eq!(root.children.len(), 1);
        assert!(!root.plain);
        let header = root.scoped_slots.get("\"header\"").unwrap();
        assert_eq!(header.slot_scope.as_deref(), Some("{ title }"));
        assert!(!header.slot_target_dynamic);
    }

    #[test]
    fn dynamic_slot_name_shorthand() {
        let root = parse_ok(r#"<comp><template #[name]>x</template></comp>"#);
        let slot = root.scoped_slots.get("name").unwrap();
        assert!(slot.slot_target_dynamic);
        assert_eq!(slot.slot_scope.as_deref(), Some("_empty_"));
    }

    #[test]
    fn default_slot_on_component() {
        let root = parse_ok(r#"<comp v-slot="props">{{ props.a }}</comp>"#);
        assert!(root.children.is_empty());
        let slot = root.scoped_slots.get("\"default\"").unwrap();
        assert_eq!(slot.tag, "template");
        assert_eq!(slot.slot_scope.as_deref(), Some("props"));
        assert_eq!(slot.children.len(), 1);
    }

    #[test]
    fn legacy_slot_attribute() {
        let root = parse_ok(r#"<comp><div slot="footer">f</div></comp>"#);
        let div = element(&root.children[0]);
        assert_eq!(div.slot_target.as_deref(), Some("\"footer\""));
        assert_eq!(div.attrs[0].name, "slot");
    }

    #[test]
    fn shorthand_requires_name() {
        assert_eq!(
            parse_errors(r#"<comp><template #>x</template></comp>"#),
            ["v-slot shorthand syntax requires a slot name."]
        );
    }

    #[test]
    fn slot_outlet() {
        let root = parse_ok(r#"<div><slot name="item"></slot></div>"#);
        let slot = element(&root.children[0]);
        assert_eq!(slot.slot_name.as_deref(), Some("\"item\""));
    }
}

// =============================================================================
// Attributes and bindings
// =============================================================================

mod bindings {
    use super::*;

    #[test]
    fn events_with_modifiers() {
        let root = parse_ok(r#"<button @click.stop="go" v-on:[ev]="h"></button>"#);
        let click = root.events.get("click").unwrap();
        assert_eq!(click[0].value, "go");
        assert!(click[0].modifiers.as_ref().unwrap().contains("stop"));
        let dynamic = root.events.get("ev").unwrap();
        assert!(dynamic[0].dynamic);
        assert!(root.has_bindings);
    }

    #[test]
    fn sync_registers_update_handlers() {
        let root = parse_ok(r#"<comp :foo-bar.sync="x"></comp>"#);
        assert_eq!(root.attrs[0].name, "foo-bar");
        assert_eq!(root.attrs[0].value, "x");
        assert_eq!(root.events.get("update:fooBar").unwrap()[0].value, "x=$event");
        assert!(root.events.get("update:foo-bar").is_some());
    }

    #[test]
    fn prop_modifier() {
        let root = parse_ok(r#"<div :inner-html.prop="h"></div>"#);
        assert!(root.attrs.is_empty());
        assert_eq!(root.props[0].name, "innerHTML");
    }

    #[test]
    fn dynamic_attribute_name() {
        let root = parse_ok(r#"<div :[name]="value"></div>"#);
        assert_eq!(root.dynamic_attrs[0].name, "name");
        assert!(root.dynamic_attrs[0].dynamic);
    }

    #[test]
    fn custom_directive() {
        let root = parse_ok(r#"<div v-focus:[arg].lazy="x"></div>"#);
        let dir = &root.directives[0];
        assert_eq!(dir.name, "focus");
        assert_eq!(dir.raw_name, "v-focus:[arg].lazy");
        assert_eq!(dir.arg.as_deref(), Some("arg"));
        assert!(dir.is_dynamic_arg);
        assert!(dir.modifiers.as_ref().unwrap().contains("lazy"));
    }

    #[test]
    fn filters_in_bindings() {
        let root = parse_ok(r#"<div :title="msg | upper"></div>"#);
        assert_eq!(root.attrs[0].value, "_f(\"upper\")(msg)");
    }

    #[test]
    fn component_and_ref_in_for() {
        let root = parse_ok(r#"<div><p v-for="x in xs" ref="row"><b :is="view"></b></p></div>"#);
        let p = element(&root.children[0]);
        assert_eq!(p.ref_.as_deref(), Some("\"row\""));
        assert!(p.ref_in_for);
        assert_eq!(element(&p.children[0]).component.as_deref(), Some("view"));
    }

    #[test]
    fn interpolation_in_attribute_warns() {
        assert_eq!(
            parse_errors(r#"<div id="{{ val }}"></div>"#),
            ["id=\"{{ val }}\": Interpolation inside attributes has been removed. Use v-bind or the colon shorthand instead. For example, instead of <div id=\"{{ val }}\">, use <div :id=\"val\">."]
        );
    }

    #[test]
    fn empty_bind_warns() {
        assert_eq!(
            parse_errors(r#"<div :title=""></div>"#),
            ["The value for a v-bind expression cannot be empty. Found in \"v-bind:title\""]
        );
    }

    #[test]
    fn model_on_for_alias_warns() {
        let errors = parse_errors(r#"<div><input v-for="item in items" v-model="item" /></div>"#);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("<input v-model=\"item\">: You are binding v-model directly"));
    }

    #[test]
    fn keyed_template_warns() {
        assert_eq!(
            parse_errors(r#"<div><template :key="k"><span></span></template></div>"#),
            ["<template> cannot be keyed. Place the key on real elements instead."]
        );
    }

    #[test]
    fn duplicate_attribute() {
        assert_eq!(
            parse_errors(r#"<div id="a" id="b"></div>"#),
            ["duplicate attribute: id"]
        );
    }
}
