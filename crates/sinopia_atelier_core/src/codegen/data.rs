//! The element data object (`{key:...,attrs:{...},on:{...}}`).

use std::borrow::Cow;

use sinopia_carton::{format_compact, js_string};
use sinopia_relief::{
    Attr, Code, DirectiveNode, DirectiveOutput, ElementNode, Helper, PropKey, TemplateNode,
};

use super::{events::gen_handlers, generate, transform_special_newlines, CodegenContext};
use crate::directives::base_directive;

fn ident(name: &str) -> PropKey {
    PropKey::Ident(name.into())
}

impl CodegenContext<'_> {
    pub(super) fn gen_data(&mut self, el: &ElementNode) -> Code {
        let mut entries: Vec<(PropKey, Code)> = Vec::new();

        // directives run first: they may add props and listeners
        let mut props = Cow::Borrowed(&el.props);
        let mut events = Cow::Borrowed(&el.events);
        let mut wrap_data = None;
        let mut wrap_listeners = None;
        let mut model = None;
        let mut runtime_directives = Vec::new();
        for dir in &el.directives {
            let output = self.run_directive(el, dir);
            if output.needs_runtime {
                runtime_directives.push(runtime_directive(dir));
            }
            if !output.props.is_empty() {
                props.to_mut().extend(output.props);
            }
            for (name, handler, important) in output.handlers {
                events.to_mut().add(name, handler, important);
            }
            wrap_data = output.wrap_data.or(wrap_data);
            wrap_listeners = output.wrap_listeners.or(wrap_listeners);
            model = output.model.or(model);
        }
        if !runtime_directives.is_empty() {
            entries.push((ident("directives"), Code::Array(runtime_directives)));
        }

        if let Some(key) = &el.key {
            entries.push((ident("key"), Code::expr(key.clone())));
        }
        if let Some(ref_) = &el.ref_ {
            entries.push((ident("ref"), Code::expr(ref_.clone())));
        }
        if el.ref_in_for {
            entries.push((ident("refInFor"), Code::Bool(true)));
        }
        if self.effective_pre(el) {
            entries.push((ident("pre"), Code::Bool(true)));
        }
        if el.component.is_some() {
            entries.push((ident("tag"), Code::Str(el.tag.clone())));
        }
        for module in &self.options.modules {
            entries.extend(module.gen_data(el));
        }
        if !el.attrs.is_empty() {
            entries.push((ident("attrs"), gen_props(&el.attrs)));
        }
        if !props.is_empty() {
            entries.push((ident("domProps"), gen_props(&props)));
        }
        if !events.is_empty() {
            entries.push((ident("on"), gen_handlers(&events)));
        }
        if !el.native_events.is_empty() {
            entries.push((ident("nativeOn"), gen_handlers(&el.native_events)));
        }
        if let (Some(target), None) = (&el.slot_target, &el.slot_scope) {
            entries.push((ident("slot"), Code::expr(target.clone())));
        }
        if !el.scoped_slots.is_empty() {
            entries.push((ident("scopedSlots"), self.gen_scoped_slots(el)));
        }
        if let Some(model) = model {
            entries.push((
                ident("model"),
                Code::Object(vec![
                    (ident("value"), Code::expr(model.value)),
                    (ident("callback"), Code::ModelCallback(model.assignment)),
                    (ident("expression"), Code::expr(model.expression)),
                ]),
            ));
        }
        if el.inline_template {
            if let Some(inline) = self.gen_inline_template(el) {
                entries.push((ident("inlineTemplate"), inline));
            }
        }

        let mut data = Code::Object(entries);
        if !el.dynamic_attrs.is_empty() {
            data = Code::call(
                Helper::BindObjectProps,
                vec![data, Code::Str(el.tag.clone()), gen_props(&el.dynamic_attrs)],
            );
        }
        if let Some(wrap) = wrap_data {
            let mut args = vec![
                data,
                Code::TagName(el.tag.clone()),
                Code::expr(wrap.value),
                Code::Bool(wrap.as_prop),
            ];
            if wrap.sync {
                args.push(Code::Bool(true));
            }
            data = Code::call(Helper::BindObjectProps, args);
        }
        if let Some(listeners) = wrap_listeners {
            data = Code::call(Helper::BindObjectListeners, vec![data, Code::expr(listeners)]);
        }
        data
    }

    /// Platform directives first, then the built-in `on`/`bind`/`cloak`;
    /// anything else is left entirely to the runtime.
    fn run_directive(&mut self, el: &ElementNode, dir: &DirectiveNode) -> DirectiveOutput {
        if let Some(generator) = self.options.directives.get(dir.name.as_str()) {
            return generator.generate(el, dir, self.diag);
        }
        match base_directive(&dir.name) {
            Some(generator) => generator.generate(el, dir, self.diag),
            None => DirectiveOutput::runtime(),
        }
    }

    /// The single child element compiled as its own render program.
    fn gen_inline_template(&mut self, el: &ElementNode) -> Option<Code> {
        let first = el.children.first().and_then(TemplateNode::as_element);
        if el.children.len() != 1 || first.is_none() {
            self.diag.warn(
                "Inline-template components must have exactly one child element.",
                Some(sinopia_relief::SourceRange::at(el.range.start)),
            );
        }
        let result = generate(Some(first?), self.options, self.diag);
        let static_fns = result
            .static_render_fns
            .into_iter()
            .map(|code| Code::RenderFn(Box::new(code)))
            .collect();
        Some(Code::Object(vec![
            (ident("render"), Code::RenderFn(Box::new(result.render))),
            (ident("staticRenderFns"), Code::Array(static_fns)),
        ]))
    }
}

/// `{name:"focus",rawName:"v-focus",value:(x),expression:"x",arg:"a",modifiers:{"m":true}}`
fn runtime_directive(dir: &DirectiveNode) -> Code {
    let mut entries = vec![
        (ident("name"), Code::expr(format_compact!("\"{}\"", dir.name))),
        (ident("rawName"), Code::expr(format_compact!("\"{}\"", dir.raw_name))),
    ];
    if !dir.value.is_empty() {
        entries.push((ident("value"), Code::paren(Code::expr(dir.value.clone()))));
        entries.push((ident("expression"), Code::expr(js_string(&dir.value))));
    }
    if let Some(arg) = &dir.arg {
        let arg = if dir.is_dynamic_arg {
            Code::expr(arg.clone())
        } else {
            Code::expr(format_compact!("\"{}\"", arg))
        };
        entries.push((ident("arg"), arg));
    }
    if let Some(modifiers) = &dir.modifiers {
        let modifiers = modifiers
            .iter()
            .map(|m| (PropKey::Quoted(m.into()), Code::Bool(true)))
            .collect();
        entries.push((ident("modifiers"), Code::Object(modifiers)));
    }
    Code::Object(entries)
}

/// `{"name":value}`, or `_d({static},[name,value,...])` once any name is
/// dynamic.
pub(super) fn gen_props(props: &[Attr]) -> Code {
    let mut static_props = Vec::new();
    let mut dynamic_props = Vec::new();
    for prop in props {
        let value = Code::expr(transform_special_newlines(&prop.value));
        if prop.dynamic {
            dynamic_props.push(Code::expr(prop.name.clone()));
            dynamic_props.push(value);
        } else {
            static_props.push((PropKey::Quoted(prop.name.clone()), value));
        }
    }
    let static_props = Code::Object(static_props);
    if dynamic_props.is_empty() {
        static_props
    } else {
        Code::call(
            Helper::BindDynamicKeys,
            vec![static_props, Code::Array(dynamic_props)],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::optimize;
    use sinopia_armature::parse;
    use sinopia_relief::{CompilerOptions, Diagnostics, Modifiers};

    fn render_with(src: &str, options: &CompilerOptions) -> (std::string::String, Diagnostics) {
        let mut diag = Diagnostics::new();
        let mut ast = parse(src, options, &mut diag);
        optimize(ast.as_mut(), options);
        let code = generate(ast.as_ref(), options, &mut diag).render.to_string();
        (code, diag)
    }

    fn render(src: &str) -> std::string::String {
        let options = CompilerOptions {
            is_reserved_tag: sinopia_carton::is_reserved_tag,
            ..Default::default()
        };
        render_with(src, &options).0
    }

    #[test]
    fn test_attrs_and_key_ref() {
        assert_eq!(
            render(r#"<div id="app" :title="t" key="k" ref="box"></div>"#),
            "_c('div',{key:\"k\",ref:\"box\",attrs:{\"id\":\"app\",\"title\":t}})"
        );
    }

    #[test]
    fn test_ref_in_for() {
        assert_eq!(
            render(r#"<div><p v-for="i in n" ref="item" :key="i"></p></div>"#),
            "_c('div',_l((n),function(i){return _c('p',{key:i,ref:\"item\",refInFor:true})}),0)"
        );
    }

    #[test]
    fn test_dynamic_attr_name() {
        assert_eq!(
            render(r#"<div :[name]="v" id="a"></div>"#),
            "_c('div',_b({attrs:{\"id\":\"a\"}},\"div\",_d({},[name,v])))"
        );
    }

    #[test]
    fn test_prop_modifier() {
        assert_eq!(
            render(r#"<div :text-content.prop="t"></div>"#),
            "_c('div',{domProps:{\"textContent\":t}})"
        );
    }

    #[test]
    fn test_bind_object() {
        assert_eq!(
            render(r#"<div v-bind="attrs" class="x"></div>"#),
            "_c('div',_b({attrs:{\"class\":\"x\"}},'div',attrs,false))"
        );
        assert_eq!(
            render(r#"<my-comp v-bind.sync="obj"></my-comp>"#),
            "_c('my-comp',_b({},'my-comp',obj,false,true))"
        );
    }

    #[test]
    fn test_on_object() {
        assert_eq!(
            render(r#"<div v-on="listeners"></div>"#),
            "_c('div',_g({},listeners))"
        );
    }

    #[test]
    fn test_runtime_directive_descriptor() {
        assert_eq!(
            render(r#"<div v-focus:[arg].lazy="active"></div>"#),
            "_c('div',{directives:[{name:\"focus\",rawName:\"v-focus:[arg].lazy\",value:(active),expression:\"active\",arg:arg,modifiers:{\"lazy\":true}}]})"
        );
        assert_eq!(
            render(r#"<div v-tooltip:top></div>"#),
            "_c('div',{directives:[{name:\"tooltip\",rawName:\"v-tooltip:top\",arg:\"top\"}]})"
        );
    }

    #[test]
    fn test_cloak_is_compiled_away() {
        assert_eq!(render(r#"<div v-cloak>{{ a }}</div>"#), "_c('div',{},[_v(_s(a))])");
    }

    #[test]
    fn test_component_is_and_native_listener() {
        assert_eq!(
            render(r#"<div :is="view" @click.native="go"></div>"#),
            "_c(view,{tag:\"div\",nativeOn:{\"click\":function($event){return go.apply(null, arguments)}}})"
        );
    }

    #[test]
    fn test_slot_target_attr() {
        assert_eq!(
            render(r#"<comp><p slot="head">x</p></comp>"#),
            "_c('comp',[_c('p',{attrs:{\"slot\":\"head\"},slot:\"head\"},[_v(\"x\")])])"
        );
    }

    #[test]
    fn test_inline_template() {
        assert_eq!(
            render(r#"<comp inline-template><p>{{ a }}</p></comp>"#),
            "_c('comp',{inlineTemplate:{render:function(){with(this){return _c('p',[_v(_s(a))])}},staticRenderFns:[]}})"
        );
    }

    #[test]
    fn test_inline_template_needs_one_child() {
        let options = CompilerOptions {
            is_reserved_tag: sinopia_carton::is_reserved_tag,
            ..Default::default()
        };
        let (_, diag) = render_with(r#"<comp inline-template><p></p><p></p></comp>"#, &options);
        assert_eq!(
            diag.errors()[0].msg,
            "Inline-template components must have exactly one child element."
        );
    }

    #[test]
    fn test_gen_props_escapes_line_separators() {
        let code = gen_props(&[Attr::new("title", "\"a\u{2028}b\"")]);
        assert_eq!(code.to_string(), "{\"title\":\"a\\u2028b\"}");
    }

    #[test]
    fn test_runtime_directive_without_value() {
        let dir = DirectiveNode {
            name: "focus".into(),
            raw_name: "v-focus.once".into(),
            value: "".into(),
            arg: None,
            is_dynamic_arg: false,
            modifiers: Some(["once"].into_iter().collect::<Modifiers>()),
            range: None,
        };
        assert_eq!(
            runtime_directive(&dir).to_string(),
            "{name:\"focus\",rawName:\"v-focus.once\",modifiers:{\"once\":true}}"
        );
    }
}
