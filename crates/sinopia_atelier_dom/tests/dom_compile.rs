//! DOM compiler output tests.

use sinopia_atelier_dom::{compile_template, compile_template_with_options, DomCompilerOptions};

/// Helper to get the render source
fn get_compiled(src: &str) -> String {
    let result = compile_template(src);
    if !result.errors.is_empty() {
        panic!("Compilation errors: {:?}", result.errors);
    }
    result.render.to_string()
}

// =============================================================================
// Class and Style Tests
// =============================================================================

mod class_style {
    use super::*;

    #[test]
    fn static_and_bound() {
        insta::assert_snapshot!(
            get_compiled(r#"<div class="a" :class="b" style="color: red" :style="s"></div>"#),
            @r#"with(this){return _c('div',{staticClass:"a",class:b,staticStyle:{"color":"red"},style:(s)})}"#
        );
    }

    #[test]
    fn static_class_stays_static() {
        let result = compile_template(r#"<div><p class="x"><b>hi</b></p>{{ a }}</div>"#);
        assert_eq!(result.render, "with(this){return _c('div',[_m(0),_v(_s(a))])}");
        assert_eq!(
            result.static_render_fns,
            ["with(this){return _c('p',{staticClass:\"x\"},[_c('b',[_v(\"hi\")])])}"]
        );
    }
}

// =============================================================================
// Directive Tests
// =============================================================================

mod directives {
    use super::*;

    #[test]
    fn v_text_and_v_html() {
        insta::assert_snapshot!(
            get_compiled(r#"<div><p v-text="msg"></p><p v-html="raw"></p></div>"#),
            @r#"with(this){return _c('div',[_c('p',{domProps:{"textContent":_s(msg)}}),_c('p',{domProps:{"innerHTML":_s(raw)}})])}"#
        );
    }

    #[test]
    fn v_model_text_input() {
        insta::assert_snapshot!(
            get_compiled(r#"<input v-model="msg">"#),
            @r#"with(this){return _c('input',{directives:[{name:"model",rawName:"v-model",value:(msg),expression:"msg"}],domProps:{"value":(msg)},on:{"input":function($event){if($event.target.composing)return;msg=$event.target.value}}})}"#
        );
    }

    #[test]
    fn v_model_component() {
        insta::assert_snapshot!(
            get_compiled(r#"<my-input v-model="v"></my-input>"#),
            @r#"with(this){return _c('my-input',{model:{value:(v),callback:function ($$v) {v=$$v},expression:"v"}})}"#
        );
    }
}

// =============================================================================
// Options Tests
// =============================================================================

mod options {
    use super::*;

    #[test]
    fn custom_delimiters() {
        let options = DomCompilerOptions {
            delimiters: Some(("${".into(), "}".into())),
            ..Default::default()
        };
        let result = compile_template_with_options("<p>${ a }</p>", options);
        assert_eq!(result.render, "with(this){return _c('p',[_v(_s(a))])}");
    }

    #[test]
    fn interpolation_in_class_warns() {
        let result = compile_template(r#"<div class="{{ a }}"></div>"#);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0]
            .msg
            .starts_with("class=\"{{ a }}\": Interpolation inside attributes has been removed."));
    }
}
