//! End-to-end rendering tests: template in, reactive state in, HTML out.

use std::sync::Arc;

use sinopia_canvas::{compile_to_functions, mount, tick, DomCompilerOptions, MountOptions, Value};
use sinopia_tempera::ReactiveObject;

fn state(json: serde_json::Value) -> Value {
    Value::from_json(&json)
}

fn event(pairs: &[(&str, Value)]) -> Value {
    let obj = ReactiveObject::new();
    for (key, value) in pairs {
        obj.insert_plain(key, value.clone());
    }
    Value::Object(obj)
}

// =============================================================================
// Compile and render
// =============================================================================

mod round_trip {
    use super::*;

    #[test]
    fn binding_condition_and_text() {
        let template = r#"<div :class="a" v-if="b">{{c}}</div>"#;
        let mounted = mount(
            template,
            state(serde_json::json!({"a": "x", "b": true, "c": "hi"})),
            MountOptions::default(),
        );
        insta::assert_snapshot!(mounted.html(), @r#"<div class="x">hi</div>"#);

        mounted.state().assign("b", Value::Bool(false));
        tick();
        insta::assert_snapshot!(mounted.html(), @"<!---->");
    }

    #[test]
    fn compile_cache_returns_same_result() {
        let options = DomCompilerOptions::default();
        let first = compile_to_functions("<p>{{ cached }}</p>", &options);
        let second = compile_to_functions("<p>{{ cached }}</p>", &options);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn static_subtree_is_hoisted() {
        let mounted = mount(
            r#"<div><p class="x"><b>hi</b></p>{{ n }}</div>"#,
            state(serde_json::json!({"n": 1})),
            MountOptions::default(),
        );
        let first = mounted.vnode().children[0].clone();
        assert!(first.is_static);
        assert_eq!(first.key, Some(Value::from("__static__0")));

        mounted.state().assign("n", Value::from(2));
        tick();
        insta::assert_snapshot!(mounted.html(), @r#"<div><p class="x"><b>hi</b></p>2</div>"#);
        assert_eq!(mounted.update_count(), 1);
    }

    #[test]
    fn json_view() {
        let mounted = mount(
            r#"<ul class="l"><li v-for="x in xs" :key="x" @click="pick(x)">{{ x }}</li></ul>"#,
            state(serde_json::json!({"xs": ["a"]})),
            MountOptions::default(),
        );
        assert_eq!(
            mounted.vnode().to_json(),
            serde_json::json!({
                "tag": "ul",
                "class": "l",
                "children": [{"tag": "li", "key": "a", "on": ["click"], "children": [{"text": "a"}]}]
            })
        );
    }

    #[test]
    fn style_and_attrs() {
        let mounted = mount(
            r#"<a :href="url" style="color: red" :style="{ fontSize: size + 'px' }" :data-x="x">go</a>"#,
            state(serde_json::json!({"url": "/a?b=1&c=2", "size": 12, "x": null})),
            MountOptions::default(),
        );
        insta::assert_snapshot!(
            mounted.html(),
            @r#"<a style="color:red;font-size:12px;" href="/a?b=1&amp;c=2">go</a>"#
        );
    }
}

// =============================================================================
// Lists
// =============================================================================

mod lists {
    use super::*;

    const LIST: &str =
        r#"<ul><li v-for="(item, i) in items" :key="item.id">{{ i }}. {{ item.name }}</li></ul>"#;

    #[test]
    fn keyed_items_follow_the_array() {
        let mounted = mount(
            LIST,
            state(serde_json::json!({"items": [{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]})),
            MountOptions::default(),
        );
        let keys = |mounted: &sinopia_canvas::Mounted| {
            mounted
                .vnode()
                .children
                .iter()
                .map(|li| li.key.clone().unwrap_or_default())
                .collect::<Vec<_>>()
        };
        assert_eq!(keys(&mounted), [Value::from(1), Value::from(2)]);
        insta::assert_snapshot!(mounted.html(), @"<ul><li>0. a</li><li>1. b</li></ul>");

        let items = mounted.state().get("items");
        let items = items.as_array().unwrap();
        items.reverse();
        tick();
        assert_eq!(keys(&mounted), [Value::from(2), Value::from(1)]);
        insta::assert_snapshot!(mounted.html(), @"<ul><li>0. b</li><li>1. a</li></ul>");

        items.push(state(serde_json::json!({"id": 3, "name": "c"})));
        tick();
        insta::assert_snapshot!(
            mounted.html(),
            @"<ul><li>0. b</li><li>1. a</li><li>2. c</li></ul>"
        );
    }

    #[test]
    fn nested_property_change_rerenders() {
        let mounted = mount(
            LIST,
            state(serde_json::json!({"items": [{"id": 1, "name": "a"}]})),
            MountOptions::default(),
        );
        let item = mounted.state().get("items").as_array().unwrap().get(0);
        item.as_object().unwrap().assign("name", Value::from("z"));
        tick();
        insta::assert_snapshot!(mounted.html(), @"<ul><li>0. z</li></ul>");
    }

    #[test]
    fn sort_comparator_may_read_the_list() {
        let mounted = mount(
            r#"<p>{{ items.sort((a, b) => items.length - 3).join(",") }}</p>"#,
            state(serde_json::json!({"items": [3, 1, 2]})),
            MountOptions::default(),
        );
        insta::assert_snapshot!(mounted.html(), @"<p>3,1,2</p>");
    }
}

// =============================================================================
// Events and v-model
// =============================================================================

mod events {
    use super::*;

    #[test]
    fn click_handler_updates_state() {
        let mounted = mount(
            r#"<button @click="count += step">{{ count }}</button>"#,
            state(serde_json::json!({"count": 0, "step": 2})),
            MountOptions::default(),
        );
        let button = mounted.vnode();
        button.emit("click", &[event(&[("type", Value::from("click"))])]).unwrap();
        button.emit("click", &[event(&[("type", Value::from("click"))])]).unwrap();
        tick();
        insta::assert_snapshot!(mounted.html(), @"<button>4</button>");
        assert_eq!(mounted.update_count(), 1);
    }

    #[test]
    fn method_handler_receives_event() {
        let mounted = mount(
            r#"<button @click="record">x</button>"#,
            state(serde_json::json!({"seen": ""})),
            MountOptions::default(),
        );
        let target = mounted.state().clone();
        mounted.state().assign(
            "record",
            sinopia_canvas::builtins::native(move |args| {
                let kind = sinopia_canvas::eval::get_member(&args[0], "type")?;
                target.assign("seen", kind);
                Ok(Value::Undefined)
            }),
        );
        mounted.force_update();
        tick();
        mounted
            .vnode()
            .emit("click", &[event(&[("type", Value::from("click"))])])
            .unwrap();
        assert_eq!(mounted.state().get("seen"), Value::from("click"));
    }

    #[test]
    fn text_input_model() {
        let mounted = mount(
            r#"<input v-model="msg">"#,
            state(serde_json::json!({"msg": "hi"})),
            MountOptions::default(),
        );
        insta::assert_snapshot!(mounted.html(), @r#"<input value="hi">"#);

        let target = event(&[("value", Value::from("yo")), ("composing", Value::Bool(false))]);
        mounted
            .vnode()
            .emit("input", &[event(&[("type", Value::from("input")), ("target", target)])])
            .unwrap();
        assert_eq!(mounted.state().get("msg"), Value::from("yo"));
        tick();
        insta::assert_snapshot!(mounted.html(), @r#"<input value="yo">"#);
    }

    #[test]
    fn composing_input_is_ignored() {
        let mounted = mount(
            r#"<input v-model="msg">"#,
            state(serde_json::json!({"msg": "hi"})),
            MountOptions::default(),
        );
        let target = event(&[("value", Value::from("y")), ("composing", Value::Bool(true))]);
        mounted
            .vnode()
            .emit("input", &[event(&[("type", Value::from("input")), ("target", target)])])
            .unwrap();
        assert_eq!(mounted.state().get("msg"), Value::from("hi"));
    }
}
