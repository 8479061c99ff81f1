//! Mounting a template: compile it, observe its state and keep a render
//! watcher re-rendering the tree whenever something it read changes.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use sinopia_atelier_dom::{compile_to_functions, DomCompilerOptions};
use sinopia_carton::{FxHashMap, String};
use sinopia_tempera::{
    handle_error, observe_root, warn, Callable, ErrorScope, ReactiveError, ReactiveObject, Value,
    Watcher, WatcherOptions,
};

use crate::render::{RenderContext, SlotContent};
use crate::vnode::VNode;

/// How to mount a template.
#[derive(Default)]
pub struct MountOptions {
    pub compiler: DomCompilerOptions,
    pub slots: FxHashMap<String, SlotContent>,
    pub filters: FxHashMap<String, Callable>,
    /// Where render errors are reported.
    pub scope: Option<Rc<ErrorScope>>,
    /// Runs in the flush right before each re-render.
    pub before_update: Option<Rc<dyn Fn()>>,
}

/// A mounted template.
pub struct Mounted {
    context: Rc<RenderContext>,
    vnode: Rc<RefCell<VNode>>,
    updates: Rc<Cell<usize>>,
    watcher: Rc<Watcher>,
}

impl Mounted {
    /// The latest rendered tree.
    pub fn vnode(&self) -> VNode {
        self.vnode.borrow().clone()
    }

    pub fn html(&self) -> std::string::String {
        self.vnode.borrow().to_html()
    }

    pub fn state(&self) -> &ReactiveObject {
        self.context.state()
    }

    /// How many times the tree was re-rendered after mounting.
    pub fn update_count(&self) -> usize {
        self.updates.get()
    }

    /// Queue a re-render even when nothing changed.
    pub fn force_update(&self) {
        self.watcher.update();
    }

    /// Stop re-rendering. The last tree stays readable.
    pub fn destroy(&self) {
        self.watcher.teardown();
    }

    pub fn watcher(&self) -> &Rc<Watcher> {
        &self.watcher
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }
}

impl fmt::Debug for Mounted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mounted")
            .field("vnode", &self.vnode.borrow())
            .field("updates", &self.updates.get())
            .finish()
    }
}

/// Compile `template` (through the shared cache), make `state` reactive and
/// render it. The returned handle re-renders after every flush that touched
/// something the render read.
pub fn mount(template: &str, state: Value, options: MountOptions) -> Mounted {
    let MountOptions {
        compiler,
        slots,
        filters,
        scope,
        before_update,
    } = options;

    let compiled = compile_to_functions(template, &compiler);
    if !compiled.errors.is_empty() {
        let mut msg = format!("Error compiling template:\n\n{}\n\n", template);
        for error in &compiled.errors {
            msg.push_str("- ");
            msg.push_str(&error.msg);
            msg.push('\n');
        }
        warn(&msg);
    }
    for tip in &compiled.tips {
        tracing::info!("{}", tip.msg);
    }

    let state = match state {
        Value::Object(obj) => obj,
        _ => {
            warn("data functions should return an object");
            ReactiveObject::new()
        }
    };
    observe_root(&Value::Object(state.clone()));

    let context = Rc::new(RenderContext::new(
        compiled.render_code.clone(),
        compiled.static_render_code.clone(),
        state,
        slots,
        filters,
    ));
    let vnode = Rc::new(RefCell::new(VNode::empty("")));
    let updates = Rc::new(Cell::new(0));

    let getter = {
        let context = Rc::clone(&context);
        let vnode = Rc::clone(&vnode);
        let scope = scope.clone();
        move || {
            match context.render() {
                Ok(tree) => *vnode.borrow_mut() = tree,
                Err(err) => handle_error(ReactiveError::from(err), scope.as_deref(), "render"),
            }
            Ok(Value::Undefined)
        }
    };
    let after = {
        let updates = Rc::clone(&updates);
        Box::new(move || updates.set(updates.get() + 1)) as Box<dyn Fn()>
    };
    let before = before_update.map(|hook| Box::new(move || hook()) as Box<dyn Fn()>);

    let watcher = Watcher::new(
        "render",
        getter,
        None,
        WatcherOptions {
            before,
            after: Some(after),
            scope,
            ..WatcherOptions::default()
        },
    );
    context.bind_watcher(Rc::downgrade(&watcher));
    tracing::debug!(watcher = watcher.id(), "mounted template");

    Mounted {
        context,
        vnode,
        updates,
        watcher,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sinopia_tempera::{tick, Propagation};

    #[test]
    fn test_rerender_after_flush() {
        let state = Value::from_json(&serde_json::json!({"msg": "a"}));
        let mounted = mount("<p>{{ msg }}</p>", state, MountOptions::default());
        assert_eq!(mounted.html(), "<p>a</p>");
        assert_eq!(mounted.update_count(), 0);

        mounted.state().assign("msg", Value::from("b"));
        mounted.state().assign("msg", Value::from("c"));
        assert_eq!(mounted.html(), "<p>a</p>");
        tick();
        assert_eq!(mounted.html(), "<p>c</p>");
        assert_eq!(mounted.update_count(), 1);
    }

    #[test]
    fn test_destroy_stops_updates() {
        let state = Value::from_json(&serde_json::json!({"msg": "a"}));
        let mounted = mount("<p>{{ msg }}</p>", state, MountOptions::default());
        mounted.destroy();
        mounted.state().assign("msg", Value::from("b"));
        tick();
        assert_eq!(mounted.html(), "<p>a</p>");
    }

    #[test]
    fn test_render_error_keeps_previous_tree() {
        let scope = ErrorScope::root("app");
        let caught = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&caught);
        scope.on_error(move |err, info| {
            sink.borrow_mut().push(format!("{}: {}", info, err));
            Ok(Propagation::Stop)
        });
        let state = Value::from_json(&serde_json::json!({"a": {"b": 1}}));
        let mounted = mount(
            "<p>{{ a.b }}</p>",
            state,
            MountOptions {
                scope: Some(scope),
                ..MountOptions::default()
            },
        );
        assert_eq!(mounted.html(), "<p>1</p>");
        mounted.state().assign("a", Value::Null);
        tick();
        assert_eq!(mounted.html(), "<p>1</p>");
        assert_eq!(
            caught.borrow().as_slice(),
            ["render: Cannot read properties of null (reading 'b')"]
        );
    }
}
