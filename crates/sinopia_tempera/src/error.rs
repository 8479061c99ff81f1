//! Evaluation errors and their routing.
//!
//! Errors raised by user code (watcher getters and callbacks, hooks, event
//! handlers) never unwind through the reactive machinery. They are handed to
//! [`handle_error`], which offers them to the enclosing [`ErrorScope`]s,
//! then to the global [`Config::error_handler`](crate::Config), and finally
//! logs them and keeps them for [`take_uncaught_errors`].

use std::cell::RefCell;
use std::rc::Rc;

use sinopia_carton::String;

use crate::config::{self, config};
use crate::dep::push_target;

/// An error raised while running reactive user code.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReactiveError {
    /// Raised by user code.
    #[error("{0}")]
    Thrown(String),
    /// A template expression could not be evaluated.
    #[error("{0}")]
    Evaluation(String),
}

impl ReactiveError {
    pub fn thrown(msg: impl Into<String>) -> Self {
        Self::Thrown(msg.into())
    }
}

/// What an error hook decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// Keep offering the error to outer scopes.
    Continue,
    /// The error is handled.
    Stop,
}

type CaptureHook = Rc<dyn Fn(&ReactiveError, &str) -> Result<Propagation, ReactiveError>>;

/// A boundary that can capture errors raised inside it, nested like the
/// component tree.
pub struct ErrorScope {
    name: String,
    parent: Option<Rc<ErrorScope>>,
    hooks: RefCell<Vec<CaptureHook>>,
}

impl ErrorScope {
    pub fn root(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            parent: None,
            hooks: RefCell::new(Vec::new()),
        })
    }

    pub fn child(parent: &Rc<ErrorScope>, name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            parent: Some(Rc::clone(parent)),
            hooks: RefCell::new(Vec::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Rc<ErrorScope>> {
        self.parent.as_ref()
    }

    /// Register a capture hook. Hooks run innermost scope first, in
    /// registration order; an `Err` from a hook is itself reported globally.
    pub fn on_error(
        &self,
        hook: impl Fn(&ReactiveError, &str) -> Result<Propagation, ReactiveError> + 'static,
    ) {
        self.hooks.borrow_mut().push(Rc::new(hook));
    }
}

impl std::fmt::Debug for ErrorScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorScope")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name.as_str()))
            .field("hooks", &self.hooks.borrow().len())
            .finish()
    }
}

/// An error nothing handled.
#[derive(Debug, Clone, PartialEq)]
pub struct UncaughtError {
    pub error: ReactiveError,
    /// Where the error was raised, e.g. `getter for watcher "a.b"`.
    pub info: String,
}

thread_local! {
    static UNCAUGHT: RefCell<Vec<UncaughtError>> = const { RefCell::new(Vec::new()) };
}

/// Drain the errors that reached the end of the handler chain.
pub fn take_uncaught_errors() -> Vec<UncaughtError> {
    UNCAUGHT.with(|uncaught| std::mem::take(&mut *uncaught.borrow_mut()))
}

/// Route an error raised inside `scope`.
pub fn handle_error(error: ReactiveError, scope: Option<&ErrorScope>, info: &str) {
    // hooks must not subscribe whatever is evaluating
    let _guard = push_target(None);
    let mut current = scope;
    while let Some(cur) = current {
        // a hook may register more hooks on this scope
        let hooks = cur.hooks.borrow().clone();
        for hook in &hooks {
            match hook(&error, info) {
                Ok(Propagation::Stop) => return,
                Ok(Propagation::Continue) => {}
                Err(hook_error) => global_handle_error(hook_error, "errorCaptured hook"),
            }
        }
        current = cur.parent.as_deref();
    }
    global_handle_error(error, info);
}

/// Run `f`, routing its error (if any) through [`handle_error`].
pub fn invoke_with_error_handling<T>(
    f: impl FnOnce() -> Result<T, ReactiveError>,
    scope: Option<&ErrorScope>,
    info: &str,
) -> Option<T> {
    match f() {
        Ok(value) => Some(value),
        Err(error) => {
            handle_error(error, scope, info);
            None
        }
    }
}

fn global_handle_error(error: ReactiveError, info: &str) {
    if let Some(handler) = config().error_handler {
        match handler(&error, info) {
            Ok(()) => return,
            Err(handler_error) if handler_error != error => {
                log_error(handler_error, "config.errorHandler")
            }
            Err(_) => {}
        }
    }
    log_error(error, info);
}

fn log_error(error: ReactiveError, info: &str) {
    config::warn(&format!("Error in {}: \"{}\"", info, error));
    tracing::error!(info, "{}", error);
    UNCAUGHT.with(|uncaught| {
        uncaught.borrow_mut().push(UncaughtError {
            error,
            info: info.into(),
        })
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::configure;
    use std::cell::Cell;

    fn silence() {
        configure(|config| config.silent = true);
    }

    #[test]
    fn test_uncaught_errors_are_kept() {
        silence();
        handle_error(ReactiveError::thrown("boom"), None, "render");
        let uncaught = take_uncaught_errors();
        assert_eq!(uncaught.len(), 1);
        assert_eq!(uncaught[0].error.to_string(), "boom");
        assert_eq!(uncaught[0].info, "render");
        assert!(take_uncaught_errors().is_empty());
    }

    #[test]
    fn test_hook_may_register_hooks() {
        silence();
        let scope = ErrorScope::root("app");
        let registered = Rc::new(Cell::new(0));
        let weak = Rc::downgrade(&scope);
        let count = Rc::clone(&registered);
        scope.on_error(move |_, _| {
            if let Some(scope) = weak.upgrade() {
                count.set(count.get() + 1);
                scope.on_error(|_, _| Ok(Propagation::Stop));
            }
            Ok(Propagation::Continue)
        });

        handle_error(ReactiveError::thrown("first"), Some(&scope), "render");
        assert_eq!(registered.get(), 1);
        assert_eq!(take_uncaught_errors().len(), 1);

        handle_error(ReactiveError::thrown("second"), Some(&scope), "render");
        assert_eq!(registered.get(), 2);
        assert!(take_uncaught_errors().is_empty());
    }

    #[test]
    fn test_scope_chain_stops_bubbling() {
        silence();
        let outer_calls = Rc::new(Cell::new(0));
        let root = ErrorScope::root("app");
        let calls = Rc::clone(&outer_calls);
        root.on_error(move |_, _| {
            calls.set(calls.get() + 1);
            Ok(Propagation::Continue)
        });
        let child = ErrorScope::child(&root, "child");
        child.on_error(|error, _| {
            Ok(if error.to_string() == "handled" {
                Propagation::Stop
            } else {
                Propagation::Continue
            })
        });

        handle_error(ReactiveError::thrown("handled"), Some(&child), "hook");
        assert_eq!(outer_calls.get(), 0);
        assert!(take_uncaught_errors().is_empty());

        handle_error(ReactiveError::thrown("other"), Some(&child), "hook");
        assert_eq!(outer_calls.get(), 1);
        assert_eq!(take_uncaught_errors().len(), 1);
    }

    #[test]
    fn test_global_handler() {
        silence();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        configure(|config| {
            config.error_handler = Some(Rc::new(move |error: &ReactiveError, info: &str| {
                sink.borrow_mut().push(format!("{} @ {}", error, info));
                Ok(())
            }));
        });
        handle_error(ReactiveError::thrown("x"), None, "nextTick");
        assert_eq!(*seen.borrow(), ["x @ nextTick"]);
        assert!(take_uncaught_errors().is_empty());

        configure(|config| {
            config.error_handler = Some(Rc::new(|_: &ReactiveError, _: &str| {
                Err(ReactiveError::thrown("handler broke"))
            }));
        });
        handle_error(ReactiveError::thrown("y"), None, "render");
        let infos: Vec<std::string::String> = take_uncaught_errors()
            .into_iter()
            .map(|e| format!("{}: {}", e.info, e.error))
            .collect();
        assert_eq!(infos, ["config.errorHandler: handler broke", "render: y"]);
        configure(|config| config.error_handler = None);
    }

    #[test]
    fn test_failing_hook_reported() {
        silence();
        let scope = ErrorScope::root("app");
        scope.on_error(|_, _| Err(ReactiveError::thrown("hook failed")));
        handle_error(ReactiveError::thrown("original"), Some(&scope), "watcher");
        let infos: Vec<std::string::String> =
            take_uncaught_errors().into_iter().map(|e| e.info.to_string()).collect();
        assert_eq!(infos, ["errorCaptured hook", "watcher"]);
    }
}
