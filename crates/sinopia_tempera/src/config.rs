//! Runtime configuration.
//!
//! Configuration is per thread, like the rest of the reactive state.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::ReactiveError;

/// Global error hook: receives errors no [`ErrorScope`](crate::ErrorScope)
/// handled, with a description of where they were raised.
pub type ErrorHandler = Rc<dyn Fn(&ReactiveError, &str) -> Result<(), ReactiveError>>;

/// Receives runtime warnings instead of the log.
pub type WarnHandler = Rc<dyn Fn(&str)>;

#[derive(Clone)]
pub struct Config {
    /// Flush watchers on [`tick`](crate::tick). When `false` every queued
    /// watcher flushes immediately and subscribers are notified in id order.
    pub async_flush: bool,
    /// Suppress logged warnings (a `warn_handler` still receives them).
    pub silent: bool,
    pub error_handler: Option<ErrorHandler>,
    pub warn_handler: Option<WarnHandler>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            async_flush: true,
            silent: false,
            error_handler: None,
            warn_handler: None,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("async_flush", &self.async_flush)
            .field("silent", &self.silent)
            .field("error_handler", &self.error_handler.is_some())
            .field("warn_handler", &self.warn_handler.is_some())
            .finish()
    }
}

thread_local! {
    static CONFIG: RefCell<Config> = RefCell::new(Config::default());
}

/// Update this thread's configuration.
pub fn configure(f: impl FnOnce(&mut Config)) {
    CONFIG.with(|config| f(&mut config.borrow_mut()));
}

/// A copy of this thread's configuration.
pub fn config() -> Config {
    CONFIG.with(|config| config.borrow().clone())
}

pub(crate) fn async_flush() -> bool {
    CONFIG.with(|config| config.borrow().async_flush)
}

/// Report a runtime warning.
pub fn warn(msg: &str) {
    let (handler, silent) = CONFIG.with(|config| {
        let config = config.borrow();
        (config.warn_handler.clone(), config.silent)
    });
    match handler {
        Some(handler) => handler(msg),
        None if !silent => tracing::warn!("{}", msg),
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warn_handler_receives_messages() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        configure(|config| {
            config.warn_handler = Some(Rc::new(move |msg: &str| sink.borrow_mut().push(msg.to_string())));
        });
        warn("careful");
        assert_eq!(*seen.borrow(), ["careful"]);
        configure(|config| config.warn_handler = None);
    }

    #[test]
    fn test_defaults() {
        let config = config();
        assert!(config.async_flush);
        assert!(!config.silent);
    }
}
