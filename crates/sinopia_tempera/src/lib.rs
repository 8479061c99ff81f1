//! Tempera - The reactive pigment binder for Sinopia.
//!
//! Tempera paint binds pigment with egg so it stays where it is laid down.
//! This crate binds state to the effects that read it: every reactive
//! property owns a [`Dep`], every effect is a [`Watcher`], and reading a
//! property while a watcher evaluates subscribes that watcher.
//!
//! # Modules
//!
//! - **dep**: publish points and the evaluating-watcher stack
//! - **watcher**: effects with per-run dependency reconciliation
//! - **value / observer**: the reactive value graph, `set` and `del`
//! - **scheduler / next_tick**: batched, ordered flushing
//! - **error**: routing of errors raised by user code
//! - **reactive**: typed cells, computed values and `watch`
//!
//! # Example
//!
//! ```
//! use sinopia_tempera::{observe, tick, watch, Value, WatchOptions};
//!
//! let state = Value::from_json(&serde_json::json!({ "count": 1 }));
//! observe(&state);
//! let obj = state.as_object().cloned().unwrap_or_default();
//!
//! let reader = obj.clone();
//! let handle = watch(
//!     move || Ok(reader.get("count")),
//!     |new, old| {
//!         println!("{} -> {}", old, new);
//!         Ok(())
//!     },
//!     WatchOptions::default(),
//! );
//!
//! obj.assign("count", 2.into());
//! obj.assign("count", 3.into());
//! tick();
//! assert_eq!(handle.value(), Value::from(3));
//! ```

pub mod config;
pub mod dep;
pub mod error;
pub mod next_tick;
pub mod observer;
pub mod reactive;
pub mod scheduler;
pub mod value;
pub mod watcher;

pub use config::{config, configure, warn, Config, ErrorHandler, WarnHandler};
pub use dep::{current_target, push_target, untracked, Dep, TargetGuard};
pub use error::{
    handle_error, invoke_with_error_handling, take_uncaught_errors, ErrorScope, Propagation,
    ReactiveError, UncaughtError,
};
pub use next_tick::{next_tick, pending_ticks, tick, try_next_tick};
pub use observer::{
    define_reactive, define_reactive_shallow, del, is_observing, observe, observe_root, set,
    toggle_observing,
};
pub use reactive::{computed, watch, Computed, Reactive, WatchHandle, WatchOptions};
pub use scheduler::{
    is_flushing, pending_watchers, queue_activated_component, queue_watcher,
    run_after_current_flush, MAX_UPDATE_COUNT,
};
pub use value::{format_number, Callable, ReactiveArray, ReactiveObject, Value};
pub use watcher::{traverse, Watcher, WatcherOptions};
