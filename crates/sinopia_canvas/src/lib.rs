//! Canvas - The render runtime for Sinopia.
//!
//! The atelier prepares the drawing; the canvas is where it is painted.
//! This crate takes the render code the compiler produced and paints it
//! against reactive state: expressions are evaluated by a small
//! interpreter, render helpers build [`VNode`] trees, and [`mount`] keeps a
//! render watcher repainting the tree when the state it read changes.
//!
//! # Modules
//!
//! - **eval / ops / builtins**: the template expression interpreter
//! - **env**: scope chain with the render state as `this`
//! - **helpers**: the `_s`, `_n`, `_q`, `_k`, `_b`, `_g` family
//! - **render**: interpreting render code into virtual nodes
//! - **vnode**: the virtual node tree and its HTML serialization
//! - **mount**: compile, observe and re-render
//!
//! # Example
//!
//! ```
//! use sinopia_canvas::{mount, MountOptions, Value};
//!
//! let state = Value::from_json(&serde_json::json!({ "name": "world" }));
//! let mounted = mount("<p>hello {{ name }}</p>", state, MountOptions::default());
//! assert_eq!(mounted.html(), "<p>hello world</p>");
//!
//! mounted.state().assign("name", Value::from("canvas"));
//! sinopia_canvas::tick();
//! assert_eq!(mounted.html(), "<p>hello canvas</p>");
//! ```

pub mod builtins;
pub mod env;
pub mod error;
pub mod eval;
pub mod helpers;
pub mod mount;
pub mod ops;
pub mod render;
pub mod vnode;

pub use env::Env;
pub use error::{EvalError, EvalResult};
pub use eval::{eval_source, exec_source};
pub use mount::{mount, MountOptions, Mounted};
pub use render::{RenderContext, SlotContent};
pub use vnode::{stringify_class, CompiledSlot, VNode, VNodeData};

pub use sinopia_atelier_dom::{compile_to_functions, DomCompilerOptions};
pub use sinopia_tempera::{tick, Callable, ReactiveArray, ReactiveObject, Value};
