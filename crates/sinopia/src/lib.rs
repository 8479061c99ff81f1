//! # Sinopia
//!
//! A reactive template engine written in Rust.
//!
//! ## Name Origin
//!
//! **Sinopia** is the red-earth underdrawing a fresco painter lays on the
//! wall before the plaster: the plan every later layer follows. Templates
//! are the sinopia of a view; this crate is the gateway to the compiler and
//! the reactive runtime that paints over them, and it ships the `sinopia`
//! command-line tool.
//!
//! ## Crates
//!
//! - [`carton`] - Shared utilities, string and hash types
//! - [`relief`] - Template AST, render code IR and diagnostics
//! - [`armature`] - HTML, text, filter and expression parsers
//! - [`atelier_core`] - Optimizer, code generator and compiler facade
//! - [`atelier_dom`] - Web platform modules, directives and the compile cache
//! - [`tempera`] - Dependency tracking, watchers and the update scheduler
//! - [`canvas`] - Render code interpreter and virtual nodes
//!
//! ## Example
//!
//! ```
//! let html = sinopia::render_to_string(
//!     "<p :title=\"t\">{{ n * 2 }}</p>",
//!     &serde_json::json!({ "t": "double", "n": 21 }),
//! );
//! assert_eq!(html, "<p title=\"double\">42</p>");
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod logging;

pub use config::{load_config, SinopiaConfig};
pub use error::{CliError, ConfigError};

/// Shared utilities, string and hash types.
pub use sinopia_carton as carton;

/// Template AST, render code IR and diagnostics.
pub use sinopia_relief as relief;

/// HTML, text, filter and expression parsers.
pub use sinopia_armature as armature;

/// Optimizer, code generator and compiler facade.
pub use sinopia_atelier_core as atelier_core;

/// Web platform modules, directives and the compile cache.
pub use sinopia_atelier_dom as atelier_dom;

/// Dependency tracking, watchers and the update scheduler.
pub use sinopia_tempera as tempera;

/// Render code interpreter and virtual nodes.
pub use sinopia_canvas as canvas;

pub use sinopia_atelier_dom::{compile_template, compile_to_functions, DomCompilerOptions};
pub use sinopia_canvas::{mount, MountOptions, Mounted, VNode};

/// Compile `template`, render it once against `data` and return the HTML.
pub fn render_to_string(template: &str, data: &serde_json::Value) -> String {
    let mounted = mount(
        template,
        sinopia_tempera::Value::from_json(data),
        MountOptions::default(),
    );
    let html = mounted.html();
    mounted.destroy();
    html
}
