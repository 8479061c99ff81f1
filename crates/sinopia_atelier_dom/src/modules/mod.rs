//! Web platform compiler modules.

mod class;
mod style;

pub use class::ClassModule;
pub use style::{parse_style_text, StyleModule};

use std::sync::Arc;

use sinopia_relief::CompilerModule;

/// Modules in data-object order: class entries come before style entries.
pub fn dom_modules() -> Vec<Arc<dyn CompilerModule>> {
    vec![Arc::new(ClassModule), Arc::new(StyleModule)]
}
