//! Armature - The structural parser framework for Sinopia templates.
//!
//! An armature is the wire skeleton a sculptor builds the figure around.
//! This crate turns template source into the [`sinopia_relief`] element tree:
//!
//! - [`html_parser`]: streaming, forgiving HTML scanner
//! - [`parser`]: tree builder applying the template directives
//! - [`text_parser`]: `{{ }}` interpolation splitting
//! - [`filter_parser`]: `exp | filter(args)` rewriting
//! - [`expression`]: binding expressions, parsed by oxc and lowered into
//!   an owned tree
//! - [`helpers`]: attribute, handler and model helpers shared with the
//!   compiler modules
//!
//! # Example
//!
//! ```
//! use sinopia_armature::parse;
//! use sinopia_relief::{CompilerOptions, Diagnostics};
//!
//! let mut diag = Diagnostics::new();
//! let root = parse("<ul><li v-for=\"item in items\">{{ item }}</li></ul>", &CompilerOptions::default(), &mut diag)
//!     .unwrap();
//! assert_eq!(root.tag, "ul");
//! assert!(diag.errors().is_empty());
//! ```

pub mod expression;
pub mod filter_parser;
pub mod helpers;
pub mod html_parser;
pub mod parser;
pub mod text_parser;

pub use filter_parser::parse_filters;
pub use helpers::{
    add_handler, gen_assignment_code, get_binding_attr, parse_model, parse_modifiers, ModelPath,
};
pub use html_parser::{parse_html, HtmlHandler, ScanOptions};
pub use parser::{parse, parse_for};
pub use text_parser::{parse_text, ParsedText};
