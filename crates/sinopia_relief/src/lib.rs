//! Relief - The sculptured AST surface for Sinopia.
//!
//! A relief is the raised surface carved out of a flat panel; this crate is the
//! shape every other compiler stage works against:
//!
//! - [`ast`]: the template tree produced by the parser and annotated by the optimizer
//! - [`code`]: the render IR built by code generation and printed as render source
//! - [`errors`]: collected compile diagnostics
//! - [`options`]: compiler options and the module / directive extension traits

pub mod ast;
pub mod code;
pub mod errors;
pub mod options;

pub use ast::*;
pub use code::*;
pub use errors::*;
pub use options::*;
