//! Atelier Core - The core workshop for Sinopia templates.
//!
//! The atelier is where the sketch becomes a painting. This crate takes the
//! element tree from [`sinopia_armature`] through the rest of the pipeline:
//!
//! - [`optimizer`]: marks static subtrees so they can be hoisted and skipped on patch
//! - [`codegen`]: builds the render IR ([`sinopia_relief::Code`])
//! - [`directives`]: compile-time `v-on` / `v-bind` / `v-cloak` and component `v-model`
//! - [`error_detector`]: validates every binding expression
//! - [`compiler`]: option merging, the full pipeline and the compile cache
//!
//! # Example
//!
//! ```
//! use sinopia_atelier_core::{create_compiler, CompileOptions};
//! use sinopia_relief::CompilerOptions;
//!
//! let compiler = create_compiler(CompilerOptions::default());
//! let result = compiler.compile("<div>{{ msg }}</div>", &CompileOptions::default());
//! assert_eq!(result.render, "with(this){return _c('div',[_v(_s(msg))])}");
//! ```

pub mod codegen;
pub mod compiler;
pub mod directives;
pub mod error_detector;
pub mod optimizer;

pub use codegen::{gen_handler, gen_handlers, generate, CodegenResult};
pub use compiler::{create_compiler, CompileOptions, CompiledResult, Compiler, MAX_NESTING_DEPTH};
pub use directives::{base_directive, gen_component_model};
pub use error_detector::detect_errors;
pub use optimizer::optimize;
