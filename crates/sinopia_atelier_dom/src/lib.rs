//! Sinopia compiler for the web platform.
//!
//! This crate provides DOM-specific compilation including:
//! - HTML parsing rules (unary tags, auto-closed tags, `<pre>`)
//! - `class` / `style` static extraction and bindings
//! - `v-text` / `v-html` as DOM properties
//! - `v-model` for text inputs, textareas and components
//! - a process-wide compiler with a compile cache

pub mod directives;
pub mod modules;
pub mod options;

pub use directives::*;
pub use modules::*;
pub use options::*;

// Re-export core types
pub use sinopia_atelier_core::{CompileOptions, CompiledResult, Compiler};
pub use sinopia_relief::{CompilerError, ElementNode};

use std::sync::Arc;

use once_cell::sync::Lazy;
use sinopia_atelier_core::create_compiler;

static DOM_COMPILER: Lazy<Compiler> = Lazy::new(|| create_compiler(base_options()));

/// The shared DOM compiler.
pub fn dom_compiler() -> &'static Compiler {
    &DOM_COMPILER
}

/// Compile a template for DOM with default options
pub fn compile_template(source: &str) -> CompiledResult {
    compile_template_with_options(source, DomCompilerOptions::default())
}

/// Compile a template for DOM with custom options
pub fn compile_template_with_options(source: &str, options: DomCompilerOptions) -> CompiledResult {
    DOM_COMPILER.compile(source, &options.to_compile_options())
}

/// Compile through the shared cache; the same template (and delimiters)
/// returns the same result.
pub fn compile_to_functions(source: &str, options: &DomCompilerOptions) -> Arc<CompiledResult> {
    DOM_COMPILER.compile_to_functions(source, &options.to_compile_options())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_simple_element() {
        let result = compile_template("<div>hello</div>");
        assert!(result.errors.is_empty());
        assert_eq!(result.render, "with(this){return _c('div',[_v(\"hello\")])}");
    }

    #[test]
    fn test_compile_svg() {
        let result = compile_template("<svg><circle /></svg>");
        assert!(result.errors.is_empty());
        let root = result.ast.as_ref().unwrap();
        assert_eq!(root.ns, Some("svg"));
    }

    #[test]
    fn test_cached_compile() {
        let options = DomCompilerOptions::default();
        let a = compile_to_functions("<p>{{ cached }}</p>", &options);
        let b = compile_to_functions("<p>{{ cached }}</p>", &options);
        assert!(Arc::ptr_eq(&a, &b));
    }
}
