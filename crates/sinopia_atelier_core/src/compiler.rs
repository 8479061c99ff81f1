//! Compiler creation: option merging, the parse → optimize → generate
//! pipeline, error detection and the compile cache.

use std::sync::Arc;

use dashmap::DashMap;
use sinopia_carton::{FxHashMap, String};
use sinopia_relief::{
    Code, CompilerError, CompilerModule, CompilerOptions, Diagnostics, DirectiveGenerator,
    ElementNode, SourceRange, WhitespaceStrategy,
};

use crate::codegen::generate;
use crate::error_detector::detect_errors;
use crate::optimizer::optimize;

/// Per-call overrides of a compiler's base options.
#[derive(Clone, Default)]
pub struct CompileOptions {
    pub delimiters: Option<(String, String)>,
    pub whitespace: Option<WhitespaceStrategy>,
    pub preserve_whitespace: Option<bool>,
    /// Report diagnostics with byte ranges into the original template.
    pub output_source_range: bool,
    pub comments: Option<bool>,
    pub optimize: Option<bool>,
    /// Appended after the base modules.
    pub modules: Vec<Arc<dyn CompilerModule>>,
    /// Overlaid on the base directives.
    pub directives: FxHashMap<String, Arc<dyn DirectiveGenerator>>,
    /// Appended to the base static keys.
    pub static_keys: Vec<String>,
}

impl CompileOptions {
    fn merge_into(&self, base: &CompilerOptions) -> CompilerOptions {
        let mut options = base.clone();
        if self.delimiters.is_some() {
            options.delimiters = self.delimiters.clone();
        }
        if self.whitespace.is_some() {
            options.whitespace = self.whitespace;
        }
        if let Some(preserve) = self.preserve_whitespace {
            options.preserve_whitespace = preserve;
        }
        options.output_source_range = self.output_source_range;
        if let Some(comments) = self.comments {
            options.comments = comments;
        }
        if let Some(optimize) = self.optimize {
            options.optimize = optimize;
        }
        options.modules.extend(self.modules.iter().cloned());
        for (name, directive) in &self.directives {
            options.directives.insert(name.clone(), Arc::clone(directive));
        }
        options.static_keys.extend(self.static_keys.iter().cloned());
        options
    }
}

/// Result of compiling one template.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledResult {
    pub ast: Option<ElementNode>,
    /// Render function body: `with(this){return ...}`.
    pub render: String,
    pub static_render_fns: Vec<String>,
    /// The IR `render` was printed from.
    pub render_code: Code,
    pub static_render_code: Vec<Code>,
    pub errors: Vec<CompilerError>,
    pub tips: Vec<CompilerError>,
}

fn render_source(code: &Code) -> String {
    sinopia_carton::format_compact!("with(this){{return {}}}", code)
}

/// Deepest element nesting the optimizer and code generator accept.
/// Deeper templates compile to an empty root with an error.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Range of the first element nested deeper than [`MAX_NESTING_DEPTH`].
/// Walks with an explicit stack so the check itself cannot overflow.
fn first_too_deep(root: &ElementNode) -> Option<SourceRange> {
    let mut stack = vec![(root, 1usize)];
    while let Some((el, depth)) = stack.pop() {
        if depth > MAX_NESTING_DEPTH {
            return Some(el.range);
        }
        let children = el.children.iter().filter_map(|child| child.as_element());
        let branches = el.if_conditions.iter().map(|branch| &branch.block);
        let slots = el.scoped_slots.iter().map(|(_, slot)| slot);
        stack.extend(children.chain(branches).chain(slots).map(|child| (child, depth + 1)));
    }
    None
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    delimiters: Option<(String, String)>,
    template: String,
}

/// A compiler bound to a platform's base options.
pub struct Compiler {
    base_options: CompilerOptions,
    cache: DashMap<CacheKey, Arc<CompiledResult>>,
}

/// Create a compiler for a platform.
pub fn create_compiler(base_options: CompilerOptions) -> Compiler {
    Compiler {
        base_options,
        cache: DashMap::new(),
    }
}

impl Compiler {
    pub fn base_options(&self) -> &CompilerOptions {
        &self.base_options
    }

    /// Compile a template. Never fails: problems are reported in
    /// [`CompiledResult::errors`] and [`CompiledResult::tips`].
    pub fn compile(&self, template: &str, options: &CompileOptions) -> CompiledResult {
        let options = options.merge_into(&self.base_options);
        let trimmed = template.trim();
        let mut diag = if options.output_source_range {
            let leading = template.len() - template.trim_start().len();
            Diagnostics::with_source_range(leading as u32)
        } else {
            Diagnostics::new()
        };

        let mut ast = sinopia_armature::parse(trimmed, &options, &mut diag);
        if let Some(too_deep) = ast.as_ref().and_then(first_too_deep) {
            diag.warn(
                sinopia_carton::format_compact!(
                    "Template is nested more than {} elements deep.",
                    MAX_NESTING_DEPTH
                ),
                Some(too_deep),
            );
            ast = None;
        }
        if options.optimize {
            optimize(ast.as_mut(), &options);
        }
        let generated = generate(ast.as_ref(), &options, &mut diag);
        detect_errors(ast.as_ref(), &mut diag);

        let (errors, tips) = diag.into_parts();
        tracing::debug!(
            errors = errors.len(),
            tips = tips.len(),
            "template compiled"
        );
        CompiledResult {
            ast,
            render: render_source(&generated.render),
            static_render_fns: generated.static_render_fns.iter().map(render_source).collect(),
            render_code: generated.render,
            static_render_code: generated.static_render_fns,
            errors,
            tips,
        }
    }

    /// Compile through the cache. Results are keyed by the template and
    /// custom delimiters only; other per-call options do not split the cache.
    pub fn compile_to_functions(
        &self,
        template: &str,
        options: &CompileOptions,
    ) -> Arc<CompiledResult> {
        let key = CacheKey {
            delimiters: options.delimiters.clone(),
            template: template.into(),
        };
        if let Some(cached) = self.cache.get(&key) {
            return Arc::clone(cached.value());
        }

        let compiled = Arc::new(self.compile(template, options));
        for error in &compiled.errors {
            tracing::warn!(template, "error compiling template: {}", error.msg);
        }
        for tip in &compiled.tips {
            tracing::debug!(template, "template tip: {}", tip.msg);
        }
        Arc::clone(self.cache.entry(key).or_insert(compiled).value())
    }

    /// Drop every cached result.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiler() -> Compiler {
        create_compiler(CompilerOptions {
            is_reserved_tag: sinopia_carton::is_reserved_tag,
            ..Default::default()
        })
    }

    #[test]
    fn test_compile_pipeline() {
        let result = compiler().compile("  <div><p><b>x</b></p>{{ a }}</div>\n", &CompileOptions::default());
        assert_eq!(result.render, "with(this){return _c('div',[_m(0),_v(_s(a))])}");
        assert_eq!(result.static_render_fns, ["with(this){return _c('p',[_c('b',[_v(\"x\")])])}"]);
        assert!(result.errors.is_empty());
        assert_eq!(result.ast.as_ref().map(|el| el.tag.as_str()), Some("div"));
    }

    #[test]
    fn test_deep_nesting_is_an_error() {
        let nested = |depth: usize| format!("{}x{}", "<div>".repeat(depth), "</div>".repeat(depth));
        let options = CompileOptions {
            optimize: Some(false),
            output_source_range: true,
            ..Default::default()
        };

        let result = compiler().compile(&nested(1000), &options);
        assert!(result.ast.is_none());
        assert_eq!(result.render, "with(this){return _c(\"div\")}");
        assert_eq!(result.errors.len(), 1);
        let error = &result.errors[0];
        assert_eq!(error.msg, "Template is nested more than 128 elements deep.");
        assert_eq!(error.start, Some(5 * MAX_NESTING_DEPTH as u32));

        let result = compiler().compile(&nested(MAX_NESTING_DEPTH), &options);
        assert!(result.errors.is_empty());
        assert!(result.ast.is_some());
    }

    #[test]
    fn test_optimize_can_be_disabled() {
        let options = CompileOptions {
            optimize: Some(false),
            ..Default::default()
        };
        let result = compiler().compile("<div><p><b>x</b></p></div>", &options);
        assert!(result.static_render_fns.is_empty());
        assert_eq!(result.render, "with(this){return _c('div',[_c('p',[_c('b',[_v(\"x\")])])])}");
    }

    #[test]
    fn test_source_ranges_shifted_by_leading_whitespace() {
        let options = CompileOptions {
            output_source_range: true,
            ..Default::default()
        };
        let result = compiler().compile("   <div :a=\"b +\"></div>", &options);
        let error = &result.errors[0];
        assert_eq!(error.start, Some(8));
        let without = compiler().compile("   <div :a=\"b +\"></div>", &CompileOptions::default());
        assert_eq!(without.errors[0].start, None);
    }

    #[test]
    fn test_custom_delimiters() {
        let options = CompileOptions {
            delimiters: Some(("[[".into(), "]]".into())),
            ..Default::default()
        };
        let result = compiler().compile("<p>[[ a ]] {{ b }}</p>", &options);
        assert_eq!(result.render, "with(this){return _c('p',[_v(_s(a)+\" {{ b }}\")])}");
    }

    #[test]
    fn test_cache_identity() {
        let compiler = compiler();
        let first = compiler.compile_to_functions("<div>{{ a }}</div>", &CompileOptions::default());
        let second = compiler.compile_to_functions("<div>{{ a }}</div>", &CompileOptions::default());
        assert!(Arc::ptr_eq(&first, &second));

        let delimited = CompileOptions {
            delimiters: Some(("[[".into(), "]]".into())),
            ..Default::default()
        };
        let third = compiler.compile_to_functions("<div>{{ a }}</div>", &delimited);
        assert!(!Arc::ptr_eq(&first, &third));

        compiler.clear_cache();
        let fourth = compiler.compile_to_functions("<div>{{ a }}</div>", &CompileOptions::default());
        assert!(!Arc::ptr_eq(&first, &fourth));
        assert_eq!(first, fourth);
    }

    #[test]
    fn test_static_keys_extend_allow_list() {
        let options = CompileOptions {
            static_keys: vec!["key".into()],
            ..Default::default()
        };
        let result = compiler().compile(r#"<div><p key="a"><b>x</b></p>{{ c }}</div>"#, &options);
        assert_eq!(result.static_render_fns.len(), 1);
    }
}
