//! Web platform directive generators: `v-text`, `v-html` and `v-model`.

mod model;

pub use model::{ModelDirective, RANGE_TOKEN};

use std::sync::Arc;

use sinopia_carton::{format_compact, FxHashMap, String};
use sinopia_relief::{
    Attr, Diagnostics, DirectiveGenerator, DirectiveNode, DirectiveOutput, ElementNode,
};

fn dom_prop(name: &str, dir: &DirectiveNode) -> DirectiveOutput {
    DirectiveOutput {
        props: vec![Attr {
            range: dir.range,
            ..Attr::new(name, format_compact!("_s({})", dir.value))
        }],
        ..DirectiveOutput::default()
    }
}

/// `v-text`: sets `textContent`.
pub struct TextDirective;

impl DirectiveGenerator for TextDirective {
    fn generate(
        &self,
        _el: &ElementNode,
        dir: &DirectiveNode,
        _diag: &mut Diagnostics,
    ) -> DirectiveOutput {
        dom_prop("textContent", dir)
    }
}

/// `v-html`: sets `innerHTML`.
pub struct HtmlDirective;

impl DirectiveGenerator for HtmlDirective {
    fn generate(
        &self,
        _el: &ElementNode,
        dir: &DirectiveNode,
        _diag: &mut Diagnostics,
    ) -> DirectiveOutput {
        dom_prop("innerHTML", dir)
    }
}

pub fn dom_directives() -> FxHashMap<String, Arc<dyn DirectiveGenerator>> {
    let mut directives: FxHashMap<String, Arc<dyn DirectiveGenerator>> = FxHashMap::default();
    directives.insert("text".into(), Arc::new(TextDirective));
    directives.insert("html".into(), Arc::new(HtmlDirective));
    directives.insert("model".into(), Arc::new(ModelDirective));
    directives
}
