//! Built-in directive generators.
//!
//! `v-on` and `v-bind` without an argument wrap the whole data object;
//! `v-cloak` is dropped at compile time. Platforms add their own generators
//! through [`CompilerOptions::directives`](sinopia_relief::CompilerOptions).

mod model;

pub use model::gen_component_model;

use sinopia_relief::{
    DataWrap, Diagnostics, DirectiveGenerator, DirectiveNode, DirectiveOutput, ElementNode,
};

/// `v-on="listeners"`
pub struct OnDirective;

impl DirectiveGenerator for OnDirective {
    fn generate(
        &self,
        _el: &ElementNode,
        dir: &DirectiveNode,
        diag: &mut Diagnostics,
    ) -> DirectiveOutput {
        if dir.modifiers.is_some() {
            diag.warn("v-on without argument does not support modifiers.", dir.range);
        }
        DirectiveOutput {
            wrap_listeners: Some(dir.value.clone()),
            ..DirectiveOutput::default()
        }
    }
}

/// `v-bind="attrs"`, with `.prop` and `.sync`
pub struct BindDirective;

impl DirectiveGenerator for BindDirective {
    fn generate(
        &self,
        _el: &ElementNode,
        dir: &DirectiveNode,
        _diag: &mut Diagnostics,
    ) -> DirectiveOutput {
        let has = |m: &str| dir.modifiers.as_ref().is_some_and(|mods| mods.contains(m));
        DirectiveOutput {
            wrap_data: Some(DataWrap {
                value: dir.value.clone(),
                as_prop: has("prop"),
                sync: has("sync"),
            }),
            ..DirectiveOutput::default()
        }
    }
}

pub struct CloakDirective;

impl DirectiveGenerator for CloakDirective {
    fn generate(
        &self,
        _el: &ElementNode,
        _dir: &DirectiveNode,
        _diag: &mut Diagnostics,
    ) -> DirectiveOutput {
        DirectiveOutput::default()
    }
}

/// Generator for a built-in directive name.
pub fn base_directive(name: &str) -> Option<&'static dyn DirectiveGenerator> {
    match name {
        "on" => Some(&OnDirective),
        "bind" => Some(&BindDirective),
        "cloak" => Some(&CloakDirective),
        _ => None,
    }
}
