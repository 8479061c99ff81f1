//! Static tree marking.
//!
//! Two walks over the parsed tree. The first marks every node whose output
//! can never change between renders; the second picks, among those, the
//! subtrees worth hoisting into their own static render functions.

use sinopia_carton::{is_built_in_tag, FxHashSet};
use sinopia_relief::{CompilerOptions, ElementNode, TemplateNode};

/// Element fields that never make an element dynamic.
const BASE_STATIC_KEYS: &[&str] = &["plain", "attrs"];

struct Optimizer<'a> {
    static_keys: FxHashSet<&'a str>,
    is_reserved_tag: fn(&str) -> bool,
}

/// Mark `is_static`, `static_root` and `static_in_for` across the tree.
pub fn optimize(root: Option<&mut ElementNode>, options: &CompilerOptions) {
    let Some(root) = root else {
        return;
    };
    let module_keys = options.module_static_keys();
    let mut static_keys: FxHashSet<&str> = BASE_STATIC_KEYS.iter().copied().collect();
    static_keys.extend(module_keys.iter().map(|k| k.as_str()));
    let optimizer = Optimizer {
        static_keys,
        is_reserved_tag: options.is_reserved_tag,
    };
    optimizer.mark_static(root, false);
    optimizer.mark_static_roots(root, false);
}

impl Optimizer<'_> {
    fn is_static(&self, el: &ElementNode, in_template_for: bool) -> bool {
        el.pre
            || (!el.has_bindings
                && el.if_exp.is_none()
                && el.for_clause.is_none()
                && !is_built_in_tag(&el.tag)
                && (self.is_reserved_tag)(&el.tag)
                && !in_template_for
                && el
                    .defined_keys()
                    .iter()
                    .all(|key| self.static_keys.contains(key)))
    }

    /// `in_template_for`: the element sits directly under a chain of
    /// `<template>`s, one of which carries `v-for`.
    fn mark_static(&self, el: &mut ElementNode, in_template_for: bool) {
        el.is_static = self.is_static(el, in_template_for);

        // components and slots are left alone so their content stays reactive
        if !(self.is_reserved_tag)(&el.tag)
            && el.tag.as_str() != "slot"
            && !el.has_attr("inline-template")
        {
            return;
        }

        let child_in_template_for = el.tag.as_str() == "template"
            && (el.for_clause.is_some() || in_template_for);
        let mut all_static = true;
        for child in &mut el.children {
            if let TemplateNode::Element(child) = child {
                self.mark_static(child, child_in_template_for);
            }
            all_static &= child.is_static();
        }
        for condition in &mut el.if_conditions {
            self.mark_static(&mut condition.block, in_template_for);
            all_static &= condition.block.is_static;
        }
        if !all_static {
            el.is_static = false;
        }
    }

    fn mark_static_roots(&self, el: &mut ElementNode, in_for: bool) {
        if el.is_static || el.once {
            el.static_in_for = in_for;
        }
        // a lone text child costs more to hoist than to re-render
        let only_text = matches!(
            el.children.as_slice(),
            [TemplateNode::Text(_) | TemplateNode::Comment(_)]
        );
        if el.is_static && !el.children.is_empty() && !only_text {
            el.static_root = true;
            return;
        }
        el.static_root = false;

        let child_in_for = in_for || el.for_clause.is_some();
        for child in &mut el.children {
            if let TemplateNode::Element(child) = child {
                self.mark_static_roots(child, child_in_for);
            }
        }
        for condition in &mut el.if_conditions {
            self.mark_static_roots(&mut condition.block, in_for);
        }
    }
}
