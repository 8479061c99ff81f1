//! Render code generation.
//!
//! Walks the optimized element tree and builds the render IR ([`Code`]).
//! The entry point is [`generate`]; element dispatch, structural directives
//! and children live here, the data object in [`data`], listeners in
//! [`events`] and slot outlets / scoped slots in [`slots`].

mod data;
mod events;
mod slots;

pub use events::{gen_handler, gen_handlers};

use sinopia_carton::String;
use sinopia_relief::{
    Code, CompilerOptions, Diagnostics, ElementNode, Helper, ProcessFlags, TemplateNode,
};

/// Output of [`generate`].
#[derive(Debug, Clone, PartialEq)]
pub struct CodegenResult {
    /// Body of the render function.
    pub render: Code,
    /// Bodies of the hoisted static render functions, indexed by `_m(n)`.
    pub static_render_fns: Vec<Code>,
}

/// What is known about an ancestor of the element being generated.
#[derive(Debug, Clone)]
pub(super) struct Frame {
    pub(super) has_for: bool,
    pub(super) key: Option<String>,
    /// `v-pre` on the element or any of its ancestors.
    pub(super) pre: bool,
    /// Carries a real (not placeholder) slot scope.
    pub(super) scoped: bool,
    pub(super) has_if: bool,
}

/// How the element of a structural directive is generated once expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum AltGen {
    Element,
    ScopedSlot,
}

/// Code generation context
pub struct CodegenContext<'a> {
    pub(super) options: &'a CompilerOptions,
    pub(super) diag: &'a mut Diagnostics,
    /// Hoisted static subtrees
    pub(super) static_render_fns: Vec<Code>,
    /// Next `_o` id for `v-once` inside keyed `v-for`
    pub(super) once_id: i64,
    /// Inside a `v-pre` static subtree
    pub(super) pre: bool,
    /// Ancestors of the element being generated, outermost first
    pub(super) frames: Vec<Frame>,
}

/// Generate render code for a parsed (and usually optimized) template.
///
/// A missing root renders an empty `div`; a `<script>` root renders nothing.
pub fn generate(
    ast: Option<&ElementNode>,
    options: &CompilerOptions,
    diag: &mut Diagnostics,
) -> CodegenResult {
    let mut ctx = CodegenContext::new(options, diag);
    let render = match ast {
        None => Code::call(Helper::CreateElement, vec![Code::Str("div".into())]),
        Some(el) if el.tag.as_str() == "script" => Code::Null,
        Some(el) => ctx.gen_element(el, ProcessFlags::empty()),
    };
    tracing::debug!(
        static_render_fns = ctx.static_render_fns.len(),
        "render code generated"
    );
    CodegenResult {
        render,
        static_render_fns: ctx.static_render_fns,
    }
}

impl<'a> CodegenContext<'a> {
    pub fn new(options: &'a CompilerOptions, diag: &'a mut Diagnostics) -> Self {
        Self {
            options,
            diag,
            static_render_fns: Vec::new(),
            once_id: 0,
            pre: false,
            frames: Vec::new(),
        }
    }

    /// Component tags and unknown tags.
    pub(super) fn maybe_component(&self, el: &ElementNode) -> bool {
        el.component.is_some() || !(self.options.is_reserved_tag)(&el.tag)
    }

    /// `v-pre` applies to the element itself or is inherited from its parent.
    pub(super) fn effective_pre(&self, el: &ElementNode) -> bool {
        el.pre || self.frames.last().is_some_and(|f| f.pre)
    }

    pub(super) fn frame(&self, el: &ElementNode) -> Frame {
        Frame {
            has_for: el.for_clause.is_some(),
            key: el.key.clone(),
            pre: self.effective_pre(el),
            scoped: el
                .slot_scope
                .as_deref()
                .is_some_and(|s| !s.is_empty() && s != sinopia_relief::EMPTY_SLOT_SCOPE),
            has_if: el.if_exp.is_some(),
        }
    }

    pub fn gen_element(&mut self, el: &ElementNode, flags: ProcessFlags) -> Code {
        if el.static_root && !flags.contains(ProcessFlags::STATIC) {
            return self.gen_static(el, flags);
        }
        if el.once && !flags.contains(ProcessFlags::ONCE) {
            return self.gen_once(el, flags);
        }
        if el.for_clause.is_some() && !flags.contains(ProcessFlags::FOR) {
            return self.gen_for(el, flags, AltGen::Element);
        }
        if el.if_exp.is_some() && !flags.contains(ProcessFlags::IF) {
            return self.gen_if(el, flags, AltGen::Element);
        }
        if el.tag.as_str() == "template" && el.slot_target.is_none() && !self.pre {
            return match self.gen_children(el, false) {
                Some((children, _)) => children,
                None => Code::Void,
            };
        }
        if el.tag.as_str() == "slot" {
            return self.gen_slot(el);
        }
        if let Some(component) = &el.component {
            return self.gen_component(component, el);
        }

        let pre = self.effective_pre(el);
        let data = if !el.plain || (pre && self.maybe_component(el)) {
            Some(self.gen_data(el))
        } else {
            None
        };
        let children = if el.inline_template {
            None
        } else {
            self.gen_children(el, true)
        };
        let mut args = vec![Code::TagName(el.tag.clone())];
        args.extend(data);
        push_children(&mut args, children);
        Code::call(Helper::CreateElement, args)
    }

    fn gen_component(&mut self, component: &str, el: &ElementNode) -> Code {
        let children = if el.inline_template {
            None
        } else {
            self.gen_children(el, true)
        };
        let data = self.gen_data(el);
        let mut args = vec![Code::expr(component), data];
        push_children(&mut args, children);
        Code::call(Helper::CreateElement, args)
    }

    /// Hoist a static subtree into its own render function: `_m(index)`.
    fn gen_static(&mut self, el: &ElementNode, flags: ProcessFlags) -> Code {
        let original_pre = self.pre;
        if self.effective_pre(el) {
            self.pre = true;
        }
        let body = self.gen_element(el, flags | ProcessFlags::STATIC);
        self.static_render_fns.push(body);
        self.pre = original_pre;

        let index = self.static_render_fns.len() as i64 - 1;
        let mut args = vec![Code::Int(index)];
        if el.static_in_for {
            args.push(Code::Bool(true));
        }
        Code::call(Helper::RenderStatic, args)
    }

    /// `v-once`: cached by the nearest keyed `v-for`, or hoisted.
    fn gen_once(&mut self, el: &ElementNode, flags: ProcessFlags) -> Code {
        let flags = flags | ProcessFlags::ONCE;
        if el.if_exp.is_some() && !flags.contains(ProcessFlags::IF) {
            return self.gen_if(el, flags, AltGen::Element);
        }
        if !el.static_in_for {
            return self.gen_static(el, flags);
        }

        let key = self
            .frames
            .iter()
            .rev()
            .find(|frame| frame.has_for)
            .and_then(|frame| frame.key.clone());
        match key {
            Some(key) => {
                let code = self.gen_element(el, flags);
                let id = self.once_id;
                self.once_id += 1;
                Code::call(Helper::MarkOnce, vec![code, Code::Int(id), Code::expr(key)])
            }
            None => {
                self.diag.warn(
                    "v-once can only be used inside v-for that is keyed. ",
                    el.raw_attr_range("v-once"),
                );
                self.gen_element(el, flags)
            }
        }
    }

    pub(super) fn gen_for(&mut self, el: &ElementNode, flags: ProcessFlags, alt: AltGen) -> Code {
        let Some(clause) = &el.for_clause else {
            return self.gen_alt(el, flags, alt);
        };
        if self.maybe_component(el)
            && el.tag.as_str() != "slot"
            && el.tag.as_str() != "template"
            && el.key.is_none()
        {
            self.diag.tip(
                format!(
                    "<{} v-for=\"{} in {}\">: component lists rendered with v-for should have explicit keys.",
                    el.tag, clause.alias, clause.source
                ),
                el.raw_attr_range("v-for"),
            );
        }
        let body = self.gen_alt(el, flags | ProcessFlags::FOR, alt);
        Code::call(
            Helper::RenderList,
            vec![
                Code::paren(Code::expr(clause.source.clone())),
                Code::func(clause.params(), body),
            ],
        )
    }

    /// `(a)?x:(b)?y:z`, with `_e()` (or `null` for scoped slots) when no
    /// branch matches.
    pub(super) fn gen_if(&mut self, el: &ElementNode, flags: ProcessFlags, alt: AltGen) -> Code {
        let flags = flags | ProcessFlags::IF;
        let mut branches: Vec<(Option<String>, Code)> = Vec::new();
        branches.push((el.if_exp.clone(), self.gen_ternary(el, flags, alt)));
        for condition in &el.if_conditions {
            if branches.last().is_some_and(|(exp, _)| exp.is_none()) {
                break;
            }
            let code = self.gen_ternary(&condition.block, ProcessFlags::empty(), alt);
            branches.push((condition.exp.clone(), code));
        }

        let mut result = match branches.last() {
            Some((None, _)) => branches.pop().map(|(_, code)| code),
            _ => None,
        }
        .unwrap_or_else(|| match alt {
            AltGen::ScopedSlot => Code::Null,
            AltGen::Element => Code::call(Helper::CreateEmpty, vec![]),
        });
        for (exp, code) in branches.into_iter().rev() {
            // only the trailing branch may lack a condition
            if let Some(exp) = exp {
                result = Code::cond(exp, code, result);
            }
        }
        result
    }

    fn gen_ternary(&mut self, el: &ElementNode, flags: ProcessFlags, alt: AltGen) -> Code {
        match alt {
            AltGen::ScopedSlot => self.gen_scoped_slot(el, flags),
            AltGen::Element if el.once => self.gen_once(el, flags),
            AltGen::Element => self.gen_element(el, flags),
        }
    }

    fn gen_alt(&mut self, el: &ElementNode, flags: ProcessFlags, alt: AltGen) -> Code {
        match alt {
            AltGen::Element => self.gen_element(el, flags),
            AltGen::ScopedSlot => self.gen_scoped_slot(el, flags),
        }
    }

    /// Children of `el` and, when `check_skip` is set, the normalization
    /// level the runtime has to apply to them.
    pub(super) fn gen_children(
        &mut self,
        el: &ElementNode,
        check_skip: bool,
    ) -> Option<(Code, Option<i64>)> {
        if el.children.is_empty() {
            return None;
        }
        let frame = self.frame(el);
        self.frames.push(frame);
        let result = self.gen_children_in_frame(&el.children, check_skip);
        self.frames.pop();
        Some(result)
    }

    fn gen_children_in_frame(
        &mut self,
        children: &[TemplateNode],
        check_skip: bool,
    ) -> (Code, Option<i64>) {
        if let [TemplateNode::Element(only)] = children {
            if only.for_clause.is_some()
                && only.tag.as_str() != "template"
                && only.tag.as_str() != "slot"
            {
                let normalization = check_skip.then(|| i64::from(self.maybe_component(only)));
                return (self.gen_element(only, ProcessFlags::empty()), normalization);
            }
        }

        let normalization = if check_skip {
            Some(self.normalization_type(children)).filter(|n| *n != 0)
        } else {
            None
        };
        let nodes = children.iter().map(|node| self.gen_node(node)).collect();
        (Code::Array(nodes), normalization)
    }

    /// 0: none, 1: simple (components may return arrays), 2: full.
    fn normalization_type(&self, children: &[TemplateNode]) -> i64 {
        let needs_normalization = |el: &ElementNode| {
            el.for_clause.is_some() || el.tag.as_str() == "template" || el.tag.as_str() == "slot"
        };
        let mut level = 0;
        for el in children.iter().filter_map(TemplateNode::as_element) {
            let mut blocks = std::iter::once(el).chain(el.if_conditions.iter().map(|c| &c.block));
            if blocks.clone().any(needs_normalization) {
                return 2;
            }
            if blocks.any(|block| self.maybe_component(block)) {
                level = 1;
            }
        }
        level
    }

    fn gen_node(&mut self, node: &TemplateNode) -> Code {
        match node {
            TemplateNode::Element(el) => self.gen_element(el, ProcessFlags::empty()),
            TemplateNode::Expression(text) => {
                Code::call(Helper::CreateText, vec![Code::expr(text.expression.clone())])
            }
            TemplateNode::Text(text) => {
                Code::call(Helper::CreateText, vec![Code::Str(text.text.clone())])
            }
            TemplateNode::Comment(comment) => {
                Code::call(Helper::CreateEmpty, vec![Code::Str(comment.text.clone())])
            }
        }
    }
}

/// Append `children[,normalization]` to a `_c` argument list.
fn push_children(args: &mut Vec<Code>, children: Option<(Code, Option<i64>)>) {
    if let Some((children, normalization)) = children {
        args.push(children);
        args.extend(normalization.map(Code::Int));
    }
}

/// Escape line separators that would end a JavaScript string literal.
pub(super) fn transform_special_newlines(source: &str) -> String {
    if source.contains(['\u{2028}', '\u{2029}']) {
        source
            .replace('\u{2028}', "\\u2028")
            .replace('\u{2029}', "\\u2029")
            .into()
    } else {
        String::from(source)
    }
}
