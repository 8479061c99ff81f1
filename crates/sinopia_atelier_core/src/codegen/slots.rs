//! Slot outlets (`<slot>`) and scoped slot functions (`scopedSlots:_u([...])`).

use sinopia_carton::{camelize, slot_hash, String};
use sinopia_relief::{
    Attr, Code, ElementNode, Helper, ProcessFlags, PropKey, TemplateNode, EMPTY_SLOT_SCOPE,
};

use super::{data::gen_props, AltGen, CodegenContext};

impl CodegenContext<'_> {
    /// `_t(name, fallback?, props?, bindObject?)`
    pub(super) fn gen_slot(&mut self, el: &ElementNode) -> Code {
        let name = match &el.slot_name {
            Some(name) => Code::expr(name.clone()),
            None => Code::Str("default".into()),
        };
        let children = self
            .gen_children(el, false)
            .map(|(children, _)| Code::func("", children));

        let attrs = if el.attrs.is_empty() && el.dynamic_attrs.is_empty() {
            None
        } else {
            let camelized: Vec<Attr> = el
                .attrs
                .iter()
                .chain(&el.dynamic_attrs)
                .map(|attr| Attr {
                    name: camelize(&attr.name).into(),
                    ..attr.clone()
                })
                .collect();
            Some(gen_props(&camelized))
        };
        let bind = el.attr("v-bind").filter(|b| !b.is_empty());

        let mut args = vec![name];
        let has_children = children.is_some();
        args.extend(children);
        if (attrs.is_some() || bind.is_some()) && !has_children {
            args.push(Code::Null);
        }
        let has_attrs = attrs.is_some();
        args.extend(attrs);
        if let Some(bind) = bind {
            if !has_attrs {
                args.push(Code::Null);
            }
            args.push(Code::expr(bind));
        }
        Code::call(Helper::RenderSlot, args)
    }

    /// `_u([slots], null, true)` when the slots must be re-rendered with the
    /// parent, `_u([slots], null, false, hash)` when only the enclosing
    /// `v-if` can swap them.
    pub(super) fn gen_scoped_slots(&mut self, el: &ElementNode) -> Code {
        let mut needs_force_update = el.for_clause.is_some()
            || el.scoped_slots.iter().any(|(_, slot)| {
                slot.slot_target_dynamic
                    || slot.if_exp.is_some()
                    || slot.for_clause.is_some()
                    || contains_slot_child(slot)
            });
        let mut needs_key = el.if_exp.is_some();
        if !needs_force_update {
            for frame in self.frames.iter().rev() {
                if frame.scoped || frame.has_for {
                    needs_force_update = true;
                    break;
                }
                if frame.has_if {
                    needs_key = true;
                }
            }
        }

        let frame = self.frame(el);
        self.frames.push(frame);
        let slots: Vec<Code> = el
            .scoped_slots
            .iter()
            .map(|(_, slot)| self.gen_scoped_slot(slot, ProcessFlags::empty()))
            .collect();
        self.frames.pop();

        let mut args = Vec::with_capacity(4);
        if needs_force_update {
            args.extend([Code::Null, Code::Bool(true)]);
        } else if needs_key {
            let joined = slots
                .iter()
                .map(|slot| slot.to_string())
                .collect::<Vec<_>>()
                .join(",");
            args.extend([
                Code::Null,
                Code::Bool(false),
                Code::Int(i64::from(slot_hash(&joined))),
            ]);
        }
        args.insert(0, Code::Array(slots));
        Code::call(Helper::ResolveScopedSlots, args)
    }

    /// `{key:name,fn:function(scope){return ...}}`
    pub(super) fn gen_scoped_slot(&mut self, el: &ElementNode, flags: ProcessFlags) -> Code {
        let legacy = el.attr("slot-scope").is_some_and(|s| !s.is_empty());
        if el.if_exp.is_some() && !flags.contains(ProcessFlags::IF) && !legacy {
            return self.gen_if(el, flags, AltGen::ScopedSlot);
        }
        if el.for_clause.is_some() && !flags.contains(ProcessFlags::FOR) {
            return self.gen_for(el, flags, AltGen::ScopedSlot);
        }

        let scope = match el.slot_scope.as_deref() {
            Some(EMPTY_SLOT_SCOPE) | None => String::default(),
            Some(scope) => String::from(scope),
        };
        let body = if el.tag.as_str() == "template" {
            let children = self
                .gen_children(el, false)
                .map_or(Code::Undefined, |(children, _)| children);
            match &el.if_exp {
                Some(exp) if legacy => Code::cond(exp.clone(), children, Code::Undefined),
                _ => children,
            }
        } else {
            self.gen_element(el, flags)
        };

        let key = match &el.slot_target {
            Some(target) => Code::expr(target.clone()),
            None => Code::Str("default".into()),
        };
        let proxy = scope.is_empty();
        let mut entries = vec![
            (PropKey::Ident("key".into()), key),
            (PropKey::Ident("fn".into()), Code::func(scope, body)),
        ];
        if proxy {
            entries.push((PropKey::Ident("proxy".into()), Code::Bool(true)));
        }
        Code::Object(entries)
    }
}

fn contains_slot_child(el: &ElementNode) -> bool {
    el.tag.as_str() == "slot"
        || el
            .children
            .iter()
            .any(|child| matches!(child, TemplateNode::Element(c) if contains_slot_child(c)))
}
