//! Call contexts and the pluggable context-selection policy.
//!
//! Grounded in `codegraph-ir`'s `context_sensitive.rs`: a small immutable
//! context value plus a strategy object that decides how contexts compose
//! across call edges and heap allocations, rather than hard-coding one
//! sensitivity variant into the solver.

use crate::shared::heap::Obj;
use crate::shared::ir::{AllocSiteId, StmtId};
use std::sync::Arc;

/// An immutable call-site sequence, truncated to whatever length the
/// active `ContextSelector` allows. `Arc` keeps cloning cheap — contexts
/// are copied on every points-to propagation step.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Context(Arc<Vec<StmtId>>);

impl Context {
    pub fn empty() -> Self {
        Context(Arc::new(Vec::new()))
    }

    pub fn elements(&self) -> &[StmtId] {
        &self.0
    }

    /// Append `site` and keep only the last `k` elements.
    fn extended(&self, site: StmtId, k: usize) -> Context {
        if k == 0 {
            return Context::empty();
        }
        let mut v = self.0.as_ref().clone();
        v.push(site);
        if v.len() > k {
            let drop = v.len() - k;
            v.drain(0..drop);
        }
        Context(Arc::new(v))
    }
}

/// Strategy deciding contexts for call edges and heap allocations
/// (`emptyContext`/`selectHeapContext`/`selectContext`).
pub trait ContextSelector {
    fn empty_context(&self) -> Context;

    /// Context for a STATIC/SPECIAL callee, which has no receiver object.
    fn select_context_static(&self, caller_ctx: &Context, call_site: StmtId) -> Context;

    /// Context for a VIRTUAL/INTERFACE callee, dispatched via `recv_obj`.
    fn select_context_virtual(
        &self,
        caller_ctx: &Context,
        call_site: StmtId,
        recv_obj: &Obj,
        recv_obj_ctx: &Context,
    ) -> Context;

    /// Context attached to an object allocated by a method running under
    /// `method_ctx`.
    fn select_heap_context(&self, method_ctx: &Context, alloc_site: AllocSiteId) -> Context;
}

/// No context sensitivity: every method/object shares the single empty
/// context (equivalent to plain Andersen's analysis).
#[derive(Debug, Default)]
pub struct Insensitive;

impl ContextSelector for Insensitive {
    fn empty_context(&self) -> Context {
        Context::empty()
    }

    fn select_context_static(&self, _caller_ctx: &Context, _call_site: StmtId) -> Context {
        Context::empty()
    }

    fn select_context_virtual(
        &self,
        _caller_ctx: &Context,
        _call_site: StmtId,
        _recv_obj: &Obj,
        _recv_obj_ctx: &Context,
    ) -> Context {
        Context::empty()
    }

    fn select_heap_context(&self, _method_ctx: &Context, _alloc_site: AllocSiteId) -> Context {
        Context::empty()
    }
}

/// k-CFA: call-site-sensitive contexts, truncated to the last `k` call
/// sites. Heap contexts are the empty context (call-site sensitivity
/// conventionally does not contextualize the heap).
#[derive(Debug)]
pub struct KCallSiteSensitive {
    pub k: usize,
}

impl ContextSelector for KCallSiteSensitive {
    fn empty_context(&self) -> Context {
        Context::empty()
    }

    fn select_context_static(&self, caller_ctx: &Context, call_site: StmtId) -> Context {
        caller_ctx.extended(call_site, self.k)
    }

    fn select_context_virtual(
        &self,
        caller_ctx: &Context,
        call_site: StmtId,
        _recv_obj: &Obj,
        _recv_obj_ctx: &Context,
    ) -> Context {
        caller_ctx.extended(call_site, self.k)
    }

    fn select_heap_context(&self, _method_ctx: &Context, _alloc_site: AllocSiteId) -> Context {
        Context::empty()
    }
}

/// 1-object-sensitivity: a virtual callee's context is the receiver
/// object's own allocation site; static calls inherit the caller's
/// context unchanged (there is no receiver to key on); heap context for an
/// allocation is the allocating method's own context.
#[derive(Debug, Default)]
pub struct OneObjectSensitive;

impl ContextSelector for OneObjectSensitive {
    fn empty_context(&self) -> Context {
        Context::empty()
    }

    fn select_context_static(&self, caller_ctx: &Context, _call_site: StmtId) -> Context {
        caller_ctx.clone()
    }

    fn select_context_virtual(
        &self,
        _caller_ctx: &Context,
        _call_site: StmtId,
        recv_obj: &Obj,
        _recv_obj_ctx: &Context,
    ) -> Context {
        Context(Arc::new(vec![recv_obj.site as StmtId]))
    }

    fn select_heap_context(&self, method_ctx: &Context, _alloc_site: AllocSiteId) -> Context {
        method_ctx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn k_call_site_sensitive_truncates_to_k() {
        let selector = KCallSiteSensitive { k: 2 };
        let c0 = selector.empty_context();
        let c1 = selector.select_context_static(&c0, 1);
        let c2 = selector.select_context_static(&c1, 2);
        let c3 = selector.select_context_static(&c2, 3);
        assert_eq!(c3.elements(), &[2, 3]);
    }

    #[test]
    fn insensitive_always_empty() {
        let selector = Insensitive;
        let c0 = selector.empty_context();
        let c1 = selector.select_context_static(&c0, 42);
        assert_eq!(c1, Context::empty());
    }
}
