//! `CSManager`: interns `CsVar`/`CsObj` so the rest of the solver can use
//! cheap `Copy` ids as map keys instead of cloning `Context`s repeatedly.
//!
//! Grounded in `codegraph-ir`'s `PointsToGraph` node-interning table
//! (`features/points_to/infrastructure/points_to_graph.rs`): a bijective
//! map plus a `Vec` back-index, with `intern` idempotent on equal keys.

use super::pointer::{CsObj, CsObjId, CsVar, CsVarId};
use rustc_hash::FxHashMap;

#[derive(Debug, Default)]
pub struct CSManager {
    vars: Vec<CsVar>,
    var_ids: FxHashMap<CsVar, CsVarId>,
    objs: Vec<CsObj>,
    obj_ids: FxHashMap<CsObj, CsObjId>,
}

impl CSManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern_var(&mut self, var: CsVar) -> CsVarId {
        if let Some(&id) = self.var_ids.get(&var) {
            return id;
        }
        let id = CsVarId(self.vars.len() as u32);
        self.vars.push(var.clone());
        self.var_ids.insert(var, id);
        id
    }

    pub fn intern_obj(&mut self, obj: CsObj) -> CsObjId {
        if let Some(&id) = self.obj_ids.get(&obj) {
            return id;
        }
        let id = CsObjId(self.objs.len() as u32);
        self.objs.push(obj.clone());
        self.obj_ids.insert(obj, id);
        id
    }

    pub fn var(&self, id: CsVarId) -> &CsVar {
        &self.vars[id.0 as usize]
    }

    /// Look up an already-interned `CsVar` without creating one — a
    /// variable that was never interned was, by construction, never
    /// reached by points-to propagation.
    pub fn var_id(&self, var: &CsVar) -> Option<CsVarId> {
        self.var_ids.get(var).copied()
    }

    pub fn obj(&self, id: CsObjId) -> &CsObj {
        &self.objs[id.0 as usize]
    }

    #[cfg(test)]
    pub fn var_id_for_test(
        &self,
        context: super::context::Context,
        var: crate::shared::ir::VarId,
        method: crate::shared::ir::MethodId,
    ) -> Option<CsVarId> {
        self.var_ids.get(&CsVar { context, var, method }).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::points_to::context::Context;
    use crate::shared::heap::Obj;

    #[test]
    fn interning_is_idempotent() {
        let mut mgr = CSManager::new();
        let var = CsVar { context: Context::empty(), var: 1, method: 0 };
        let a = mgr.intern_var(var.clone());
        let b = mgr.intern_var(var);
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_contexts_intern_distinct_ids() {
        let mut mgr = CSManager::new();
        let obj = Obj { site: 1, class: 1 };
        let a = mgr.intern_obj(CsObj { context: Context::empty(), obj });
        let b = mgr.intern_obj(CsObj {
            context: Context::empty(),
            obj: Obj { site: 2, class: 1 },
        });
        assert_ne!(a, b);
    }
}
