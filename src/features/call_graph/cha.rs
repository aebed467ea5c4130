//! Class-hierarchy-analysis call-graph construction.
//!
//! Grounded in `codegraph-ir`'s `CallGraphBuilder` (`features/call_graph`):
//! a worklist of reachable methods, scanning each one's call sites once it
//! is discovered, generalized here to `resolve`/`dispatch` over the shared
//! `ClassHierarchy` oracle instead of a language-specific symbol table.

use crate::shared::hierarchy::{dispatch, transitive_subtypes, ClassHierarchy, MethodDecl};
use crate::shared::ir::{InvokeExpr, InvokeKind, IrProvider, MethodId, Stmt, StmtId};
use rustc_hash::FxHashSet;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallEdge {
    pub caller: MethodId,
    pub call_site: StmtId,
    pub callee: MethodId,
}

#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    edges: Vec<CallEdge>,
    reachable: FxHashSet<MethodId>,
}

impl CallGraph {
    pub fn edges(&self) -> &[CallEdge] {
        &self.edges
    }

    /// Methods CHA determined may execute, starting from the entry set.
    pub fn reachable_methods(&self) -> &FxHashSet<MethodId> {
        &self.reachable
    }

    pub fn callees_of(&self, caller: MethodId) -> impl Iterator<Item = MethodId> + '_ {
        self.edges
            .iter()
            .filter(move |e| e.caller == caller)
            .map(|e| e.callee)
    }
}

/// `resolve(cs)`: STATIC/SPECIAL dispatch statically to the
/// declared method; VIRTUAL/INTERFACE dispatch across every transitive
/// subtype of the declared owner, deduplicated by target method id.
pub fn resolve(h: &dyn ClassHierarchy, expr: &InvokeExpr) -> Vec<MethodDecl> {
    match expr.kind {
        InvokeKind::Static | InvokeKind::Special => {
            dispatch(h, expr.method.owner, &expr.method.subsignature)
                .into_iter()
                .collect()
        }
        InvokeKind::Virtual | InvokeKind::Interface => {
            let mut seen = FxHashSet::default();
            let mut out = Vec::new();
            for class in transitive_subtypes(h, expr.method.owner) {
                if let Some(decl) = dispatch(h, class, &expr.method.subsignature) {
                    if seen.insert(decl.id) {
                        out.push(decl);
                    }
                }
            }
            out
        }
    }
}

/// Worklist call-graph construction starting from `entries`: scan every
/// newly reachable method's invoke statements, resolve each call site, and
/// enqueue any callee not yet seen.
pub fn build_call_graph(
    entries: &[MethodId],
    ir: &dyn IrProvider,
    hierarchy: &dyn ClassHierarchy,
) -> CallGraph {
    let mut reachable: FxHashSet<MethodId> = entries.iter().copied().collect();
    let mut worklist: VecDeque<MethodId> = entries.iter().copied().collect();
    let mut edges = Vec::new();

    while let Some(caller) = worklist.pop_front() {
        let method_ir = ir.ir(caller);
        for s in method_ir.stmt_ids() {
            if let Stmt::Invoke { expr, .. } = &method_ir.stmts[s] {
                for decl in resolve(hierarchy, expr) {
                    edges.push(CallEdge {
                        caller,
                        call_site: s,
                        callee: decl.id,
                    });
                    if reachable.insert(decl.id) {
                        worklist.push_back(decl.id);
                    }
                }
            }
        }
    }

    CallGraph { edges, reachable }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::hierarchy::test_support::FakeHierarchy;
    use crate::shared::ir::{MethodIr, MethodRef, Type, Variable};
    use rustc_hash::FxHashMap;

    struct FakeIr(FxHashMap<MethodId, MethodIr>);

    impl IrProvider for FakeIr {
        fn ir(&self, method: MethodId) -> &MethodIr {
            self.0.get(&method).expect("unknown method in fixture")
        }
    }

    fn invoke_stmt(owner: u32, subsig: &str, kind: InvokeKind, recv: Option<u32>) -> Stmt {
        Stmt::Invoke {
            expr: InvokeExpr {
                kind,
                method: MethodRef { owner, subsignature: subsig.to_string() },
                recv,
                args: vec![],
            },
            result: None,
        }
    }

    fn leaf_method(id: MethodId) -> MethodIr {
        MethodIr::new(id, vec![], None, vec![], FxHashMap::default(), vec![Stmt::Return(None)])
    }

    #[test]
    fn virtual_call_resolves_to_every_override() {
        // Base.m() is overridden by Derived.m(); a virtual call on Base
        // dispatches to both.
        let mut h = FakeHierarchy::default();
        h.add_method(0, "m()", MethodDecl { id: 100, owner: 0, is_abstract: false });
        h.add_method(1, "m()", MethodDecl { id: 101, owner: 1, is_abstract: false });
        h.subclasses.insert(0, vec![1]);
        h.set_super(1, 0);

        let mut recv = FxHashMap::default();
        recv.insert(0, Variable { id: 0, name: "this".into(), ty: Type::Reference(0) });
        let caller = MethodIr::new(
            0,
            vec![0],
            Some(0),
            vec![],
            recv,
            vec![invoke_stmt(0, "m()", InvokeKind::Virtual, Some(0)), Stmt::Return(None)],
        );

        let mut methods = FxHashMap::default();
        methods.insert(0, caller);
        methods.insert(100, leaf_method(100));
        methods.insert(101, leaf_method(101));
        let provider = FakeIr(methods);

        let cg = build_call_graph(&[0], &provider, &h);
        let callees: FxHashSet<MethodId> = cg.callees_of(0).collect();
        assert!(callees.contains(&100));
        assert!(callees.contains(&101));
        assert!(cg.reachable_methods().contains(&101));
    }

    #[test]
    fn static_call_resolves_to_single_target() {
        let mut h = FakeHierarchy::default();
        h.add_method(0, "s()", MethodDecl { id: 200, owner: 0, is_abstract: false });

        let caller = MethodIr::new(
            0,
            vec![],
            None,
            vec![],
            FxHashMap::default(),
            vec![invoke_stmt(0, "s()", InvokeKind::Static, None), Stmt::Return(None)],
        );
        let mut methods = FxHashMap::default();
        methods.insert(0, caller);
        methods.insert(200, leaf_method(200));
        let provider = FakeIr(methods);

        let cg = build_call_graph(&[0], &provider, &h);
        let callees: Vec<MethodId> = cg.callees_of(0).collect();
        assert_eq!(callees, vec![200]);
    }
}
