//! Context-sensitive, on-the-fly points-to analysis.
//!
//! Grounded in `codegraph-ir`'s `AndersenSolver::solve_with_worklist`
//! (`features/points_to/infrastructure/andersen_solver.rs`): `propagate`/
//! `addPFGEdge` drive a single worklist of `(pointer, points-to delta)`
//! pairs to a fixed point, while call-graph discovery (`processCall`/
//! `handleCall`) happens on the fly as receivers gain new objects, instead
//! of being precomputed by a separate CHA-style pass.

use super::context::{Context, ContextSelector};
use super::manager::CSManager;
use super::pfg::PointerFlowGraph;
use super::pointer::{CsObj, CsObjId, CsVar, CsVarId, Pointer};
use crate::features::lattice::SetFact;
use crate::shared::heap::HeapModel;
use crate::shared::hierarchy::{dispatch, ClassHierarchy, MethodDecl};
use crate::shared::ir::{FieldRef, InvokeKind, IrProvider, MethodId, MethodRef, RValue, Stmt, StmtId, VarId};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

/// Points-to set: a set of context-sensitive objects.
pub type PointsToSet = SetFact<CsObjId>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CsCallEdge {
    pub caller: (Context, MethodId),
    pub call_site: StmtId,
    pub callee: (Context, MethodId),
}

#[derive(Debug, Clone)]
enum FieldOp {
    Store(VarId),
    Load(VarId),
}

#[derive(Debug, Clone)]
enum ArrayOp {
    Store(VarId),
    Load(VarId),
}

#[derive(Debug, Clone)]
struct PendingCall {
    call_site: StmtId,
    caller_ctx: Context,
    caller_method: MethodId,
    kind: InvokeKind,
    method_ref: MethodRef,
    args: Vec<VarId>,
    result: Option<VarId>,
}

/// Final output of the solver: the points-to sets, the interning table
/// that gives them meaning, the pointer flow graph (reused by the taint
/// overlay), and the on-the-fly call graph.
pub struct PointsToResult {
    pub pts: FxHashMap<Pointer, PointsToSet>,
    pub manager: CSManager,
    pub pfg: PointerFlowGraph,
    pub call_edges: FxHashSet<CsCallEdge>,
    pub reachable: FxHashSet<(Context, MethodId)>,
}

impl PointsToResult {
    pub fn pts_of(&self, pointer: &Pointer) -> PointsToSet {
        self.pts.get(pointer).cloned().unwrap_or_default()
    }
}

pub struct PointerAnalysis<'a> {
    ir: &'a dyn IrProvider,
    hierarchy: &'a dyn ClassHierarchy,
    heap: &'a dyn HeapModel,
    selector: &'a dyn ContextSelector,

    manager: CSManager,
    pfg: PointerFlowGraph,
    pts: FxHashMap<Pointer, PointsToSet>,
    worklist: VecDeque<(Pointer, PointsToSet)>,

    reachable: FxHashSet<(Context, MethodId)>,
    call_edges: FxHashSet<CsCallEdge>,
    scanned_methods: FxHashSet<MethodId>,
    field_index: FxHashMap<(MethodId, VarId), Vec<(FieldRef, FieldOp)>>,
    array_index: FxHashMap<(MethodId, VarId), Vec<ArrayOp>>,
    pending_calls: FxHashMap<CsVarId, Vec<PendingCall>>,
}

impl<'a> PointerAnalysis<'a> {
    pub fn new(
        ir: &'a dyn IrProvider,
        hierarchy: &'a dyn ClassHierarchy,
        heap: &'a dyn HeapModel,
        selector: &'a dyn ContextSelector,
    ) -> Self {
        PointerAnalysis {
            ir,
            hierarchy,
            heap,
            selector,
            manager: CSManager::new(),
            pfg: PointerFlowGraph::new(),
            pts: FxHashMap::default(),
            worklist: VecDeque::new(),
            reachable: FxHashSet::default(),
            call_edges: FxHashSet::default(),
            scanned_methods: FxHashSet::default(),
            field_index: FxHashMap::default(),
            array_index: FxHashMap::default(),
            pending_calls: FxHashMap::default(),
        }
    }

    pub fn solve(mut self, entries: &[MethodId]) -> PointsToResult {
        tracing::debug!(entries = entries.len(), "starting points-to analysis");
        for &m in entries {
            let ctx = self.selector.empty_context();
            self.add_reachable(ctx, m);
        }

        while let Some((pointer, delta)) = self.worklist.pop_front() {
            let diff = self.propagate(pointer.clone(), delta);
            if diff.is_empty() {
                continue;
            }
            let successors: Vec<Pointer> = self.pfg.object_successors(&pointer).cloned().collect();
            for succ in successors {
                self.worklist.push_back((succ, diff.clone()));
            }
            if let Pointer::Var(var_id) = pointer {
                self.dispatch_new_objects(var_id, &diff);
            }
        }

        tracing::debug!(
            reachable = self.reachable.len(),
            edges = self.call_edges.len(),
            "points-to analysis reached fixed point"
        );
        PointsToResult {
            pts: self.pts,
            manager: self.manager,
            pfg: self.pfg,
            call_edges: self.call_edges,
            reachable: self.reachable,
        }
    }

    fn propagate(&mut self, pointer: Pointer, delta: PointsToSet) -> PointsToSet {
        let entry = self.pts.entry(pointer).or_default();
        let mut diff = PointsToSet::new();
        for &obj in delta.iter() {
            if entry.insert(obj) {
                diff.insert(obj);
            }
        }
        diff
    }

    fn add_pfg_edge(&mut self, from: Pointer, to: Pointer) {
        if self.pfg.add_object_edge(from.clone(), to.clone()) {
            if let Some(existing) = self.pts.get(&from).cloned() {
                if !existing.is_empty() {
                    self.worklist.push_back((to, existing));
                }
            }
        }
    }

    fn dispatch_new_objects(&mut self, var_id: CsVarId, diff: &PointsToSet) {
        let cs_var = self.manager.var(var_id).clone();
        if let Some(ops) = self.field_index.get(&(cs_var.method, cs_var.var)).cloned() {
            for &obj in diff.iter() {
                for (field, op) in &ops {
                    self.apply_field_op(&cs_var.context, cs_var.method, obj, field, op);
                }
            }
        }
        if let Some(ops) = self.array_index.get(&(cs_var.method, cs_var.var)).cloned() {
            for &obj in diff.iter() {
                for op in &ops {
                    self.apply_array_op(&cs_var.context, cs_var.method, obj, op);
                }
            }
        }
        for &obj in diff.iter() {
            self.process_call(var_id, obj);
        }
    }

    fn apply_field_op(&mut self, ctx: &Context, method: MethodId, obj: CsObjId, field: &FieldRef, op: &FieldOp) {
        let field_ptr = Pointer::InstanceField(obj, field.clone());
        match op {
            FieldOp::Store(rhs) => {
                let rhs_ptr = self.var_ptr(ctx.clone(), *rhs, method);
                self.add_pfg_edge(rhs_ptr, field_ptr);
            }
            FieldOp::Load(lhs) => {
                let lhs_ptr = self.var_ptr(ctx.clone(), *lhs, method);
                self.add_pfg_edge(field_ptr, lhs_ptr);
            }
        }
    }

    fn apply_array_op(&mut self, ctx: &Context, method: MethodId, obj: CsObjId, op: &ArrayOp) {
        let array_ptr = Pointer::ArrayIndex(obj);
        match op {
            ArrayOp::Store(rhs) => {
                let rhs_ptr = self.var_ptr(ctx.clone(), *rhs, method);
                self.add_pfg_edge(rhs_ptr, array_ptr);
            }
            ArrayOp::Load(lhs) => {
                let lhs_ptr = self.var_ptr(ctx.clone(), *lhs, method);
                self.add_pfg_edge(array_ptr, lhs_ptr);
            }
        }
    }

    fn var_ptr(&mut self, context: Context, var: VarId, method: MethodId) -> Pointer {
        Pointer::Var(self.manager.intern_var(CsVar { context, var, method }))
    }

    fn add_reachable(&mut self, ctx: Context, method: MethodId) {
        if !self.reachable.insert((ctx.clone(), method)) {
            return;
        }
        if self.scanned_methods.insert(method) {
            self.scan_method_constraints(method);
        }

        let method_ir = self.ir.ir(method);
        for s in method_ir.stmt_ids() {
            match &method_ir.stmts[s] {
                Stmt::Assign { lhs, rhs: RValue::New(site) } => {
                    let obj = self.heap.obj_for(*site);
                    let heap_ctx = self.selector.select_heap_context(&ctx, *site);
                    let cs_obj = self.manager.intern_obj(CsObj { context: heap_ctx, obj });
                    let lhs_ptr = self.var_ptr(ctx.clone(), *lhs, method);
                    let mut delta = PointsToSet::new();
                    delta.insert(cs_obj);
                    self.worklist.push_back((lhs_ptr, delta));
                }
                Stmt::Assign { lhs, rhs: RValue::Var(y) } | Stmt::Assign { lhs, rhs: RValue::Cast(y) } => {
                    let from = self.var_ptr(ctx.clone(), *y, method);
                    let to = self.var_ptr(ctx.clone(), *lhs, method);
                    self.add_pfg_edge(from, to);
                }
                Stmt::Assign { .. } => {} // IntConst/Binary: no reference-typed payload
                Stmt::StoreStaticField { field, rhs } => {
                    let from = self.var_ptr(ctx.clone(), *rhs, method);
                    self.add_pfg_edge(from, Pointer::StaticField(field.clone()));
                }
                Stmt::LoadStaticField { lhs, field } => {
                    let to = self.var_ptr(ctx.clone(), *lhs, method);
                    self.add_pfg_edge(Pointer::StaticField(field.clone()), to);
                }
                Stmt::Invoke { expr, result } => match expr.kind {
                    InvokeKind::Static => {
                        if let Some(decl) = dispatch(self.hierarchy, expr.method.owner, &expr.method.subsignature) {
                            let callee_ctx = self.selector.select_context_static(&ctx, s);
                            self.handle_call(
                                ctx.clone(),
                                method,
                                s,
                                decl,
                                callee_ctx,
                                None,
                                &expr.args,
                                *result,
                            );
                        }
                    }
                    InvokeKind::Special | InvokeKind::Virtual | InvokeKind::Interface => {
                        if let Some(recv) = expr.recv {
                            let recv_id = self.manager.intern_var(CsVar {
                                context: ctx.clone(),
                                var: recv,
                                method,
                            });
                            self.pending_calls.entry(recv_id).or_default().push(PendingCall {
                                call_site: s,
                                caller_ctx: ctx.clone(),
                                caller_method: method,
                                kind: expr.kind,
                                method_ref: expr.method.clone(),
                                args: expr.args.clone(),
                                result: *result,
                            });
                            let idx = self.pending_calls[&recv_id].len() - 1;
                            if let Some(existing) = self.pts.get(&Pointer::Var(recv_id)).cloned() {
                                for &obj in existing.iter() {
                                    self.process_one_pending_call(recv_id, obj, idx);
                                }
                            }
                        }
                    }
                },
                _ => {} // field/array loads and stores are driven by field_index/array_index
            }
        }
    }

    fn scan_method_constraints(&mut self, method: MethodId) {
        let method_ir = self.ir.ir(method);
        for s in method_ir.stmt_ids() {
            match &method_ir.stmts[s] {
                Stmt::StoreField { base, field, rhs } => {
                    self.field_index
                        .entry((method, *base))
                        .or_default()
                        .push((field.clone(), FieldOp::Store(*rhs)));
                }
                Stmt::LoadField { lhs, base, field } => {
                    self.field_index
                        .entry((method, *base))
                        .or_default()
                        .push((field.clone(), FieldOp::Load(*lhs)));
                }
                Stmt::StoreArray { base, rhs, .. } => {
                    self.array_index.entry((method, *base)).or_default().push(ArrayOp::Store(*rhs));
                }
                Stmt::LoadArray { lhs, base, .. } => {
                    self.array_index.entry((method, *base)).or_default().push(ArrayOp::Load(*lhs));
                }
                _ => {}
            }
        }
    }

    /// `processCall`: a receiver variable just gained `obj`;
    /// fire every call site that was waiting on it.
    fn process_call(&mut self, recv_id: CsVarId, obj: CsObjId) {
        let count = match self.pending_calls.get(&recv_id) {
            Some(calls) => calls.len(),
            None => return,
        };
        for idx in 0..count {
            self.process_one_pending_call(recv_id, obj, idx);
        }
    }

    fn process_one_pending_call(&mut self, recv_id: CsVarId, obj: CsObjId, idx: usize) {
        let call = self.pending_calls[&recv_id][idx].clone();
        let cs_obj = self.manager.obj(obj).clone();
        let decl: Option<MethodDecl> = match call.kind {
            InvokeKind::Special => dispatch(self.hierarchy, call.method_ref.owner, &call.method_ref.subsignature),
            InvokeKind::Virtual | InvokeKind::Interface => {
                dispatch(self.hierarchy, cs_obj.obj.class, &call.method_ref.subsignature)
            }
            InvokeKind::Static => None,
        };
        let Some(decl) = decl else { return };
        let callee_ctx = self.selector.select_context_virtual(
            &call.caller_ctx,
            call.call_site,
            &cs_obj.obj,
            &cs_obj.context,
        );
        self.handle_call(
            call.caller_ctx,
            call.caller_method,
            call.call_site,
            decl,
            callee_ctx,
            Some(obj),
            &call.args,
            call.result,
        );
    }

    /// `handleCall`: record the call edge, ensure the callee
    /// is reachable, and wire receiver/argument/return edges.
    #[allow(clippy::too_many_arguments)]
    fn handle_call(
        &mut self,
        caller_ctx: Context,
        caller_method: MethodId,
        call_site: StmtId,
        decl: MethodDecl,
        callee_ctx: Context,
        recv_obj: Option<CsObjId>,
        args: &[VarId],
        result: Option<VarId>,
    ) {
        let callee = decl.id;
        let is_new_edge = self.call_edges.insert(CsCallEdge {
            caller: (caller_ctx.clone(), caller_method),
            call_site,
            callee: (callee_ctx.clone(), callee),
        });
        if !is_new_edge {
            return;
        }
        self.add_reachable(callee_ctx.clone(), callee);

        let callee_ir = self.ir.ir(callee);
        if let Some(obj) = recv_obj {
            if let Some(this_var) = callee_ir.this_var {
                let this_ptr = self.var_ptr(callee_ctx.clone(), this_var, callee);
                let mut delta = PointsToSet::new();
                delta.insert(obj);
                self.worklist.push_back((this_ptr, delta));
            }
        }
        let params = callee_ir.params.clone();
        let return_vars = callee_ir.return_vars.clone();
        for (formal, actual) in params.iter().zip(args.iter()) {
            let actual_ptr = self.var_ptr(caller_ctx.clone(), *actual, caller_method);
            let formal_ptr = self.var_ptr(callee_ctx.clone(), *formal, callee);
            self.add_pfg_edge(actual_ptr, formal_ptr);
        }
        if let Some(result_var) = result {
            let result_ptr = self.var_ptr(caller_ctx.clone(), result_var, caller_method);
            for ret_var in return_vars {
                let ret_ptr = self.var_ptr(callee_ctx.clone(), ret_var, callee);
                self.add_pfg_edge(ret_ptr, result_ptr.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::points_to::context::Insensitive;
    use crate::shared::heap::Obj;
    use crate::shared::hierarchy::test_support::FakeHierarchy;
    use crate::shared::ir::{AllocSiteId, InvokeExpr, MethodIr, Type, Variable};

    struct FakeIr(FxHashMap<MethodId, MethodIr>);
    impl IrProvider for FakeIr {
        fn ir(&self, method: MethodId) -> &MethodIr {
            self.0.get(&method).expect("unknown method in fixture")
        }
    }

    struct FakeHeap;
    impl HeapModel for FakeHeap {
        fn obj_for(&self, site: AllocSiteId) -> Obj {
            Obj { site, class: site } // one class per site, good enough for tests
        }
    }

    fn var(id: VarId, ty: Type) -> (VarId, Variable) {
        (id, Variable { id, name: format!("v{id}"), ty })
    }

    #[test]
    fn allocation_reaches_a_simple_copy() {
        // v0 = new C; v1 = v0;
        let stmts = vec![
            Stmt::Assign { lhs: 0, rhs: RValue::New(10) },
            Stmt::Assign { lhs: 1, rhs: RValue::Var(0) },
            Stmt::Return(None),
        ];
        let vars = [var(0, Type::Reference(1)), var(1, Type::Reference(1))]
            .into_iter()
            .collect();
        let method = MethodIr::new(0, vec![], None, vec![], vars, stmts);
        let mut methods = FxHashMap::default();
        methods.insert(0, method);
        let provider = FakeIr(methods);
        let hierarchy = FakeHierarchy::default();
        let heap = FakeHeap;
        let selector = Insensitive;

        let pa = PointerAnalysis::new(&provider, &hierarchy, &heap, &selector);
        let result = pa.solve(&[0]);

        let v1_id = result
            .manager
            .var_id_for_test(Context::empty(), 1, 0)
            .expect("v1 interned");
        let pts = result.pts_of(&Pointer::Var(v1_id));
        assert_eq!(pts.iter().count(), 1);
    }

    #[test]
    fn virtual_call_propagates_receiver_and_return_value() {
        // caller: v0 = new C; invoke v0.m() -> v1
        // callee m(): return this_field -- simplified to `return this`
        let mut h = FakeHierarchy::default();
        h.add_method(1, "m()", MethodDecl { id: 100, owner: 1, is_abstract: false });

        let caller_stmts = vec![
            Stmt::Assign { lhs: 0, rhs: RValue::New(5) },
            Stmt::Invoke {
                expr: InvokeExpr {
                    kind: InvokeKind::Virtual,
                    method: MethodRef { owner: 1, subsignature: "m()".into() },
                    recv: Some(0),
                    args: vec![],
                },
                result: Some(1),
            },
            Stmt::Return(None),
        ];
        let caller_vars = [var(0, Type::Reference(1)), var(1, Type::Reference(1))]
            .into_iter()
            .collect();
        let caller = MethodIr::new(0, vec![], None, vec![], caller_vars, caller_stmts);

        let callee_vars = [var(2, Type::Reference(1))].into_iter().collect();
        let callee_stmts = vec![Stmt::Return(Some(2))];
        let callee = MethodIr::new(100, vec![], Some(2), vec![2], callee_vars, callee_stmts);

        let mut methods = FxHashMap::default();
        methods.insert(0, caller);
        methods.insert(100, callee);
        let provider = FakeIr(methods);
        let heap = FakeHeap;
        let selector = Insensitive;

        let pa = PointerAnalysis::new(&provider, &h, &heap, &selector);
        let result = pa.solve(&[0]);

        let v1_id = result
            .manager
            .var_id_for_test(Context::empty(), 1, 0)
            .expect("v1 interned");
        assert_eq!(result.pts_of(&Pointer::Var(v1_id)).iter().count(), 1);
        assert!(result.reachable.contains(&(Context::empty(), 100)));
    }
}
