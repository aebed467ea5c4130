//! Interprocedural constant propagation: the same
//! intraprocedural transfer from `constant_propagation`, driven over an
//! interprocedural control-flow graph built from an already-solved
//! points-to result instead of one method's local CFG.
//!
//! Grounded in `codegraph-ir`'s `andersen_solver.rs` worklist shape, reused
//! here for a second, differently-shaped fixed point: nodes are
//! `(Context, MethodId, StmtId)` triples, and edges come in four kinds
//! (Normal/Call/CallToReturn/Return) instead of one.
//! Field, static-field, and array flows are modeled the same way a field
//! store in the points-to solver drives a field load: as
//! direct store→load edges, computed once up front from the fixed
//! points-to sets rather than tracked as mutable heap state.

use super::alias::{cs_var_pts, may_alias};
use crate::features::constant_propagation::evaluate;
use crate::features::lattice::{meet_into, CPFact, Value};
use crate::features::points_to::{Context, PointsToResult};
use crate::shared::ir::{FieldRef, IrProvider, MethodId, Stmt, StmtId, VarId};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

/// One interprocedural CFG node: a statement reached under a specific
/// calling context.
pub type Node = (Context, MethodId, StmtId);

#[derive(Debug, Clone)]
enum Edge {
    /// Ordinary intraprocedural successor.
    Normal { from: Node },
    /// Caller call-site → callee entry: projects actual arguments onto
    /// formal parameters, discarding everything else (a fresh callee
    /// invocation starts from its own boundary, not the caller's facts).
    Call { from: Node, args: Vec<VarId> },
    /// Call-site → its own local successor: passes the caller's facts
    /// through unchanged except the call's own result, which arrives only
    /// via a `Return` edge.
    CallToReturn { from: Node, result: Option<VarId> },
    /// Callee `Return` statement → caller's post-call successor: carries
    /// only the returned value, bound to the call's result variable.
    Return {
        from: Node,
        returned_var: Option<VarId>,
        result: Option<VarId>,
    },
    /// A field/static-field/array store that may be read back through
    /// `lhs` at the target load statement.
    FieldFlow { from: Node, rhs: VarId, lhs: VarId },
}

impl Edge {
    fn from_node(&self) -> &Node {
        match self {
            Edge::Normal { from }
            | Edge::Call { from, .. }
            | Edge::CallToReturn { from, .. }
            | Edge::Return { from, .. }
            | Edge::FieldFlow { from, .. } => from,
        }
    }

    fn contribute(&self, ir: &dyn IrProvider, target: &Node, out_facts: &FxHashMap<Node, CPFact>) -> CPFact {
        let source_fact = out_facts.get(self.from_node()).cloned().unwrap_or_default();
        match self {
            Edge::Normal { .. } => source_fact,
            Edge::CallToReturn { result, .. } => {
                let mut fact = source_fact;
                if let Some(r) = result {
                    fact.update(*r, Value::Undef);
                }
                fact
            }
            Edge::Call { args, .. } => {
                let callee_ir = ir.ir(target.1);
                let mut fact = CPFact::new();
                for (&formal, &actual) in callee_ir.params.iter().zip(args.iter()) {
                    fact.update(formal, source_fact.get(actual));
                }
                fact
            }
            Edge::Return { returned_var, result, .. } => {
                let mut fact = CPFact::new();
                if let (Some(rv), Some(res)) = (returned_var, result) {
                    fact.update(*res, source_fact.get(*rv));
                }
                fact
            }
            Edge::FieldFlow { rhs, lhs, .. } => {
                let mut fact = CPFact::new();
                fact.update(*lhs, source_fact.get(*rhs));
                fact
            }
        }
    }
}

/// Output: the per-node in/out facts of the interprocedural fixed point.
pub struct InterprocResult {
    in_facts: FxHashMap<Node, CPFact>,
    out_facts: FxHashMap<Node, CPFact>,
}

impl InterprocResult {
    pub fn in_fact(&self, ctx: &Context, method: MethodId, stmt: StmtId) -> CPFact {
        self.in_facts.get(&(ctx.clone(), method, stmt)).cloned().unwrap_or_default()
    }

    pub fn out_fact(&self, ctx: &Context, method: MethodId, stmt: StmtId) -> CPFact {
        self.out_facts.get(&(ctx.clone(), method, stmt)).cloned().unwrap_or_default()
    }
}

/// Run interprocedural constant propagation over every method the points-to
/// analysis found reachable, seeding `entries` with the NAC boundary
/// and everything else purely from call/return/field edges.
pub fn analyze(ir: &dyn IrProvider, pts: &PointsToResult, entries: &[MethodId]) -> InterprocResult {
    let edges_into = build_edges(ir, pts);
    let mut edges_out: FxHashMap<Node, Vec<Node>> = FxHashMap::default();
    for (target, edges) in &edges_into {
        for edge in edges {
            edges_out.entry(edge.from_node().clone()).or_default().push(target.clone());
        }
    }

    let mut in_facts: FxHashMap<Node, CPFact> = FxHashMap::default();
    let mut out_facts: FxHashMap<Node, CPFact> = FxHashMap::default();
    let mut worklist: VecDeque<Node> = VecDeque::new();

    for &m in entries {
        let ctx = Context::empty();
        let method_ir = ir.ir(m);
        let mut boundary = CPFact::new();
        for &p in &method_ir.params {
            if method_ir.var(p).can_hold_int() {
                boundary.update(p, Value::Nac);
            }
        }
        in_facts.insert((ctx, m, method_ir.entry), boundary);
    }
    for (ctx, method) in &pts.reachable {
        let method_ir = ir.ir(*method);
        for s in method_ir.stmt_ids() {
            worklist.push_back((ctx.clone(), *method, s));
        }
    }

    while let Some(node) = worklist.pop_front() {
        let merged = match edges_into.get(&node) {
            Some(edges) => {
                let mut merged = CPFact::new();
                for edge in edges {
                    let contribution = edge.contribute(ir, &node, &out_facts);
                    meet_into(&contribution, &mut merged);
                }
                merged
            }
            None => CPFact::new(),
        };
        let in_fact = in_facts.entry(node.clone()).or_default();
        meet_into(&merged, in_fact);
        let in_snapshot = in_fact.clone();

        let mut out_fact = out_facts.get(&node).cloned().unwrap_or_default();
        let changed = transfer(ir, &node, &in_snapshot, &mut out_fact);
        if changed || !out_facts.contains_key(&node) {
            out_facts.insert(node.clone(), out_fact);
            if let Some(succs) = edges_out.get(&node) {
                for succ in succs {
                    worklist.push_back(succ.clone());
                }
            }
        }
    }

    InterprocResult { in_facts, out_facts }
}

/// Per-statement transfer, identical to intraprocedural CP's: `Assign`
/// overwrites its LHS if it can hold an int, everything else (including
/// `Invoke`, field/array/static access, and control-flow statements) is an
/// identity transfer — the interesting interprocedural effects live in the
/// edges, not here.
fn transfer(ir: &dyn IrProvider, node: &Node, in_fact: &CPFact, out_fact: &mut CPFact) -> bool {
    let method_ir = ir.ir(node.1);
    let mut changed = out_fact.copy_from(in_fact);
    let stale: Vec<VarId> = out_fact.keys().filter(|v| in_fact.get(*v) == Value::Undef).collect();
    for v in stale {
        if out_fact.update(v, Value::Undef) {
            changed = true;
        }
    }
    if let Stmt::Assign { lhs, rhs } = &method_ir.stmts[node.2] {
        if method_ir.var(*lhs).can_hold_int() {
            let value = evaluate(rhs, in_fact, method_ir);
            if out_fact.update(*lhs, value) {
                changed = true;
            }
        }
    }
    changed
}

fn build_edges(ir: &dyn IrProvider, pts: &PointsToResult) -> FxHashMap<Node, Vec<Edge>> {
    let mut edges_into: FxHashMap<Node, Vec<Edge>> = FxHashMap::default();
    let reachable: Vec<(Context, MethodId)> = pts.reachable.iter().cloned().collect();

    for (ctx, method) in &reachable {
        let method_ir = ir.ir(*method);
        for s in method_ir.stmt_ids() {
            if let Stmt::Invoke { expr, result } = &method_ir.stmts[s] {
                for call_edge in pts
                    .call_edges
                    .iter()
                    .filter(|e| &e.caller.0 == ctx && e.caller.1 == *method && e.call_site == s)
                {
                    let (callee_ctx, callee_method) = call_edge.callee.clone();
                    let callee_ir = ir.ir(callee_method);
                    edges_into
                        .entry((callee_ctx.clone(), callee_method, callee_ir.entry))
                        .or_default()
                        .push(Edge::Call {
                            from: (ctx.clone(), *method, s),
                            args: expr.args.clone(),
                        });
                    for r in callee_ir.stmt_ids() {
                        if let Stmt::Return(returned_var) = &callee_ir.stmts[r] {
                            for (_, succ) in method_ir.successors(s) {
                                if succ == method_ir.exit {
                                    continue;
                                }
                                edges_into.entry((ctx.clone(), *method, succ)).or_default().push(
                                    Edge::Return {
                                        from: (callee_ctx.clone(), callee_method, r),
                                        returned_var: *returned_var,
                                        result: *result,
                                    },
                                );
                            }
                        }
                    }
                }
                for (_, succ) in method_ir.successors(s) {
                    if succ == method_ir.exit {
                        continue;
                    }
                    edges_into
                        .entry((ctx.clone(), *method, succ))
                        .or_default()
                        .push(Edge::CallToReturn { from: (ctx.clone(), *method, s), result: *result });
                }
            } else {
                for (_, succ) in method_ir.successors(s) {
                    if succ == method_ir.exit {
                        continue;
                    }
                    edges_into
                        .entry((ctx.clone(), *method, succ))
                        .or_default()
                        .push(Edge::Normal { from: (ctx.clone(), *method, s) });
                }
            }
        }
    }

    add_field_flow_edges(ir, pts, &reachable, &mut edges_into);
    edges_into
}

struct InstanceAccess {
    node: Node,
    base: VarId,
    field: FieldRef,
    var: VarId,
}

/// Adds `FieldFlow` edges for instance fields (aliased via points-to sets),
/// static fields (shared by name, no aliasing needed), and arrays
/// (array-smashing: any store to a possibly-same array may reach any load
/// from it, ignoring the index).
fn add_field_flow_edges(
    ir: &dyn IrProvider,
    pts: &PointsToResult,
    reachable: &[(Context, MethodId)],
    edges_into: &mut FxHashMap<Node, Vec<Edge>>,
) {
    let mut inst_stores = Vec::new();
    let mut inst_loads = Vec::new();
    let mut static_stores: FxHashMap<FieldRef, Vec<(Node, VarId)>> = FxHashMap::default();
    let mut static_loads: FxHashMap<FieldRef, Vec<(Node, VarId)>> = FxHashMap::default();
    let mut arr_stores = Vec::new();
    let mut arr_loads = Vec::new();

    for (ctx, method) in reachable {
        let method_ir = ir.ir(*method);
        for s in method_ir.stmt_ids() {
            match &method_ir.stmts[s] {
                Stmt::StoreField { base, field, rhs } => inst_stores.push(InstanceAccess {
                    node: (ctx.clone(), *method, s),
                    base: *base,
                    field: field.clone(),
                    var: *rhs,
                }),
                Stmt::LoadField { lhs, base, field } => inst_loads.push(InstanceAccess {
                    node: (ctx.clone(), *method, s),
                    base: *base,
                    field: field.clone(),
                    var: *lhs,
                }),
                Stmt::StoreStaticField { field, rhs } => {
                    static_stores.entry(field.clone()).or_default().push(((ctx.clone(), *method, s), *rhs));
                }
                Stmt::LoadStaticField { lhs, field } => {
                    static_loads.entry(field.clone()).or_default().push(((ctx.clone(), *method, s), *lhs));
                }
                Stmt::StoreArray { base, rhs, .. } => {
                    arr_stores.push(((ctx.clone(), *method, s), *base, *rhs));
                }
                Stmt::LoadArray { lhs, base, .. } => {
                    arr_loads.push(((ctx.clone(), *method, s), *base, *lhs));
                }
                _ => {}
            }
        }
    }

    for store in &inst_stores {
        let store_pts = cs_var_pts(pts, &store.node.0, store.node.1, store.base);
        if store_pts.is_empty() {
            continue;
        }
        for load in &inst_loads {
            if load.field != store.field {
                continue;
            }
            let load_pts = cs_var_pts(pts, &load.node.0, load.node.1, load.base);
            if may_alias(&store_pts, &load_pts) {
                edges_into.entry(load.node.clone()).or_default().push(Edge::FieldFlow {
                    from: store.node.clone(),
                    rhs: store.var,
                    lhs: load.var,
                });
            }
        }
    }

    for (field, stores) in &static_stores {
        let Some(loads) = static_loads.get(field) else { continue };
        for &(ref store_node, rhs) in stores {
            for &(ref load_node, lhs) in loads {
                edges_into
                    .entry(load_node.clone())
                    .or_default()
                    .push(Edge::FieldFlow { from: store_node.clone(), rhs, lhs });
            }
        }
    }

    for (store_node, store_base, rhs) in &arr_stores {
        let store_pts = cs_var_pts(pts, &store_node.0, store_node.1, *store_base);
        if store_pts.is_empty() {
            continue;
        }
        for (load_node, load_base, lhs) in &arr_loads {
            let load_pts = cs_var_pts(pts, &load_node.0, load_node.1, *load_base);
            if may_alias(&store_pts, &load_pts) {
                edges_into.entry(load_node.clone()).or_default().push(Edge::FieldFlow {
                    from: store_node.clone(),
                    rhs: *rhs,
                    lhs: *lhs,
                });
            }
        }
    }
}
