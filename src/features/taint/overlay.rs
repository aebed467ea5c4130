//! Taint-flow overlay on top of an already-solved points-to result.
//!
//! Grounded in `codegraph-ir`'s `taint.rs`: synthetic source objects
//! deduplicated by `(call site, type)`, propagated through taint-transfer
//! edges layered onto the same pointer flow graph the points-to solver
//! already built, rather than re-running points-to analysis from scratch.

use super::config::{TaintConfig, BASE_INDEX, RESULT_INDEX};
use crate::features::lattice::SetFact;
use crate::features::points_to::{Context, CsVar, Pointer, PointsToResult};
use crate::shared::ir::{ClassId, InvokeExpr, IrProvider, MethodId, Stmt, StmtId, VarId};
use rustc_hash::FxHashMap;
use std::collections::{BTreeSet, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaintObjId(u32);

#[derive(Debug, Default)]
struct TaintObjTable {
    keys: Vec<(StmtId, ClassId)>,
    ids: FxHashMap<(StmtId, ClassId), TaintObjId>,
}

impl TaintObjTable {
    fn intern(&mut self, call_site: StmtId, ty: ClassId) -> TaintObjId {
        if let Some(&id) = self.ids.get(&(call_site, ty)) {
            return id;
        }
        let id = TaintObjId(self.keys.len() as u32);
        self.keys.push((call_site, ty));
        self.ids.insert((call_site, ty), id);
        id
    }

    fn origin(&self, id: TaintObjId) -> (StmtId, ClassId) {
        self.keys[id.0 as usize]
    }
}

/// A witnessed source-to-sink flow. Ordered so results are deterministic
/// regardless of worklist iteration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TaintFlow {
    pub source_call_site: StmtId,
    pub source_type: ClassId,
    pub sink_call_site: StmtId,
    pub sink_param_index: usize,
}

/// Run the taint overlay against an already-solved points-to result. Adds
/// taint-transfer edges to `pts.pfg` as a side effect (they extend, but
/// never alter, the pointer flow graph the points-to fixed point already
/// computed).
pub fn run_taint_analysis(
    pts: &mut PointsToResult,
    ir: &dyn IrProvider,
    config: &TaintConfig,
) -> BTreeSet<TaintFlow> {
    let reachable: Vec<(Context, MethodId)> = pts.reachable.iter().cloned().collect();
    let mut table = TaintObjTable::default();
    let mut overlay: FxHashMap<Pointer, SetFact<TaintObjId>> = FxHashMap::default();
    let mut worklist: VecDeque<(Pointer, SetFact<TaintObjId>)> = VecDeque::new();

    for (ctx, method) in &reachable {
        let method_ir = ir.ir(*method);
        for s in method_ir.stmt_ids() {
            let Stmt::Invoke { expr, result } = &method_ir.stmts[s] else { continue };

            if let Some(result_var) = result {
                if let Some(src) = config.sources.iter().find(|src| src.method == expr.method) {
                    let taint_id = table.intern(s, src.return_type);
                    let ptr = var_ptr(pts, ctx, *method, *result_var);
                    let mut delta = SetFact::new();
                    delta.insert(taint_id);
                    worklist.push_back((ptr, delta));
                }
            }

            for transfer in config.transfers.iter().filter(|t| t.method == expr.method) {
                let from = resolve_slot(pts, ctx, *method, expr, *result, transfer.from_index);
                let to = resolve_slot(pts, ctx, *method, expr, *result, transfer.to_index);
                if let (Some(from_ptr), Some(to_ptr)) = (from, to) {
                    pts.pfg.add_taint_edge(from_ptr, to_ptr);
                }
            }
        }
    }

    while let Some((pointer, delta)) = worklist.pop_front() {
        let entry = overlay.entry(pointer.clone()).or_default();
        let mut diff = SetFact::new();
        for &id in delta.iter() {
            if entry.insert(id) {
                diff.insert(id);
            }
        }
        if diff.is_empty() {
            continue;
        }
        let mut successors: Vec<Pointer> = pts.pfg.object_successors(&pointer).cloned().collect();
        successors.extend(pts.pfg.taint_successors(&pointer).cloned());
        for succ in successors {
            worklist.push_back((succ, diff.clone()));
        }
    }

    collect_sinks(pts, ir, config, &overlay, &table)
}

fn collect_sinks(
    pts: &PointsToResult,
    ir: &dyn IrProvider,
    config: &TaintConfig,
    overlay: &FxHashMap<Pointer, SetFact<TaintObjId>>,
    table: &TaintObjTable,
) -> BTreeSet<TaintFlow> {
    let mut flows = BTreeSet::new();
    for (ctx, method) in &pts.reachable {
        let method = *method;
        let method_ir = ir.ir(method);
        for s in method_ir.stmt_ids() {
            let Stmt::Invoke { expr, .. } = &method_ir.stmts[s] else { continue };
            for sink in &config.sinks {
                if sink.method != expr.method {
                    continue;
                }
                let Some(&arg_var) = expr.args.get(sink.param_index) else { continue };
                let var = CsVar { context: ctx.clone(), var: arg_var, method };
                let Some(var_id) = pts.manager.var_id(&var) else { continue };
                let Some(set) = overlay.get(&Pointer::Var(var_id)) else { continue };
                for &taint_id in set.iter() {
                    let (source_call_site, source_type) = table.origin(taint_id);
                    flows.insert(TaintFlow {
                        source_call_site,
                        source_type,
                        sink_call_site: s,
                        sink_param_index: sink.param_index,
                    });
                }
            }
        }
    }
    flows
}

fn var_ptr(pts: &mut PointsToResult, ctx: &Context, method: MethodId, var: VarId) -> Pointer {
    Pointer::Var(pts.manager.intern_var(CsVar { context: ctx.clone(), var, method }))
}

/// Resolve a transfer's slot index to the pointer it denotes, relative to
/// one call site.
fn resolve_slot(
    pts: &mut PointsToResult,
    ctx: &Context,
    method: MethodId,
    expr: &InvokeExpr,
    result: Option<VarId>,
    index: i32,
) -> Option<Pointer> {
    match index {
        BASE_INDEX => expr.recv.map(|v| var_ptr(pts, ctx, method, v)),
        RESULT_INDEX => result.map(|v| var_ptr(pts, ctx, method, v)),
        i if i >= 0 => expr.args.get(i as usize).map(|&v| var_ptr(pts, ctx, method, v)),
        _ => None,
    }
}
