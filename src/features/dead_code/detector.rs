//! Dead-code detection: unreachable-code pass plus
//! dead-assignment pass, unioned into a single set of dead statement ids.

use super::liveness::LiveVariables;
use crate::features::constant_propagation::{evaluate_condition, ConstantPropagation};
use crate::features::dataflow::DataflowResult;
use crate::features::lattice::{CPFact, SetFact};
use crate::shared::ir::{MethodIr, Stmt, StmtId};
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;

/// Result of running both dead-code passes over one method.
#[derive(Debug, Clone, Default)]
pub struct DeadCodeResult {
    pub unreachable: FxHashSet<StmtId>,
    pub dead_assignments: FxHashSet<StmtId>,
}

impl DeadCodeResult {
    /// Every dead statement id, ordered by statement index — the order
    /// any reporting code should iterate in to produce stable output.
    pub fn all(&self) -> BTreeSet<StmtId> {
        self.unreachable
            .union(&self.dead_assignments)
            .copied()
            .collect()
    }
}

/// Run constant propagation and liveness, then both dead-code passes.
/// Reuses the CP result to fold `If`/`Switch` branches with constant
/// conditions — the stronger unreachable-code form, rather than plain
/// CFG reachability alone.
pub fn detect_dead_code(ir: &MethodIr) -> DeadCodeResult {
    let cp = ConstantPropagation::new().analyze(ir);
    let liveness = LiveVariables::new().analyze(ir);
    DeadCodeResult {
        unreachable: unreachable_code(ir, &cp),
        dead_assignments: dead_assignments(ir, &liveness),
    }
}

/// Three traversals from `entry` — plain CFG, `If`-folded only, and
/// `Switch`-folded only — intersected into the final reachable set,
/// rather than unioning the dead sets each traversal would report on its own.
fn unreachable_code(ir: &MethodIr, cp: &DataflowResult<CPFact>) -> FxHashSet<StmtId> {
    let plain = traverse(ir, cp, false, false);
    let if_folded = traverse(ir, cp, true, false);
    let switch_folded = traverse(ir, cp, false, true);
    let reachable: FxHashSet<StmtId> = plain
        .intersection(&if_folded)
        .copied()
        .collect::<FxHashSet<_>>()
        .intersection(&switch_folded)
        .copied()
        .collect();
    ir.stmt_ids().filter(|s| !reachable.contains(s)).collect()
}

fn traverse(ir: &MethodIr, cp: &DataflowResult<CPFact>, fold_if: bool, fold_switch: bool) -> FxHashSet<StmtId> {
    let mut reachable: FxHashSet<StmtId> = FxHashSet::default();
    let mut stack = vec![ir.entry];
    while let Some(s) = stack.pop() {
        if s == ir.exit || !reachable.insert(s) {
            continue;
        }
        for t in successors_for(s, ir, cp, fold_if, fold_switch) {
            if !reachable.contains(&t) {
                stack.push(t);
            }
        }
    }
    reachable
}

fn successors_for(
    s: StmtId,
    ir: &MethodIr,
    cp: &DataflowResult<CPFact>,
    fold_if: bool,
    fold_switch: bool,
) -> Vec<StmtId> {
    match &ir.stmts[s] {
        Stmt::If { op, lhs, rhs, target_true, target_false } if fold_if => {
            let in_fact = cp.in_fact(s);
            let (lv, rv) = (in_fact.get(*lhs), in_fact.get(*rhs));
            match (lv.as_const(), rv.as_const()) {
                (Some(l), Some(r)) => {
                    let target = if evaluate_condition(*op, l, r) {
                        *target_true
                    } else {
                        *target_false
                    };
                    vec![target]
                }
                _ => vec![*target_true, *target_false],
            }
        }
        Stmt::Switch { selector, cases, default } if fold_switch => {
            let in_fact = cp.in_fact(s);
            match in_fact.get(*selector).as_const() {
                Some(c) => {
                    let target = cases
                        .iter()
                        .find(|(case, _)| *case == c)
                        .map(|(_, t)| *t)
                        .unwrap_or(*default);
                    vec![target]
                }
                None => {
                    let mut out: Vec<StmtId> = cases.iter().map(|(_, t)| *t).collect();
                    out.push(*default);
                    out
                }
            }
        }
        _ => ir.successors(s).into_iter().map(|(_, t)| t).collect(),
    }
}

/// A side-effect-free assignment whose LHS is not live right after it is
/// dead.
fn dead_assignments(
    ir: &MethodIr,
    liveness: &DataflowResult<SetFact<crate::shared::ir::VarId>>,
) -> FxHashSet<StmtId> {
    let mut dead = FxHashSet::default();
    for s in ir.stmt_ids() {
        if let Stmt::Assign { lhs, rhs } = &ir.stmts[s] {
            if rhs.has_no_side_effect() && !liveness.out_fact(s).contains(lhs) {
                dead.insert(s);
            }
        }
    }
    dead
}
