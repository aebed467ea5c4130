//! Generic worklist dataflow solver, parameterized by direction.
//!
//! Grounded in `codegraph-ir`'s `AndersenSolver::solve_with_worklist`
//! (`features/points_to/infrastructure/andersen_solver.rs`): a `VecDeque`
//! worklist, changed-returning updates driving re-enqueue, and a `solve`
//! entry point that runs to a fixed point and hands back an owned result
//! struct rather than borrowing solver-internal state.
//!
//! Structural assumption (standard for any CFG, enforced by the IR builder,
//! which is out of scope here): the entry node has no incoming edges and
//! the exit node has no outgoing edges, so the boundary fact at the
//! direction's start node is never itself subject to a meet.

use crate::shared::ir::{MethodIr, StmtId};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// A dataflow analysis instance: lattice fact type plus boundary/transfer.
pub trait Analysis {
    type Fact: Clone + PartialEq;

    fn direction(&self) -> Direction;

    /// Fact at the direction's start node (`in[entry]` forward,
    /// `out[exit]` backward).
    fn boundary_fact(&self, ir: &MethodIr) -> Self::Fact;

    /// Bottom element used to initialize interior nodes.
    fn bottom(&self) -> Self::Fact;

    /// `target ← source ⊓ target`; returns whether `target` changed.
    fn meet_into(&self, source: &Self::Fact, target: &mut Self::Fact) -> bool;

    /// Transfer function for one statement. `input` is `in[stmt]` for a
    /// forward analysis or `out[stmt]` for a backward one; `output` is
    /// mutated in place and the return value reports whether it changed.
    fn transfer(
        &self,
        stmt: StmtId,
        ir: &MethodIr,
        input: &Self::Fact,
        output: &mut Self::Fact,
    ) -> bool;
}

/// Per-statement `in`/`out` facts for one method, plus the synthetic exit
/// node's fact (keyed by `MethodIr::exit`).
#[derive(Debug, Clone)]
pub struct DataflowResult<F> {
    pub in_facts: FxHashMap<StmtId, F>,
    pub out_facts: FxHashMap<StmtId, F>,
}

impl<F> DataflowResult<F> {
    pub fn in_fact(&self, stmt: StmtId) -> &F {
        self.in_facts
            .get(&stmt)
            .expect("dataflow result missing in-fact for statement")
    }

    pub fn out_fact(&self, stmt: StmtId) -> &F {
        self.out_facts
            .get(&stmt)
            .expect("dataflow result missing out-fact for statement")
    }
}

pub fn solve<A: Analysis>(analysis: &A, ir: &MethodIr) -> DataflowResult<A::Fact> {
    match analysis.direction() {
        Direction::Forward => solve_forward(analysis, ir),
        Direction::Backward => solve_backward(analysis, ir),
    }
}

fn solve_forward<A: Analysis>(analysis: &A, ir: &MethodIr) -> DataflowResult<A::Fact> {
    let mut in_facts: FxHashMap<StmtId, A::Fact> = FxHashMap::default();
    let mut out_facts: FxHashMap<StmtId, A::Fact> = FxHashMap::default();
    for s in ir.stmt_ids() {
        out_facts.insert(s, analysis.bottom());
    }
    in_facts.insert(ir.entry, analysis.boundary_fact(ir));

    let preds = ir.predecessors();
    let mut worklist: VecDeque<StmtId> = ir.stmt_ids().collect();
    while let Some(s) = worklist.pop_front() {
        if s != ir.entry {
            let mut merged = analysis.bottom();
            for &p in preds.get(&s).map(|v| v.as_slice()).unwrap_or(&[]) {
                let out_p = out_facts.get(&p).cloned().unwrap_or_else(|| analysis.bottom());
                analysis.meet_into(&out_p, &mut merged);
            }
            in_facts.insert(s, merged);
        }

        let in_fact = in_facts.get(&s).cloned().unwrap_or_else(|| analysis.bottom());
        let mut out_fact = out_facts.get(&s).cloned().unwrap_or_else(|| analysis.bottom());
        let changed = analysis.transfer(s, ir, &in_fact, &mut out_fact);
        if changed {
            out_facts.insert(s, out_fact);
            for (_, succ) in ir.successors(s) {
                if succ != ir.exit {
                    worklist.push_back(succ);
                }
            }
        }
    }

    let mut exit_in = analysis.bottom();
    for &p in preds.get(&ir.exit).map(|v| v.as_slice()).unwrap_or(&[]) {
        let out_p = out_facts.get(&p).cloned().unwrap_or_else(|| analysis.bottom());
        analysis.meet_into(&out_p, &mut exit_in);
    }
    in_facts.insert(ir.exit, exit_in.clone());
    out_facts.insert(ir.exit, exit_in);

    DataflowResult { in_facts, out_facts }
}

fn solve_backward<A: Analysis>(analysis: &A, ir: &MethodIr) -> DataflowResult<A::Fact> {
    let mut in_facts: FxHashMap<StmtId, A::Fact> = FxHashMap::default();
    let mut out_facts: FxHashMap<StmtId, A::Fact> = FxHashMap::default();
    for s in ir.stmt_ids() {
        in_facts.insert(s, analysis.bottom());
    }
    let boundary = analysis.boundary_fact(ir);
    in_facts.insert(ir.exit, boundary.clone());
    out_facts.insert(ir.exit, boundary);

    let preds = ir.predecessors();
    let mut worklist: VecDeque<StmtId> = ir.stmt_ids().collect();
    while let Some(s) = worklist.pop_front() {
        let mut merged = analysis.bottom();
        for (_, succ) in ir.successors(s) {
            let in_succ = in_facts.get(&succ).cloned().unwrap_or_else(|| analysis.bottom());
            analysis.meet_into(&in_succ, &mut merged);
        }
        out_facts.insert(s, merged.clone());

        let mut in_fact = in_facts.get(&s).cloned().unwrap_or_else(|| analysis.bottom());
        let changed = analysis.transfer(s, ir, &merged, &mut in_fact);
        if changed {
            in_facts.insert(s, in_fact);
            for &p in preds.get(&s).map(|v| v.as_slice()).unwrap_or(&[]) {
                worklist.push_back(p);
            }
        }
    }

    DataflowResult { in_facts, out_facts }
}
