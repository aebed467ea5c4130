//! Backward live-variable analysis, feeding the dead-assignment pass.

use crate::features::dataflow::{solve, Analysis, DataflowResult, Direction};
use crate::features::lattice::SetFact;
use crate::shared::ir::{InvokeExpr, MethodIr, Stmt, StmtId, VarId};

pub struct LiveVariables;

impl LiveVariables {
    pub fn new() -> Self {
        LiveVariables
    }

    pub fn analyze(&self, ir: &MethodIr) -> DataflowResult<SetFact<VarId>> {
        solve(self, ir)
    }
}

impl Default for LiveVariables {
    fn default() -> Self {
        Self::new()
    }
}

impl Analysis for LiveVariables {
    type Fact = SetFact<VarId>;

    fn direction(&self) -> Direction {
        Direction::Backward
    }

    /// Nothing is live after the method returns.
    fn boundary_fact(&self, _ir: &MethodIr) -> SetFact<VarId> {
        SetFact::new()
    }

    fn bottom(&self) -> SetFact<VarId> {
        SetFact::new()
    }

    fn meet_into(&self, source: &SetFact<VarId>, target: &mut SetFact<VarId>) -> bool {
        target.union_with(source)
    }

    /// `in = use(s) ∪ (out - def(s))`.
    fn transfer(
        &self,
        stmt: StmtId,
        ir: &MethodIr,
        input: &SetFact<VarId>,
        output: &mut SetFact<VarId>,
    ) -> bool {
        let mut new_in = input.clone();
        if let Some(def) = ir.stmts[stmt].lhs_var() {
            new_in.remove(&def);
        }
        for used in uses(&ir.stmts[stmt]) {
            new_in.insert(used);
        }
        let changed = *output != new_in;
        *output = new_in;
        changed
    }
}

fn uses(stmt: &Stmt) -> Vec<VarId> {
    match stmt {
        Stmt::Assign { rhs, .. } => rhs_uses(rhs),
        Stmt::Invoke { expr, .. } => invoke_uses(expr),
        Stmt::LoadField { base, .. } => vec![*base],
        Stmt::StoreField { base, rhs, .. } => vec![*base, *rhs],
        Stmt::LoadStaticField { .. } => vec![],
        Stmt::StoreStaticField { rhs, .. } => vec![*rhs],
        Stmt::LoadArray { base, index, .. } => vec![*base, *index],
        Stmt::StoreArray { base, index, rhs } => vec![*base, *index, *rhs],
        Stmt::If { lhs, rhs, .. } => vec![*lhs, *rhs],
        Stmt::Switch { selector, .. } => vec![*selector],
        Stmt::Goto(_) => vec![],
        Stmt::Return(v) => v.iter().copied().collect(),
        Stmt::Other => vec![],
    }
}

fn rhs_uses(rhs: &crate::shared::ir::RValue) -> Vec<VarId> {
    use crate::shared::ir::RValue;
    match rhs {
        RValue::Var(v) | RValue::Cast(v) => vec![*v],
        RValue::Binary(_, l, r) => vec![*l, *r],
        RValue::IntConst(_) | RValue::New(_) => vec![],
    }
}

fn invoke_uses(expr: &InvokeExpr) -> Vec<VarId> {
    let mut vars: Vec<VarId> = expr.recv.into_iter().collect();
    vars.extend(expr.args.iter().copied());
    vars
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::ir::{RValue, Type, Variable};
    use rustc_hash::FxHashMap;

    fn ir_of(stmts: Vec<Stmt>, var_ids: &[VarId]) -> MethodIr {
        let vars: FxHashMap<VarId, Variable> = var_ids
            .iter()
            .map(|&id| {
                (
                    id,
                    Variable {
                        id,
                        name: format!("v{id}"),
                        ty: Type::Int,
                    },
                )
            })
            .collect();
        MethodIr::new(0, vec![], None, vec![], vars, stmts)
    }

    #[test]
    fn used_variable_is_live_before_use() {
        // v0 = 1; v1 = v0; return v1
        let stmts = vec![
            Stmt::Assign { lhs: 0, rhs: RValue::IntConst(1) },
            Stmt::Assign { lhs: 1, rhs: RValue::Var(0) },
            Stmt::Return(Some(1)),
        ];
        let ir = ir_of(stmts, &[0, 1]);
        let live = LiveVariables::new().analyze(&ir);
        assert!(live.out_fact(0).contains(&0));
        assert!(!live.out_fact(1).contains(&0));
    }

    #[test]
    fn never_read_assignment_has_empty_live_out() {
        // v0 = 1; return;
        let stmts = vec![
            Stmt::Assign { lhs: 0, rhs: RValue::IntConst(1) },
            Stmt::Return(None),
        ];
        let ir = ir_of(stmts, &[0]);
        let live = LiveVariables::new().analyze(&ir);
        assert!(live.out_fact(0).is_empty());
    }
}
