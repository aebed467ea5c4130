//! Intraprocedural constant propagation.
//!
//! Grounded in `codegraph-ir`'s `AndersenSolver` shape (one struct holding
//! the oracle references, a single public `solve`/`analyze` entry point) but
//! instantiated against the generic `dataflow::Analysis` trait instead of
//! a bespoke worklist, since this analysis is a plain forward dataflow over
//! `CPFact`.

use crate::features::dataflow::{solve, Analysis, DataflowResult, Direction};
use crate::features::lattice::{meet_into, CPFact, Value};
use crate::shared::ir::{BinOp, MethodIr, RValue, Stmt, StmtId, VarId};

/// Constant propagation instance for one method. Stateless beyond the
/// method reference; `solve` is re-entrant per method.
pub struct ConstantPropagation;

impl ConstantPropagation {
    pub fn new() -> Self {
        ConstantPropagation
    }

    pub fn analyze(&self, ir: &MethodIr) -> DataflowResult<CPFact> {
        solve(self, ir)
    }
}

impl Default for ConstantPropagation {
    fn default() -> Self {
        Self::new()
    }
}

impl Analysis for ConstantPropagation {
    type Fact = CPFact;

    fn direction(&self) -> Direction {
        Direction::Forward
    }

    /// Boundary fact: every parameter (and `this`, which
    /// cannot hold an int and so is skipped by `can_hold_int`) that can hold
    /// an int starts at NAC; everything else starts absent (UNDEF).
    fn boundary_fact(&self, ir: &MethodIr) -> CPFact {
        let mut fact = CPFact::new();
        for &p in &ir.params {
            if ir.var(p).can_hold_int() {
                fact.update(p, Value::Nac);
            }
        }
        fact
    }

    fn bottom(&self) -> CPFact {
        CPFact::new()
    }

    fn meet_into(&self, source: &CPFact, target: &mut CPFact) -> bool {
        meet_into(source, target)
    }

    /// `transferNode`: `out = in`, then for an `Assign` whose
    /// LHS can hold an int, overwrite `out[lhs]` with the evaluated RHS.
    /// Every other statement kind is an identity transfer.
    fn transfer(&self, stmt: StmtId, ir: &MethodIr, input: &CPFact, output: &mut CPFact) -> bool {
        let mut changed = output.copy_from(input);
        // copy_from only adds/overwrites; entries in `output` that input
        // doesn't have must be dropped for a clean `out = in` reset.
        let stale: Vec<VarId> = output
            .keys()
            .filter(|v| input.get(*v) == Value::Undef)
            .collect();
        for v in stale {
            if output.update(v, Value::Undef) {
                changed = true;
            }
        }

        if let Stmt::Assign { lhs, rhs } = &ir.stmts[stmt] {
            if ir.var(*lhs).can_hold_int() {
                let value = evaluate(rhs, input, ir);
                if output.update(*lhs, value) {
                    changed = true;
                }
            }
        }
        changed
    }
}

/// `evaluate`: RHS → `Value`, relative to an `in`-fact. Variable reads are
/// `in[y]` only if `canHoldInt(y)`; otherwise the variable cannot carry a
/// propagatable constant and the read is NAC.
pub fn evaluate(rhs: &RValue, in_fact: &CPFact, ir: &MethodIr) -> Value {
    match rhs {
        RValue::Var(v) => read_var(*v, in_fact, ir),
        RValue::IntConst(c) => Value::Const(*c),
        RValue::New(_) | RValue::Cast(_) => Value::Nac,
        RValue::Binary(op, l, r) => {
            let lv = read_var(*l, in_fact, ir);
            let rv = read_var(*r, in_fact, ir);
            evaluate_binary(*op, lv, rv, ir)
        }
    }
}

fn read_var(v: VarId, in_fact: &CPFact, ir: &MethodIr) -> Value {
    if ir.var(v).can_hold_int() {
        in_fact.get(v)
    } else {
        Value::Nac
    }
}

/// Evaluate a comparison `BinOp` over two known constants — shared by the
/// unreachable-code pass to fold `If`/`Switch` when the
/// condition is constant.
pub fn evaluate_condition(op: BinOp, l: i32, r: i32) -> bool {
    match op {
        BinOp::Eq => l == r,
        BinOp::Ne => l != r,
        BinOp::Lt => l < r,
        BinOp::Le => l <= r,
        BinOp::Gt => l > r,
        BinOp::Ge => l >= r,
        _ => unreachable!("If conditions are always comparisons"),
    }
}

fn evaluate_binary(op: BinOp, lv: Value, rv: Value, _ir: &MethodIr) -> Value {
    // NAC dominates: if either operand is NAC, the result is NAC
    // regardless of operator — except the by-zero cases
    // below are checked first since they only apply when both are
    // constants.
    if let (Some(l), Some(r)) = (lv.as_const(), rv.as_const()) {
        return match op {
            BinOp::Add => Value::Const(l.wrapping_add(r)),
            BinOp::Sub => Value::Const(l.wrapping_sub(r)),
            BinOp::Mul => Value::Const(l.wrapping_mul(r)),
            BinOp::Div => {
                if r == 0 {
                    Value::Undef
                } else {
                    Value::Const(l.wrapping_div(r))
                }
            }
            BinOp::Rem => {
                if r == 0 {
                    Value::Undef
                } else {
                    Value::Const(l.wrapping_rem(r))
                }
            }
            BinOp::And => Value::Const(l & r),
            BinOp::Or => Value::Const(l | r),
            BinOp::Xor => Value::Const(l ^ r),
            // Shift amounts are masked to the low 5 bits, matching 32-bit
            // shift semantics.
            BinOp::Shl => Value::Const(l.wrapping_shl(r as u32 & 0x1f)),
            BinOp::Shr => Value::Const(l.wrapping_shr(r as u32 & 0x1f)),
            BinOp::UShr => Value::Const(((l as u32).wrapping_shr(r as u32 & 0x1f)) as i32),
            BinOp::Eq => Value::Const((l == r) as i32),
            BinOp::Ne => Value::Const((l != r) as i32),
            BinOp::Lt => Value::Const((l < r) as i32),
            BinOp::Le => Value::Const((l <= r) as i32),
            BinOp::Gt => Value::Const((l > r) as i32),
            BinOp::Ge => Value::Const((l >= r) as i32),
        };
    }

    if lv.is_nac() || rv.is_nac() {
        return Value::Nac;
    }

    // Neither side is NAC and at least one is UNDEF. Comparisons return NAC
    // here rather than UNDEF: an UNDEF operand means "value not yet known",
    // and a boolean folded from that is itself not a safe constant to
    // propagate, whereas an arithmetic result built from an UNDEF operand
    // just stays UNDEF since nothing downstream could use it as a number
    // yet either way.
    if is_comparison(op) {
        Value::Nac
    } else {
        Value::Undef
    }
}

fn is_comparison(op: BinOp) -> bool {
    matches!(op, BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::ir::{Type, Variable};
    use rustc_hash::FxHashMap;

    fn var(id: VarId, ty: Type) -> (VarId, Variable) {
        (
            id,
            Variable {
                id,
                name: format!("v{id}"),
                ty,
            },
        )
    }

    fn method_with(stmts: Vec<Stmt>, params: Vec<VarId>, var_types: Vec<(VarId, Type)>) -> MethodIr {
        let vars: FxHashMap<VarId, Variable> = var_types
            .into_iter()
            .map(|(id, ty)| var(id, ty))
            .collect();
        MethodIr::new(0, params, None, vec![], vars, stmts)
    }

    #[test]
    fn folds_constant_arithmetic() {
        // v0 = 1; v1 = 2; v2 = v0 + v1
        let stmts = vec![
            Stmt::Assign { lhs: 0, rhs: RValue::IntConst(1) },
            Stmt::Assign { lhs: 1, rhs: RValue::IntConst(2) },
            Stmt::Assign { lhs: 2, rhs: RValue::Binary(BinOp::Add, 0, 1) },
        ];
        let ir = method_with(
            stmts,
            vec![],
            vec![(0, Type::Int), (1, Type::Int), (2, Type::Int)],
        );
        let result = ConstantPropagation::new().analyze(&ir);
        assert_eq!(result.out_fact(2).get(2), Value::Const(3));
    }

    #[test]
    fn div_by_zero_is_undef_not_nac() {
        // v0 = 4; v1 = 0; v2 = v0 / v1
        let stmts = vec![
            Stmt::Assign { lhs: 0, rhs: RValue::IntConst(4) },
            Stmt::Assign { lhs: 1, rhs: RValue::IntConst(0) },
            Stmt::Assign { lhs: 2, rhs: RValue::Binary(BinOp::Div, 0, 1) },
        ];
        let ir = method_with(
            stmts,
            vec![],
            vec![(0, Type::Int), (1, Type::Int), (2, Type::Int)],
        );
        let result = ConstantPropagation::new().analyze(&ir);
        assert_eq!(result.out_fact(2).get(2), Value::Undef);
    }

    #[test]
    fn parameter_starts_nac() {
        let stmts = vec![Stmt::Other];
        let ir = method_with(stmts, vec![0], vec![(0, Type::Int)]);
        let result = ConstantPropagation::new().analyze(&ir);
        assert_eq!(result.in_fact(ir.entry).get(0), Value::Nac);
    }

    #[test]
    fn comparison_with_undef_operand_is_nac() {
        // v1 is never assigned (stays UNDEF); v2 = v0 < v1
        let stmts = vec![
            Stmt::Assign { lhs: 0, rhs: RValue::IntConst(1) },
            Stmt::Assign { lhs: 2, rhs: RValue::Binary(BinOp::Lt, 0, 1) },
        ];
        let ir = method_with(
            stmts,
            vec![],
            vec![(0, Type::Int), (1, Type::Int), (2, Type::Int)],
        );
        let result = ConstantPropagation::new().analyze(&ir);
        assert_eq!(result.out_fact(1).get(2), Value::Nac);
    }

    #[test]
    fn arithmetic_with_undef_operand_stays_undef() {
        // v1 is never assigned (stays UNDEF); v2 = v0 + v1
        let stmts = vec![
            Stmt::Assign { lhs: 0, rhs: RValue::IntConst(1) },
            Stmt::Assign { lhs: 2, rhs: RValue::Binary(BinOp::Add, 0, 1) },
        ];
        let ir = method_with(
            stmts,
            vec![],
            vec![(0, Type::Int), (1, Type::Int), (2, Type::Int)],
        );
        let result = ConstantPropagation::new().analyze(&ir);
        assert_eq!(result.out_fact(1).get(2), Value::Undef);
    }

    #[test]
    fn merge_of_differing_constants_is_nac() {
        // if (v0) v1 = 1; else v1 = 2;  -- two paths meeting with different
        // constants for v1 must produce NAC at the join point.
        let stmts = vec![
            Stmt::If { op: BinOp::Eq, lhs: 0, rhs: 0, target_true: 1, target_false: 3 },
            Stmt::Assign { lhs: 1, rhs: RValue::IntConst(1) },
            Stmt::Goto(4),
            Stmt::Assign { lhs: 1, rhs: RValue::IntConst(2) },
            Stmt::Other,
        ];
        let ir = method_with(
            stmts,
            vec![0],
            vec![(0, Type::Boolean), (1, Type::Int)],
        );
        let result = ConstantPropagation::new().analyze(&ir);
        assert_eq!(result.in_fact(4).get(1), Value::Nac);
    }
}
