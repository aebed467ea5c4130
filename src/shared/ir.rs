//! Three-address IR surface the CORE consumes.
//!
//! The IR builder itself is out of scope; this module only
//! defines the shapes the analyses read through the `IrProvider` oracle.
//! Layout follows `codegraph-ir`'s `shared/models` split (small, independently
//! testable value types: `Span`-style plain structs, no behavior beyond
//! constructors and predicates) generalized to the typed, statement-indexed
//! method IR the spec describes.

use rustc_hash::FxHashMap;
use std::fmt;

/// Identifier of a local variable within one method's IR. Not globally
/// unique across methods — always interpreted relative to a `MethodId`.
pub type VarId = u32;

/// Identifier of a statement within one method's IR (index into
/// `MethodIr::stmts`).
pub type StmtId = usize;

/// Opaque identifier for a declared class/interface, assigned by the class
/// hierarchy oracle.
pub type ClassId = u32;

/// Opaque identifier for a method declaration, assigned by the IR provider.
pub type MethodId = u32;

/// Opaque identifier for an allocation site (`x = new T()`), assigned by the
/// IR provider; the heap model maps these to `Obj`s.
pub type AllocSiteId = u32;

/// Primitive integer-ish types plus a catch-all reference marker.
///
/// `canHoldInt` is true exactly for the five integer-holding
/// primitives; everything else (`Reference`) cannot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Byte,
    Short,
    Int,
    Char,
    Boolean,
    /// Any reference type (class, interface, array). Opaque to the CORE
    /// beyond the class-hierarchy queries it supports.
    Reference(ClassId),
}

impl Type {
    /// `canHoldInt(v)`.
    #[inline]
    pub fn can_hold_int(self) -> bool {
        matches!(
            self,
            Type::Byte | Type::Short | Type::Int | Type::Char | Type::Boolean
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable {
    pub id: VarId,
    pub name: String,
    pub ty: Type,
}

impl Variable {
    #[inline]
    pub fn can_hold_int(&self) -> bool {
        self.ty.can_hold_int()
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Binary operator, unifying arithmetic, bitwise, shift, and comparison —
/// `evaluate` dispatches on this single enum for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    UShr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    #[inline]
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }
}

/// Right-hand side of an `Assign` statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RValue {
    Var(VarId),
    IntConst(i32),
    Binary(BinOp, VarId, VarId),
    /// Allocation site; type/side effects are opaque to CP, but it is not
    /// side-effect-free for dead-assignment purposes.
    New(AllocSiteId),
    Cast(VarId),
}

/// A field reference: owning (declared) class plus name. Two `FieldRef`s
/// are the same field iff both components match — no field-shadowing
/// resolution is modeled (out of scope: that belongs to the IR builder).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub owner: ClassId,
    pub name: String,
}

/// Declared call target: class the method is declared on plus subsignature.
/// Two `MethodRef`s referring to methods with identical (name, param types,
/// return type) but different owners are distinct — dispatch resolves
/// across hierarchy separately.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct MethodRef {
    pub owner: ClassId,
    pub subsignature: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvokeKind {
    Static,
    Special,
    Virtual,
    Interface,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InvokeExpr {
    pub kind: InvokeKind,
    pub method: MethodRef,
    /// Receiver variable; always `None` for `Static`.
    pub recv: Option<VarId>,
    pub args: Vec<VarId>,
}

/// Classification of statements: assignment, invoke,
/// instance/static field load/store, array load/store, if, switch, other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Stmt {
    Assign {
        lhs: VarId,
        rhs: RValue,
    },
    Invoke {
        expr: InvokeExpr,
        /// `x = invoke(...)`; `None` when the call's result is discarded.
        result: Option<VarId>,
    },
    LoadField {
        lhs: VarId,
        base: VarId,
        field: FieldRef,
    },
    StoreField {
        base: VarId,
        field: FieldRef,
        rhs: VarId,
    },
    LoadStaticField {
        lhs: VarId,
        field: FieldRef,
    },
    StoreStaticField {
        field: FieldRef,
        rhs: VarId,
    },
    LoadArray {
        lhs: VarId,
        base: VarId,
        index: VarId,
    },
    StoreArray {
        base: VarId,
        index: VarId,
        rhs: VarId,
    },
    If {
        op: BinOp,
        lhs: VarId,
        rhs: VarId,
        target_true: StmtId,
        target_false: StmtId,
    },
    Switch {
        selector: VarId,
        cases: Vec<(i32, StmtId)>,
        default: StmtId,
    },
    Goto(StmtId),
    Return(Option<VarId>),
    /// Anything else the IR exposes that has no dataflow significance here
    /// (labels, monitor enter/exit, nops).
    Other,
}

impl Stmt {
    /// Side-effect classification used by the dead-assignment pass:
    /// every `Stmt` other than `Assign` is never itself
    /// the dead-assignment candidate, so this only matters for the RHS of
    /// an `Assign` — see `RValue::has_no_side_effect`.
    pub fn lhs_var(&self) -> Option<VarId> {
        match self {
            Stmt::Assign { lhs, .. } => Some(*lhs),
            Stmt::Invoke { result, .. } => *result,
            Stmt::LoadField { lhs, .. } => Some(*lhs),
            Stmt::LoadStaticField { lhs, .. } => Some(*lhs),
            Stmt::LoadArray { lhs, .. } => Some(*lhs),
            _ => None,
        }
    }
}

impl RValue {
    /// `hasNoSideEffect`: false for allocations, casts,
    /// field/array access (those are not `RValue` here, they are their own
    /// `Stmt` kinds, which the dead-assignment pass already excludes by
    /// only considering `Assign`), and DIV/REM arithmetic.
    pub fn has_no_side_effect(&self) -> bool {
        match self {
            RValue::New(_) | RValue::Cast(_) => false,
            RValue::Binary(op, _, _) => !matches!(op, BinOp::Div | BinOp::Rem),
            RValue::Var(_) | RValue::IntConst(_) => true,
        }
    }
}

/// A method's IR: typed locals, a flat statement array, and the two
/// designated boundary nodes (`entry`, `exit`). Control flow is implicit in
/// statement order plus the branch targets `If`/`Switch`/`Goto` carry —
/// mirrors how `codegraph-ir`'s `CFGBlock` records successors directly on
/// the block rather than through a side table.
#[derive(Debug, Clone)]
pub struct MethodIr {
    pub id: MethodId,
    pub params: Vec<VarId>,
    pub this_var: Option<VarId>,
    pub return_vars: Vec<VarId>,
    pub vars: FxHashMap<VarId, Variable>,
    pub stmts: Vec<Stmt>,
    /// Entry statement index into `stmts`.
    pub entry: StmtId,
    /// Synthetic exit node id — one past the last real statement.
    pub exit: StmtId,
}

/// CFG edge label, used by the unreachable-code pass to
/// fold `If`/`Switch` branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeLabel {
    Normal,
    IfTrue,
    IfFalse,
    Case(i32),
    Default,
}

impl MethodIr {
    pub fn new(
        id: MethodId,
        params: Vec<VarId>,
        this_var: Option<VarId>,
        return_vars: Vec<VarId>,
        vars: FxHashMap<VarId, Variable>,
        stmts: Vec<Stmt>,
    ) -> Self {
        let exit = stmts.len();
        Self {
            id,
            params,
            this_var,
            return_vars,
            vars,
            stmts,
            entry: 0,
            exit,
        }
    }

    #[inline]
    pub fn var(&self, id: VarId) -> &Variable {
        self.vars.get(&id).expect("unknown variable id")
    }

    /// All statement ids, entry and exit included, in index order.
    pub fn stmt_ids(&self) -> impl Iterator<Item = StmtId> {
        0..self.stmts.len()
    }

    /// CFG successors of a statement: normal
    /// fallthrough for everything except explicit control transfers.
    pub fn successors(&self, stmt: StmtId) -> Vec<(EdgeLabel, StmtId)> {
        if stmt == self.exit {
            return Vec::new();
        }
        match &self.stmts[stmt] {
            Stmt::If {
                target_true,
                target_false,
                ..
            } => vec![
                (EdgeLabel::IfTrue, *target_true),
                (EdgeLabel::IfFalse, *target_false),
            ],
            Stmt::Switch { cases, default, .. } => {
                let mut out: Vec<_> = cases
                    .iter()
                    .map(|(c, target)| (EdgeLabel::Case(*c), *target))
                    .collect();
                out.push((EdgeLabel::Default, *default));
                out
            }
            Stmt::Goto(target) => vec![(EdgeLabel::Normal, *target)],
            Stmt::Return(_) => vec![(EdgeLabel::Normal, self.exit)],
            _ => {
                let next = stmt + 1;
                vec![(EdgeLabel::Normal, next)]
            }
        }
    }

    /// Plain predecessor map, derived from `successors` (used by the
    /// backward liveness analysis).
    pub fn predecessors(&self) -> FxHashMap<StmtId, Vec<StmtId>> {
        let mut preds: FxHashMap<StmtId, Vec<StmtId>> = FxHashMap::default();
        for s in self.stmt_ids() {
            for (_, t) in self.successors(s) {
                preds.entry(t).or_default().push(s);
            }
        }
        preds
    }
}

/// Oracle: method identity → its IR. Implemented elsewhere (IR builder is
/// out of scope); the CORE only ever calls through this trait.
pub trait IrProvider {
    fn ir(&self, method: MethodId) -> &MethodIr;
}
