//! Three-point abstract integer lattice.
//!
//! `Undef ⊑ Const(n) ⊑ Nac`, height 3. Grounded in `codegraph-ir`'s
//! `ConstraintKind`-style tagged enum (`features/points_to/domain/
//! constraint.rs`): a small `Copy` enum with an `as_str`-equivalent and a
//! handful of free constructors, no trait objects.

use std::fmt;

/// Abstract integer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    /// ⊥ — not yet observed.
    Undef,
    /// Exactly this 32-bit signed integer.
    Const(i32),
    /// ⊤ — not a constant.
    Nac,
}

impl Value {
    #[inline]
    pub fn is_undef(self) -> bool {
        matches!(self, Value::Undef)
    }

    #[inline]
    pub fn is_nac(self) -> bool {
        matches!(self, Value::Nac)
    }

    #[inline]
    pub fn is_const(self) -> bool {
        matches!(self, Value::Const(_))
    }

    #[inline]
    pub fn as_const(self) -> Option<i32> {
        match self {
            Value::Const(i) => Some(i),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Undef
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undef => write!(f, "UNDEF"),
            Value::Const(i) => write!(f, "{}", i),
            Value::Nac => write!(f, "NAC"),
        }
    }
}

/// Meet (⊓):
/// - `NAC ⊓ x = NAC`
/// - `UNDEF ⊓ x = x`
/// - `CONST(a) ⊓ CONST(b) = CONST(a)` if `a == b`, else `NAC`
///
/// Commutative, associative, idempotent.
#[inline]
pub fn meet(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Nac, _) | (_, Value::Nac) => Value::Nac,
        (Value::Undef, x) | (x, Value::Undef) => x,
        (Value::Const(x), Value::Const(y)) => {
            if x == y {
                Value::Const(x)
            } else {
                Value::Nac
            }
        }
    }
}
