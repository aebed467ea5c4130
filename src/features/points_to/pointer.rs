//! Context-sensitive pointer identities.

use super::context::Context;
use crate::shared::heap::Obj;
use crate::shared::ir::{FieldRef, MethodId, VarId};

/// A local variable under a specific calling context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CsVar {
    pub context: Context,
    pub var: VarId,
    pub method: MethodId,
}

/// An allocated object under its own heap context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CsObj {
    pub context: Context,
    pub obj: Obj,
}

/// Dense handle into `CSManager`'s `CsVar` table — cheap `Copy` key for use
/// in the points-to and pointer-flow maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CsVarId(pub u32);

/// Dense handle into `CSManager`'s `CsObj` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CsObjId(pub u32);

/// A points-to graph node: either a (context-sensitive) variable or a
/// storage location reached through one — instance field, static field, or
/// array element (the Pointer Flow Graph node set).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pointer {
    Var(CsVarId),
    InstanceField(CsObjId, FieldRef),
    StaticField(FieldRef),
    ArrayIndex(CsObjId),
}
