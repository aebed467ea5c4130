//! `CPFact` and `SetFact<T>`.
//!
//! Grounded in `codegraph-ir`'s `PointsToGraph`/`SparseBitmap` pattern of
//! wrapping an `FxHashMap`/set behind a small struct with explicit
//! changed-returning mutators, rather than exposing the map directly —
//! the dataflow solver relies on the
//! `bool` return to decide whether to re-enqueue a node.

use super::value::{meet, Value};
use crate::shared::ir::VarId;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

/// Mapping variable → `Value`; an absent key reads as `Value::Undef`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CPFact {
    values: FxHashMap<VarId, Value>,
}

impl CPFact {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absent key ⇒ `Undef`.
    #[inline]
    pub fn get(&self, var: VarId) -> Value {
        self.values.get(&var).copied().unwrap_or(Value::Undef)
    }

    /// Set `var`'s value. Returns whether the fact changed. Setting to
    /// `Undef` removes the entry (keeps the map sparse, and preserves the
    /// "absent ≡ Undef" equality invariant).
    pub fn update(&mut self, var: VarId, value: Value) -> bool {
        if value.is_undef() {
            return self.values.remove(&var).is_some();
        }
        match self.values.insert(var, value) {
            Some(old) => old != value,
            None => true,
        }
    }

    /// Copy every entry of `other` into `self`. Returns whether `self`
    /// changed.
    pub fn copy_from(&mut self, other: &CPFact) -> bool {
        let mut changed = false;
        for (&var, &value) in &other.values {
            if self.update(var, value) {
                changed = true;
            }
        }
        changed
    }

    /// All variables this fact mentions (i.e. excluding ones that are
    /// implicitly `Undef`).
    pub fn keys(&self) -> impl Iterator<Item = VarId> + '_ {
        self.values.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// `meetInto(source, target)`: for every variable appearing
/// in either fact, `target[v] ← source[v] ⊓ target[v]`. Returns whether
/// `target` changed.
pub fn meet_into(source: &CPFact, target: &mut CPFact) -> bool {
    let mut changed = false;
    let vars: BTreeSet<VarId> = source.keys().chain(target.keys()).collect();
    for var in vars {
        let merged = meet(source.get(var), target.get(var));
        if target.update(var, merged) {
            changed = true;
        }
    }
    changed
}

/// A set of `T`, with union/diff and changed-returning mutation — used for
/// live-variable results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetFact<T: std::hash::Hash + Eq + Clone> {
    items: rustc_hash::FxHashSet<T>,
}

impl<T: std::hash::Hash + Eq + Clone> SetFact<T> {
    pub fn new() -> Self {
        Self {
            items: rustc_hash::FxHashSet::default(),
        }
    }

    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    /// Returns whether the item was newly inserted.
    pub fn insert(&mut self, item: T) -> bool {
        self.items.insert(item)
    }

    pub fn remove(&mut self, item: &T) -> bool {
        self.items.remove(item)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Union `other` into `self`, returns whether `self` changed.
    pub fn union_with(&mut self, other: &SetFact<T>) -> bool {
        let mut changed = false;
        for item in &other.items {
            if self.items.insert(item.clone()) {
                changed = true;
            }
        }
        changed
    }

    /// Remove every element of `other` from `self`, returns whether `self`
    /// changed.
    pub fn diff_with(&mut self, other: &SetFact<T>) -> bool {
        let mut changed = false;
        for item in &other.items {
            if self.items.remove(item) {
                changed = true;
            }
        }
        changed
    }
}
