//! Class hierarchy oracle.
//!
//! Extraction from source is out of scope; the CORE only consumes the
//! read-only view this trait exposes: `class → {directSubclasses,
//! directSubinterfaces, directImplementors, superClass}` and
//! `class → declaredMethod(subsig)`.

use crate::shared::ir::{ClassId, MethodId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodDecl {
    pub id: MethodId,
    pub owner: ClassId,
    pub is_abstract: bool,
}

pub trait ClassHierarchy {
    fn direct_subclasses(&self, class: ClassId) -> &[ClassId];
    fn direct_subinterfaces(&self, class: ClassId) -> &[ClassId];
    fn direct_implementors(&self, class: ClassId) -> &[ClassId];
    fn super_class(&self, class: ClassId) -> Option<ClassId>;

    /// Method declared directly on `class` matching `subsignature`, if any
    /// — does not walk the hierarchy; `dispatch` does that.
    fn declared_method(&self, class: ClassId, subsignature: &str) -> Option<MethodDecl>;
}

/// `dispatch(cls, subsig)`: the method declared in `cls`
/// matching `subsig` if non-abstract; otherwise recurse to the superclass;
/// `None` if there is no such method anywhere up the chain.
pub fn dispatch(h: &dyn ClassHierarchy, class: ClassId, subsignature: &str) -> Option<MethodDecl> {
    let mut cur = Some(class);
    while let Some(c) = cur {
        if let Some(m) = h.declared_method(c, subsignature) {
            if !m.is_abstract {
                return Some(m);
            }
        }
        cur = h.super_class(c);
    }
    None
}

/// Transitive reflexive closure of {direct subclasses, direct
/// subinterfaces, direct implementors} of `class`, used by virtual/interface
/// resolution. Returned set includes `class` itself.
pub fn transitive_subtypes(h: &dyn ClassHierarchy, class: ClassId) -> Vec<ClassId> {
    let mut seen = vec![class];
    let mut idx = 0;
    while idx < seen.len() {
        let c = seen[idx];
        idx += 1;
        for &next in h
            .direct_subclasses(c)
            .iter()
            .chain(h.direct_subinterfaces(c))
            .chain(h.direct_implementors(c))
        {
            if !seen.contains(&next) {
                seen.push(next);
            }
        }
    }
    seen
}
