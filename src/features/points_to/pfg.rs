//! Pointer Flow Graph: object-propagation edges plus a separate overlay of
//! taint-transfer edges.
//!
//! Grounded in `codegraph-ir`'s `PointsToGraph` (`features/points_to/
//! infrastructure/points_to_graph.rs`), which keeps taint edges in their
//! own adjacency table rather than tagging entries in the object-edge
//! table, so the taint overlay can be solved as a second pass over the
//! same fixed point without perturbing pointer propagation.

use super::pointer::Pointer;
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Default)]
pub struct PointerFlowGraph {
    object_edges: FxHashMap<Pointer, FxHashSet<Pointer>>,
    taint_edges: FxHashMap<Pointer, FxHashSet<Pointer>>,
}

impl PointerFlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the edge was newly added.
    pub fn add_object_edge(&mut self, from: Pointer, to: Pointer) -> bool {
        self.object_edges.entry(from).or_default().insert(to)
    }

    pub fn add_taint_edge(&mut self, from: Pointer, to: Pointer) -> bool {
        self.taint_edges.entry(from).or_default().insert(to)
    }

    pub fn object_successors(&self, from: &Pointer) -> impl Iterator<Item = &Pointer> {
        self.object_edges
            .get(from)
            .into_iter()
            .flat_map(|s| s.iter())
    }

    pub fn taint_successors(&self, from: &Pointer) -> impl Iterator<Item = &Pointer> {
        self.taint_edges.get(from).into_iter().flat_map(|s| s.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::ir::FieldRef;

    #[test]
    fn object_and_taint_edges_are_independent() {
        let mut pfg = PointerFlowGraph::new();
        let a = Pointer::StaticField(FieldRef { owner: 0, name: "f".into() });
        let b = Pointer::StaticField(FieldRef { owner: 0, name: "g".into() });
        assert!(pfg.add_object_edge(a.clone(), b.clone()));
        assert_eq!(pfg.taint_successors(&a).count(), 0);
        assert!(pfg.add_taint_edge(a.clone(), b.clone()));
        assert_eq!(pfg.object_successors(&a).count(), 1);
        assert_eq!(pfg.taint_successors(&a).count(), 1);
    }
}
