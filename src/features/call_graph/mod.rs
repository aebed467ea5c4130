//! Class-hierarchy-analysis call-graph construction.

pub mod cha;

pub use cha::{build_call_graph, resolve, CallEdge, CallGraph};
