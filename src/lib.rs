//! The analytical core of a static-analysis framework:
//! three-address IR types plus four fixed-point engines — intraprocedural
//! constant propagation, dead-code detection, CHA call-graph construction,
//! and context-sensitive points-to analysis with a taint overlay — and an
//! interprocedural constant propagation pass built on top of the
//! points-to result.
//!
//! The IR builder, CFG/ICFG construction, class-hierarchy extraction, heap
//! model, CLI driver, and result serialization are all out of scope; this
//! crate only defines the oracle traits (`shared::ir::IrProvider`,
//! `shared::hierarchy::ClassHierarchy`, `shared::heap::HeapModel`,
//! `features::points_to::ContextSelector`) a host application implements.

pub mod features;
pub mod shared;

pub use shared::{AnalysisError, Result};
