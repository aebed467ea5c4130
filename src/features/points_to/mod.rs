//! Context-sensitive points-to analysis.

pub mod context;
pub mod manager;
pub mod pfg;
pub mod pointer;
pub mod solver;

pub use context::{Context, ContextSelector, Insensitive, KCallSiteSensitive, OneObjectSensitive};
pub use manager::CSManager;
pub use pfg::PointerFlowGraph;
pub use pointer::{CsObj, CsObjId, CsVar, CsVarId, Pointer};
pub use solver::{CsCallEdge, PointerAnalysis, PointsToResult, PointsToSet};
