//! Shared oracles and value types consumed across every analysis.
//!
//! Mirrors `codegraph-ir`'s `shared/models` split: small, independently
//! testable data definitions with no feature-specific behavior.

pub mod error;
pub mod heap;
pub mod hierarchy;
pub mod ir;

pub use error::{AnalysisError, Result};
