//! Generic iterative dataflow framework shared by constant propagation and
//! liveness.

pub mod solver;

pub use solver::{solve, Analysis, DataflowResult, Direction};
