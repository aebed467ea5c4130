//! Intraprocedural constant propagation.

pub mod intra;

pub use intra::{evaluate, evaluate_condition, ConstantPropagation};
