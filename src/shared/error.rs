//! Crate-wide error type.
//!
//! Grounded in `codegraph-ir`'s `shared/models/error.rs` /
//! `taint_analysis/infrastructure/differential/error.rs` pattern: a single
//! `thiserror`-derived enum per crate, categorized by failure kind, with
//! `#[from]` wrapping for the handful of external error sources we touch
//! (serde_yaml/serde_json when deserializing a taint config).

use thiserror::Error;

/// Errors the CORE can raise.
///
/// Per spec: malformed IR and unknown operator variants are precondition
/// violations (fail fast). Everything else described as "not an error" in
/// the specification (absent CPFact entries, CHA dispatch misses, unknown
/// taint-config methods) is handled in-band and never reaches this type.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A statement's shape violates an invariant the IR is supposed to
    /// guarantee (e.g. a binary operator applied to a non-integer-holding
    /// operand that `canHoldInt` should have filtered out).
    #[error("malformed IR: {0}")]
    MalformedIr(String),

    /// A `BinOp`/statement tag carried a variant the engine does not know
    /// how to interpret (defensive: should be unreachable for a well-typed
    /// `Stmt`/`BinOp` enum, kept for IR providers implemented elsewhere).
    #[error("unknown operator or statement variant: {0}")]
    UnknownVariant(String),

    /// Taint configuration deserialization failed.
    #[error("invalid taint configuration: {0}")]
    TaintConfig(String),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
