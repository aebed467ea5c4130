//! Taint configuration: sources, sinks, and transfers,
//! loaded from YAML/JSON the way `codegraph-ir`'s `config::mod` loads its
//! analysis configuration — a small serde-derived struct tree, with the
//! loading subsystem itself (file discovery, hot reload) out of scope here.

use crate::shared::ir::MethodRef;
use serde::{Deserialize, Serialize};

/// Sentinel for a transfer's "the receiver" slot.
pub const BASE_INDEX: i32 = -1;
/// Sentinel for a transfer's "the call result" slot.
pub const RESULT_INDEX: i32 = -2;

/// A call to `method` taints its return value, typed as `return_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaintSource {
    pub method: MethodRef,
    pub return_type: crate::shared::ir::ClassId,
}

/// A call to `method` is a sink for its `param_index`-th argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaintSink {
    pub method: MethodRef,
    pub param_index: usize,
}

/// A call to `method` transfers taint from slot `from_index` to slot
/// `to_index`; both may be a non-negative argument index or one of
/// `BASE_INDEX`/`RESULT_INDEX`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaintTransfer {
    pub method: MethodRef,
    pub from_index: i32,
    pub to_index: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaintConfig {
    #[serde(default)]
    pub sources: Vec<TaintSource>,
    #[serde(default)]
    pub sinks: Vec<TaintSink>,
    #[serde(default)]
    pub transfers: Vec<TaintTransfer>,
}

impl TaintConfig {
    pub fn from_yaml(text: &str) -> crate::shared::Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_json(text: &str) -> crate::shared::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
