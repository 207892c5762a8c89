//! # Core Domain Entities
//!
//! Defines the data-model entities shared by the Shard-XA subsystems.
//!
//! ## Clusters
//!
//! - **Placement**: `ShardIndex`
//! - **Values**: `Value`, `Row`
//! - **Batch parameters**: `ParamCarrier`, `ParamRow`
//! - **Dispatch**: `SqlCommand`, `SqlBatch`, `ExecOutcome`

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

// =============================================================================
// CLUSTER A: PLACEMENT
// =============================================================================

/// Index of one physical partition (shard).
///
/// u16 supports up to 65536 shards, which is also the width of the XA branch
/// qualifier derived from it.
pub type ShardIndex = u16;

// =============================================================================
// CLUSTER B: VALUES
// =============================================================================

/// A bound value: a predicate operand, a row parameter or a result cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Value {
    /// SQL NULL. Never usable as a route key.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed 64-bit integer.
    Int(i64),
    /// Text.
    Text(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

impl Value {
    /// Check if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Integer view, if this is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Text view, if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Text(v) => write!(f, "'{}'", v),
            Self::Bytes(v) => {
                f.write_str("x'")?;
                for b in v {
                    write!(f, "{:02x}", b)?;
                }
                f.write_str("'")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

/// One result row returned by a shard.
pub type Row = Vec<Value>;

// =============================================================================
// CLUSTER C: BATCH PARAMETERS
// =============================================================================

/// Read access to the named parameters bound for one batch row.
///
/// Map-like carriers (`HashMap`/`BTreeMap` keyed by field name) implement this
/// out of the box. Bean-like carriers (plain structs) implement it by matching
/// the field name and converting the field into a [`Value`].
pub trait ParamCarrier: Send + Sync + fmt::Debug {
    /// Bound value for `field`, or `None` when the carrier has no such field.
    fn param(&self, field: &str) -> Option<Value>;
}

impl ParamCarrier for HashMap<String, Value> {
    fn param(&self, field: &str) -> Option<Value> {
        self.get(field).cloned()
    }
}

impl ParamCarrier for BTreeMap<String, Value> {
    fn param(&self, field: &str) -> Option<Value> {
        self.get(field).cloned()
    }
}

/// Shared handle to one row's parameter carrier.
pub type ParamRow = Arc<dyn ParamCarrier>;

/// Build a map-like parameter row from `(field, value)` pairs.
pub fn param_row<I, K, V>(pairs: I) -> ParamRow
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    let map: BTreeMap<String, Value> = pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect();
    Arc::new(map)
}

// =============================================================================
// CLUSTER D: DISPATCH
// =============================================================================

/// Rendered SQL text plus bound parameters, ready for one shard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SqlCommand {
    /// Dialect-specific SQL text.
    pub sql: String,
    /// Positional parameters.
    pub params: Vec<Value>,
}

impl SqlCommand {
    /// Create a command.
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// Rendered SQL text plus one positional parameter list per batch row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SqlBatch {
    /// Dialect-specific SQL text.
    pub sql: String,
    /// Parameters per row, in sub-batch order.
    pub rows: Vec<Vec<Value>>,
}

/// Result of executing one command on one shard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ExecOutcome {
    /// Rows inserted, updated or deleted.
    pub affected_rows: u64,
    /// Rows returned by a query.
    pub rows: Vec<Row>,
}
