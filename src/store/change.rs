use serde::{Deserialize, Serialize};

/// The kind of write that produced a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreOp {
    ReplaceAll,
    Upsert,
    Remove,
    Restore,
}

/// Payload delivered to store change listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreChange {
    pub collection: String,
    pub op: StoreOp,
    /// Display form of the affected id, for per-entity writes.
    pub id: Option<String>,
    /// Store revision after the write.
    pub revision: u64,
}
