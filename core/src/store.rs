use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::ids::{ResultToken, SenderToken, ValentineId};
use crate::valentine::{NewValentine, Status, Valentine};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    NotFound,
    Invalid(String),
    Transient(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound => write!(f, "record not found"),
            StoreError::Invalid(message) => write!(f, "store rejected request: {message}"),
            StoreError::Transient(message) => write!(f, "store unavailable: {message}"),
        }
    }
}

impl std::error::Error for StoreError {}

#[derive(Debug, Clone, Serialize)]
pub struct EventRow {
    pub event_type: String,
    pub valentine_id: Option<ValentineId>,
    pub metadata: Option<Value>,
}

// The external record store. One logical record per call; no call issues
// overlapping writes to the same record.
#[allow(async_fn_in_trait)]
pub trait RecordStore {
    async fn insert_valentine(&self, row: &NewValentine) -> Result<(), StoreError>;

    async fn insert_result_token(
        &self,
        token: &ResultToken,
        valentine_id: &ValentineId,
    ) -> Result<(), StoreError>;

    async fn fetch_valentine(&self, id: &ValentineId) -> Result<Valentine, StoreError>;

    async fn fetch_sender_token(&self, id: &ValentineId) -> Result<SenderToken, StoreError>;

    async fn valentine_for_token(&self, token: &ResultToken) -> Result<ValentineId, StoreError>;

    async fn result_token_for(&self, id: &ValentineId) -> Result<ResultToken, StoreError>;

    // Conditional write: succeeds with `false` when the record was no longer
    // pending at write time.
    async fn answer_if_pending(
        &self,
        id: &ValentineId,
        status: Status,
        answered_at: &str,
    ) -> Result<bool, StoreError>;

    async fn append_event(&self, event: &EventRow) -> Result<(), StoreError>;
}
