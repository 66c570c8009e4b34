use std::fmt;

use crate::ids::{ResultToken, SenderToken, ValentineId};
use crate::store::{RecordStore, StoreError};
use crate::valentine::{answer_url, result_url, Answer, NewValentine, ResultView, Valentine};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    Validation(String),
    Store(StoreError),
}

impl ServiceError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ServiceError::Store(err) if err.is_transient())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::Store(StoreError::NotFound))
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Validation(message) => write!(f, "{message}"),
            ServiceError::Store(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        ServiceError::Store(err)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedValentine {
    pub id: ValentineId,
    pub result_token: ResultToken,
    pub sender_token: SenderToken,
    pub answer_url: String,
    pub result_url: String,
}

// Mints the id, the result token and the sender-identity token, then writes
// the valentine and its token as a pair. Callers persist the local sender
// mapping only after this returns Ok.
pub async fn create_valentine<S: RecordStore>(
    store: &S,
    sender_name: Option<&str>,
    receiver_name: &str,
    origin: &str,
) -> Result<CreatedValentine, ServiceError> {
    let receiver_name = receiver_name.trim();
    if receiver_name.is_empty() {
        return Err(ServiceError::Validation(
            "receiver name is required".to_string(),
        ));
    }
    let sender_name = sender_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    let id = ValentineId::random();
    let result_token = ResultToken::random();
    let sender_token = SenderToken::random();

    let row = NewValentine {
        id,
        sender_name,
        receiver_name: receiver_name.to_string(),
        status: crate::valentine::Status::Pending,
        sender_token,
    };
    store.insert_valentine(&row).await?;
    store.insert_result_token(&result_token, &id).await?;

    Ok(CreatedValentine {
        id,
        result_token,
        sender_token,
        answer_url: answer_url(origin, &id),
        result_url: result_url(origin, &result_token),
    })
}

pub async fn fetch_valentine<S: RecordStore>(
    store: &S,
    id: &ValentineId,
) -> Result<Valentine, ServiceError> {
    Ok(store.fetch_valentine(id).await?)
}

// Idempotent: an already-answered valentine reports success without
// mutation, and so does losing the conditional write.
pub async fn submit_answer<S: RecordStore>(
    store: &S,
    id: &ValentineId,
    answer: Answer,
    answered_at: &str,
) -> Result<(), ServiceError> {
    let current = store.fetch_valentine(id).await?;
    if !current.status.is_pending() {
        return Ok(());
    }
    let _won = store
        .answer_if_pending(id, answer.status(), answered_at)
        .await?;
    Ok(())
}

pub async fn fetch_result<S: RecordStore>(
    store: &S,
    token: &ResultToken,
) -> Result<ResultView, ServiceError> {
    let id = store.valentine_for_token(token).await?;
    let valentine = store.fetch_valentine(&id).await?;
    Ok(ResultView {
        valentine_id: id,
        status: valentine.status,
        created_at: valentine.created_at,
        answered_at: valentine.answered_at,
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visitor {
    Sender,
    Receiver,
}

// SENDER only on an exact match of a locally-held token against the
// server-held one; every failure path is RECEIVER.
pub fn classify_visitor(local: Option<&SenderToken>, server: Option<&SenderToken>) -> Visitor {
    match (local, server) {
        (Some(local), Some(server)) if local == server => Visitor::Sender,
        _ => Visitor::Receiver,
    }
}
