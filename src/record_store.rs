use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use gloo::net::http::{Request, RequestBuilder};
use gloo::timers::future::TimeoutFuture;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use barentain_core::ids::{ResultToken, SenderToken, ValentineId};
use barentain_core::store::{EventRow, RecordStore, StoreError};
use barentain_core::valentine::{NewValentine, Status, Valentine};
use barentain_core::ServiceError;

const VALENTINES_TABLE: &str = "valentines";
const RESULT_TOKENS_TABLE: &str = "result_tokens";
const EVENTS_TABLE: &str = "events";

const VALENTINE_COLUMNS: &str =
    "id,sender_name,receiver_name,status,created_at,answered_at,sender_token";

// Transient failures get two more tries before the error surfaces.
const RETRY_DELAYS_MS: &[u32] = &[400, 800];

pub(crate) struct HttpStore {
    base: String,
    api_key: Option<String>,
}

impl HttpStore {
    pub(crate) fn from_env() -> Self {
        let base = option_env!("BARENTAIN_STORE_BASE")
            .or(option_env!("TRUNK_PUBLIC_BARENTAIN_STORE_BASE"))
            .map(|raw| raw.trim().trim_end_matches('/').to_string())
            .filter(|base| !base.is_empty())
            .unwrap_or_else(same_origin_base);
        let api_key = option_env!("BARENTAIN_STORE_KEY")
            .or(option_env!("TRUNK_PUBLIC_BARENTAIN_STORE_KEY"))
            .map(|raw| raw.trim().to_string())
            .filter(|key| !key.is_empty());
        Self { base, api_key }
    }

    fn collection_url(&self, table: &str) -> String {
        format!("{}/{table}", self.base)
    }

    fn with_headers(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header("accept", "application/json");
        match self.api_key.as_deref() {
            Some(key) => builder
                .header("apikey", key)
                .header("authorization", &format!("Bearer {key}")),
            None => builder,
        }
    }

    async fn fetch_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &str,
    ) -> Result<Vec<T>, StoreError> {
        let url = format!("{}?{query}", self.collection_url(table));
        let response = self
            .with_headers(Request::get(&url))
            .send()
            .await
            .map_err(net_err)?;
        let status = response.status();
        if !(200..300).contains(&status) {
            return Err(status_err(status));
        }
        response
            .json::<Vec<T>>()
            .await
            .map_err(|err| StoreError::Invalid(err.to_string()))
    }

    async fn insert_row<T: Serialize>(&self, table: &str, row: &T) -> Result<(), StoreError> {
        let url = self.collection_url(table);
        let request = self
            .with_headers(Request::post(&url))
            .header("prefer", "return=minimal")
            .json(row)
            .map_err(|err| StoreError::Invalid(err.to_string()))?;
        let response = request.send().await.map_err(net_err)?;
        let status = response.status();
        if !(200..300).contains(&status) {
            return Err(status_err(status));
        }
        Ok(())
    }

    async fn patch_rows<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        query: &str,
        body: &B,
    ) -> Result<Vec<T>, StoreError> {
        let url = format!("{}?{query}", self.collection_url(table));
        let request = self
            .with_headers(Request::patch(&url))
            .header("prefer", "return=representation")
            .json(body)
            .map_err(|err| StoreError::Invalid(err.to_string()))?;
        let response = request.send().await.map_err(net_err)?;
        let status = response.status();
        if !(200..300).contains(&status) {
            return Err(status_err(status));
        }
        response
            .json::<Vec<T>>()
            .await
            .map_err(|err| StoreError::Invalid(err.to_string()))
    }
}

fn same_origin_base() -> String {
    let origin = web_sys::window()
        .and_then(|window| window.location().origin().ok())
        .unwrap_or_default();
    format!("{}/rest/v1", origin.trim_end_matches('/'))
}

fn net_err(err: gloo::net::Error) -> StoreError {
    StoreError::Transient(err.to_string())
}

fn status_err(status: u16) -> StoreError {
    match status {
        404 => StoreError::NotFound,
        408 | 429 => StoreError::Transient(format!("http {status}")),
        500..=599 => StoreError::Transient(format!("http {status}")),
        _ => StoreError::Invalid(format!("http {status}")),
    }
}

#[derive(Serialize)]
struct NewResultTokenRow {
    token: ResultToken,
    valentine_id: ValentineId,
}

#[derive(Deserialize)]
struct SenderTokenRow {
    sender_token: SenderToken,
}

#[derive(Deserialize)]
struct TokenTargetRow {
    valentine_id: ValentineId,
}

#[derive(Deserialize)]
struct TokenRow {
    token: ResultToken,
}

#[derive(Serialize)]
struct AnswerPatch<'a> {
    status: Status,
    answered_at: &'a str,
}

impl RecordStore for HttpStore {
    async fn insert_valentine(&self, row: &NewValentine) -> Result<(), StoreError> {
        self.insert_row(VALENTINES_TABLE, row).await
    }

    async fn insert_result_token(
        &self,
        token: &ResultToken,
        valentine_id: &ValentineId,
    ) -> Result<(), StoreError> {
        let row = NewResultTokenRow {
            token: *token,
            valentine_id: *valentine_id,
        };
        self.insert_row(RESULT_TOKENS_TABLE, &row).await
    }

    async fn fetch_valentine(&self, id: &ValentineId) -> Result<Valentine, StoreError> {
        let query = format!("id=eq.{id}&select={VALENTINE_COLUMNS}&limit=1");
        let rows: Vec<Valentine> = self.fetch_rows(VALENTINES_TABLE, &query).await?;
        rows.into_iter().next().ok_or(StoreError::NotFound)
    }

    async fn fetch_sender_token(&self, id: &ValentineId) -> Result<SenderToken, StoreError> {
        let query = format!("id=eq.{id}&select=sender_token&limit=1");
        let rows: Vec<SenderTokenRow> = self.fetch_rows(VALENTINES_TABLE, &query).await?;
        rows.into_iter()
            .next()
            .map(|row| row.sender_token)
            .ok_or(StoreError::NotFound)
    }

    async fn valentine_for_token(&self, token: &ResultToken) -> Result<ValentineId, StoreError> {
        let query = format!("token=eq.{token}&select=valentine_id&limit=1");
        let rows: Vec<TokenTargetRow> = self.fetch_rows(RESULT_TOKENS_TABLE, &query).await?;
        rows.into_iter()
            .next()
            .map(|row| row.valentine_id)
            .ok_or(StoreError::NotFound)
    }

    async fn result_token_for(&self, id: &ValentineId) -> Result<ResultToken, StoreError> {
        let query = format!("valentine_id=eq.{id}&select=token&limit=1");
        let rows: Vec<TokenRow> = self.fetch_rows(RESULT_TOKENS_TABLE, &query).await?;
        rows.into_iter()
            .next()
            .map(|row| row.token)
            .ok_or(StoreError::NotFound)
    }

    async fn answer_if_pending(
        &self,
        id: &ValentineId,
        status: Status,
        answered_at: &str,
    ) -> Result<bool, StoreError> {
        let query = format!("id=eq.{id}&status=eq.pending");
        let patch = AnswerPatch {
            status,
            answered_at,
        };
        let rows: Vec<Valentine> = self
            .patch_rows(VALENTINES_TABLE, &query, &patch)
            .await?;
        Ok(!rows.is_empty())
    }

    async fn append_event(&self, event: &EventRow) -> Result<(), StoreError> {
        self.insert_row(EVENTS_TABLE, event).await
    }
}

thread_local! {
    static STORE: RefCell<Option<Rc<HttpStore>>> = RefCell::new(None);
}

pub(crate) fn shared_store() -> Rc<HttpStore> {
    STORE.with(|slot| {
        let mut slot = slot.borrow_mut();
        if let Some(store) = slot.as_ref() {
            return store.clone();
        }
        let store = Rc::new(HttpStore::from_env());
        *slot = Some(store.clone());
        store
    })
}

pub(crate) async fn with_retry<T, Fut>(mut op: impl FnMut() -> Fut) -> Result<T, ServiceError>
where
    Fut: Future<Output = Result<T, ServiceError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(err) if err.is_transient() => {
                let Some(delay) = RETRY_DELAYS_MS.get(attempt).copied() else {
                    return Err(err);
                };
                attempt += 1;
                TimeoutFuture::new(delay).await;
            }
            result => return result,
        }
    }
}
