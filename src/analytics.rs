use serde_json::Value;
use wasm_bindgen_futures::spawn_local;

use barentain_core::ids::ValentineId;
use barentain_core::store::{EventRow, RecordStore};

use crate::record_store::shared_store;

pub(crate) const EVENT_ORIGIN_VIEW: &str = "origin_view";
pub(crate) const EVENT_VALENTINE_CREATED: &str = "valentine_created";
pub(crate) const EVENT_RECEIVER_OPENED: &str = "receiver_opened";
pub(crate) const EVENT_ANSWERED_YES: &str = "answered_yes";
pub(crate) const EVENT_ANSWERED_NO: &str = "answered_no";
pub(crate) const EVENT_RESULT_VIEWED: &str = "result_viewed";

// Fire and forget: analytics must never block or break a page.
pub(crate) fn track(
    event_type: &'static str,
    valentine_id: Option<ValentineId>,
    metadata: Option<Value>,
) {
    let store = shared_store();
    let event = EventRow {
        event_type: event_type.to_string(),
        valentine_id,
        metadata,
    };
    spawn_local(async move {
        if let Err(err) = store.append_event(&event).await {
            gloo::console::warn!("analytics event dropped", err.to_string());
        }
    });
}
