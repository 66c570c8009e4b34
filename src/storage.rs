use serde::de::DeserializeOwned;
use serde::Serialize;

pub(crate) const RETENTION_MS: f64 = 30.0 * 24.0 * 60.0 * 60.0 * 1000.0;

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok()?
}

pub(crate) fn read_list<T: DeserializeOwned>(key: &str) -> Vec<T> {
    let Some(storage) = local_storage() else {
        return Vec::new();
    };
    let Ok(Some(raw)) = storage.get_item(key) else {
        return Vec::new();
    };
    serde_json::from_str(&raw).unwrap_or_default()
}

pub(crate) fn write_list<T: Serialize>(key: &str, list: &[T]) {
    let Some(storage) = local_storage() else {
        return;
    };
    let Ok(raw) = serde_json::to_string(list) else {
        return;
    };
    if storage.set_item(key, &raw).is_err() {
        gloo::console::warn!("failed to persist", key.to_string());
    }
}

pub(crate) fn now_iso() -> String {
    String::from(js_sys::Date::new_0().to_iso_string())
}

pub(crate) fn now_ms() -> f64 {
    js_sys::Date::now()
}

// Entries with unreadable timestamps count as stale.
pub(crate) fn is_fresh(created_at: &str, now_ms: f64) -> bool {
    let parsed = js_sys::Date::parse(created_at);
    if parsed.is_nan() {
        return false;
    }
    now_ms - parsed <= RETENTION_MS
}
