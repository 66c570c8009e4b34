use std::cell::RefCell;

use serde::{Deserialize, Serialize};

use barentain_core::ids::{SenderToken, ValentineId};
use barentain_core::service::{classify_visitor, Visitor};
use barentain_core::store::RecordStore;

use crate::storage;

const SENDER_MAPPINGS_KEY: &str = "barentain.sender_mappings.v1";

#[derive(Clone, Serialize, Deserialize)]
struct SenderMapping {
    valentine_id: ValentineId,
    sender_token: SenderToken,
    created_at: String,
}

thread_local! {
    static MAPPINGS_CACHE: RefCell<Option<Vec<SenderMapping>>> = RefCell::new(None);
}

fn load_mappings() -> Vec<SenderMapping> {
    if let Some(mappings) = MAPPINGS_CACHE.with(|slot| slot.borrow().clone()) {
        return mappings;
    }
    let stored: Vec<SenderMapping> = storage::read_list(SENDER_MAPPINGS_KEY);
    let now = storage::now_ms();
    let fresh: Vec<SenderMapping> = stored
        .iter()
        .filter(|mapping| storage::is_fresh(&mapping.created_at, now))
        .cloned()
        .collect();
    if fresh.len() != stored.len() {
        storage::write_list(SENDER_MAPPINGS_KEY, &fresh);
    }
    MAPPINGS_CACHE.with(|slot| {
        *slot.borrow_mut() = Some(fresh.clone());
    });
    fresh
}

// Per-valentine lookup; there is deliberately no "any mapping at all" query.
pub(crate) fn sender_token_for(id: &ValentineId) -> Option<SenderToken> {
    load_mappings()
        .iter()
        .find(|mapping| mapping.valentine_id == *id)
        .map(|mapping| mapping.sender_token)
}

pub(crate) fn store_sender_mapping(id: ValentineId, token: SenderToken) {
    let mut mappings = load_mappings();
    mappings.retain(|mapping| mapping.valentine_id != id);
    mappings.push(SenderMapping {
        valentine_id: id,
        sender_token: token,
        created_at: storage::now_iso(),
    });
    storage::write_list(SENDER_MAPPINGS_KEY, &mappings);
    MAPPINGS_CACHE.with(|slot| {
        *slot.borrow_mut() = Some(mappings);
    });
}

// Local storage is a cache, not an authority: senderhood holds only when the
// locally-held token matches the server-held one for this exact valentine.
pub(crate) async fn resolve_visitor<S: RecordStore>(store: &S, id: &ValentineId) -> Visitor {
    let Some(local) = sender_token_for(id) else {
        return Visitor::Receiver;
    };
    let server = store.fetch_sender_token(id).await.ok();
    classify_visitor(Some(&local), server.as_ref())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ResultAccess {
    Granted,
    Denied,
}

// A result token is the sender's capability. A browser with no mapping is the
// cross-device case: adopt the server-held token so the answer link resolves
// as sender here too. Only a mapping that contradicts the server is refused.
pub(crate) async fn check_result_access<S: RecordStore>(
    store: &S,
    id: &ValentineId,
) -> ResultAccess {
    let Some(local) = sender_token_for(id) else {
        if let Ok(token) = store.fetch_sender_token(id).await {
            store_sender_mapping(*id, token);
        }
        return ResultAccess::Granted;
    };
    match store.fetch_sender_token(id).await {
        Ok(server) if server == local => ResultAccess::Granted,
        Ok(_) => ResultAccess::Denied,
        Err(_) => ResultAccess::Granted,
    }
}

#[cfg(test)]
pub(crate) fn reset_for_tests() {
    MAPPINGS_CACHE.with(|slot| {
        *slot.borrow_mut() = None;
    });
    if let Some(storage) = web_sys::window().and_then(|window| window.local_storage().ok().flatten())
    {
        let _ = storage.remove_item(SENDER_MAPPINGS_KEY);
    }
}

#[cfg(test)]
mod tests {
    use wasm_bindgen_test::wasm_bindgen_test;

    use super::*;

    #[wasm_bindgen_test]
    fn mappings_are_scoped_per_valentine() {
        reset_for_tests();
        let mine = ValentineId::random();
        let theirs = ValentineId::random();
        let token = SenderToken::random();

        store_sender_mapping(mine, token);

        assert_eq!(sender_token_for(&mine), Some(token));
        assert_eq!(sender_token_for(&theirs), None);
    }

    #[wasm_bindgen_test]
    fn mappings_accumulate_and_survive_cache_reset() {
        reset_for_tests();
        let first = ValentineId::random();
        let second = ValentineId::random();
        let first_token = SenderToken::random();
        let second_token = SenderToken::random();

        store_sender_mapping(first, first_token);
        store_sender_mapping(second, second_token);

        MAPPINGS_CACHE.with(|slot| {
            *slot.borrow_mut() = None;
        });

        assert_eq!(sender_token_for(&first), Some(first_token));
        assert_eq!(sender_token_for(&second), Some(second_token));
    }

    #[wasm_bindgen_test]
    fn stale_mappings_are_pruned_on_load() {
        reset_for_tests();
        let stale = SenderMapping {
            valentine_id: ValentineId::random(),
            sender_token: SenderToken::random(),
            created_at: "2020-01-01T00:00:00.000Z".to_string(),
        };
        let fresh = SenderMapping {
            valentine_id: ValentineId::random(),
            sender_token: SenderToken::random(),
            created_at: storage::now_iso(),
        };
        storage::write_list(SENDER_MAPPINGS_KEY, &[stale.clone(), fresh.clone()]);

        assert_eq!(sender_token_for(&stale.valentine_id), None);
        assert_eq!(
            sender_token_for(&fresh.valentine_id),
            Some(fresh.sender_token)
        );
    }
}
