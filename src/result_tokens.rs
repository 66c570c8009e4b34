use serde::{Deserialize, Serialize};

use barentain_core::ids::{ResultToken, ValentineId};

use crate::storage;

const RESULT_TOKENS_KEY: &str = "barentain.result_tokens.v1";

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct StoredResultToken {
    pub token: ResultToken,
    pub valentine_id: ValentineId,
    pub receiver_name: String,
    pub created_at: String,
}

pub(crate) fn stored_tokens() -> Vec<StoredResultToken> {
    let stored: Vec<StoredResultToken> = storage::read_list(RESULT_TOKENS_KEY);
    let now = storage::now_ms();
    let fresh: Vec<StoredResultToken> = stored
        .iter()
        .filter(|entry| storage::is_fresh(&entry.created_at, now))
        .cloned()
        .collect();
    if fresh.len() != stored.len() {
        storage::write_list(RESULT_TOKENS_KEY, &fresh);
    }
    fresh
}

pub(crate) fn store_result_token(token: ResultToken, valentine_id: ValentineId, receiver_name: &str) {
    let mut tokens = stored_tokens();
    tokens.retain(|entry| entry.valentine_id != valentine_id);
    tokens.push(StoredResultToken {
        token,
        valentine_id,
        receiver_name: receiver_name.to_string(),
        created_at: storage::now_iso(),
    });
    storage::write_list(RESULT_TOKENS_KEY, &tokens);
}

pub(crate) fn result_token_for(valentine_id: &ValentineId) -> Option<ResultToken> {
    stored_tokens()
        .iter()
        .find(|entry| entry.valentine_id == *valentine_id)
        .map(|entry| entry.token)
}

#[cfg(test)]
pub(crate) fn reset_for_tests() {
    if let Some(storage) = web_sys::window().and_then(|window| window.local_storage().ok().flatten())
    {
        let _ = storage.remove_item(RESULT_TOKENS_KEY);
    }
}

#[cfg(test)]
mod tests {
    use wasm_bindgen_test::wasm_bindgen_test;

    use super::*;

    #[wasm_bindgen_test]
    fn tokens_round_trip_by_valentine() {
        reset_for_tests();
        let first = ValentineId::random();
        let second = ValentineId::random();
        let first_token = ResultToken::random();
        let second_token = ResultToken::random();

        store_result_token(first_token, first, "Sam");
        store_result_token(second_token, second, "Robin");

        assert_eq!(result_token_for(&first), Some(first_token));
        assert_eq!(result_token_for(&second), Some(second_token));
        assert_eq!(result_token_for(&ValentineId::random()), None);
        assert_eq!(stored_tokens().len(), 2);
    }

    #[wasm_bindgen_test]
    fn storing_again_replaces_the_entry() {
        reset_for_tests();
        let id = ValentineId::random();
        let first_token = ResultToken::random();
        let second_token = ResultToken::random();

        store_result_token(first_token, id, "Sam");
        store_result_token(second_token, id, "Sam");

        assert_eq!(result_token_for(&id), Some(second_token));
        assert_eq!(stored_tokens().len(), 1);
    }
}
