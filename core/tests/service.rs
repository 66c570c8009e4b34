use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use futures::executor::block_on;

use barentain_core::ids::{ResultToken, SenderToken, ValentineId};
use barentain_core::service::{
    classify_visitor, create_valentine, fetch_result, fetch_valentine, submit_answer,
    ServiceError, Visitor,
};
use barentain_core::store::{EventRow, RecordStore, StoreError};
use barentain_core::valentine::{Answer, NewValentine, Status, Valentine};

#[derive(Default)]
struct MemoryStore {
    valentines: RefCell<HashMap<ValentineId, Valentine>>,
    tokens: RefCell<HashMap<ResultToken, ValentineId>>,
    events: RefCell<Vec<EventRow>>,
    clock: RefCell<u32>,
}

impl MemoryStore {
    fn stamp(&self) -> String {
        let mut clock = self.clock.borrow_mut();
        *clock += 1;
        format!("2026-02-14T10:{:02}:{:02}.000Z", *clock / 60, *clock % 60)
    }

    fn status_of(&self, id: &ValentineId) -> Status {
        self.valentines.borrow()[id].status
    }
}

impl RecordStore for MemoryStore {
    async fn insert_valentine(&self, row: &NewValentine) -> Result<(), StoreError> {
        let created_at = self.stamp();
        let mut valentines = self.valentines.borrow_mut();
        if valentines.contains_key(&row.id) {
            return Err(StoreError::Invalid("duplicate valentine id".to_string()));
        }
        valentines.insert(
            row.id,
            Valentine {
                id: row.id,
                sender_name: row.sender_name.clone(),
                receiver_name: row.receiver_name.clone(),
                status: row.status,
                created_at,
                answered_at: None,
                sender_token: row.sender_token,
            },
        );
        Ok(())
    }

    async fn insert_result_token(
        &self,
        token: &ResultToken,
        valentine_id: &ValentineId,
    ) -> Result<(), StoreError> {
        let mut tokens = self.tokens.borrow_mut();
        if tokens.contains_key(token) {
            return Err(StoreError::Invalid("duplicate result token".to_string()));
        }
        tokens.insert(*token, *valentine_id);
        Ok(())
    }

    async fn fetch_valentine(&self, id: &ValentineId) -> Result<Valentine, StoreError> {
        self.valentines
            .borrow()
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn fetch_sender_token(&self, id: &ValentineId) -> Result<SenderToken, StoreError> {
        self.valentines
            .borrow()
            .get(id)
            .map(|valentine| valentine.sender_token)
            .ok_or(StoreError::NotFound)
    }

    async fn valentine_for_token(&self, token: &ResultToken) -> Result<ValentineId, StoreError> {
        self.tokens
            .borrow()
            .get(token)
            .copied()
            .ok_or(StoreError::NotFound)
    }

    async fn result_token_for(&self, id: &ValentineId) -> Result<ResultToken, StoreError> {
        self.tokens
            .borrow()
            .iter()
            .find(|(_, valentine_id)| *valentine_id == id)
            .map(|(token, _)| *token)
            .ok_or(StoreError::NotFound)
    }

    async fn answer_if_pending(
        &self,
        id: &ValentineId,
        status: Status,
        answered_at: &str,
    ) -> Result<bool, StoreError> {
        let mut valentines = self.valentines.borrow_mut();
        let Some(valentine) = valentines.get_mut(id) else {
            return Err(StoreError::NotFound);
        };
        if !valentine.status.is_pending() {
            return Ok(false);
        }
        valentine.status = status;
        valentine.answered_at = Some(answered_at.to_string());
        Ok(true)
    }

    async fn append_event(&self, event: &EventRow) -> Result<(), StoreError> {
        self.events.borrow_mut().push(event.clone());
        Ok(())
    }
}

// Reports every valentine as still pending so the conditional write is the
// only thing standing between two racing answers.
struct PendingMaskStore<'a>(&'a MemoryStore);

impl RecordStore for PendingMaskStore<'_> {
    async fn insert_valentine(&self, row: &NewValentine) -> Result<(), StoreError> {
        self.0.insert_valentine(row).await
    }

    async fn insert_result_token(
        &self,
        token: &ResultToken,
        valentine_id: &ValentineId,
    ) -> Result<(), StoreError> {
        self.0.insert_result_token(token, valentine_id).await
    }

    async fn fetch_valentine(&self, id: &ValentineId) -> Result<Valentine, StoreError> {
        let mut valentine = self.0.fetch_valentine(id).await?;
        valentine.status = Status::Pending;
        valentine.answered_at = None;
        Ok(valentine)
    }

    async fn fetch_sender_token(&self, id: &ValentineId) -> Result<SenderToken, StoreError> {
        self.0.fetch_sender_token(id).await
    }

    async fn valentine_for_token(&self, token: &ResultToken) -> Result<ValentineId, StoreError> {
        self.0.valentine_for_token(token).await
    }

    async fn result_token_for(&self, id: &ValentineId) -> Result<ResultToken, StoreError> {
        self.0.result_token_for(id).await
    }

    async fn answer_if_pending(
        &self,
        id: &ValentineId,
        status: Status,
        answered_at: &str,
    ) -> Result<bool, StoreError> {
        self.0.answer_if_pending(id, status, answered_at).await
    }

    async fn append_event(&self, event: &EventRow) -> Result<(), StoreError> {
        self.0.append_event(event).await
    }
}

// Fails the token write so the pair insert cannot complete.
struct BrokenTokenStore<'a>(&'a MemoryStore);

impl RecordStore for BrokenTokenStore<'_> {
    async fn insert_valentine(&self, row: &NewValentine) -> Result<(), StoreError> {
        self.0.insert_valentine(row).await
    }

    async fn insert_result_token(
        &self,
        _token: &ResultToken,
        _valentine_id: &ValentineId,
    ) -> Result<(), StoreError> {
        Err(StoreError::Transient("token write failed".to_string()))
    }

    async fn fetch_valentine(&self, id: &ValentineId) -> Result<Valentine, StoreError> {
        self.0.fetch_valentine(id).await
    }

    async fn fetch_sender_token(&self, id: &ValentineId) -> Result<SenderToken, StoreError> {
        self.0.fetch_sender_token(id).await
    }

    async fn valentine_for_token(&self, token: &ResultToken) -> Result<ValentineId, StoreError> {
        self.0.valentine_for_token(token).await
    }

    async fn result_token_for(&self, id: &ValentineId) -> Result<ResultToken, StoreError> {
        self.0.result_token_for(id).await
    }

    async fn answer_if_pending(
        &self,
        id: &ValentineId,
        status: Status,
        answered_at: &str,
    ) -> Result<bool, StoreError> {
        self.0.answer_if_pending(id, status, answered_at).await
    }

    async fn append_event(&self, event: &EventRow) -> Result<(), StoreError> {
        self.0.append_event(event).await
    }
}

const ORIGIN: &str = "https://barentain.example";

#[test]
fn create_returns_pending_record_and_links() {
    let store = MemoryStore::default();
    let created =
        block_on(create_valentine(&store, Some("Alex"), "Sam", ORIGIN)).unwrap();

    assert_eq!(created.answer_url, format!("{ORIGIN}/v/{}", created.id));
    assert_eq!(
        created.result_url,
        format!("{ORIGIN}/r/{}", created.result_token)
    );

    let valentine = block_on(fetch_valentine(&store, &created.id)).unwrap();
    assert_eq!(valentine.sender_name.as_deref(), Some("Alex"));
    assert_eq!(valentine.receiver_name, "Sam");
    assert_eq!(valentine.status, Status::Pending);
    assert_eq!(valentine.answered_at, None);
    assert_eq!(valentine.sender_token, created.sender_token);

    let linked = block_on(store.valentine_for_token(&created.result_token)).unwrap();
    assert_eq!(linked, created.id);
}

#[test]
fn create_trims_names_and_drops_blank_sender() {
    let store = MemoryStore::default();
    let created =
        block_on(create_valentine(&store, Some("   "), "  Sam  ", ORIGIN)).unwrap();
    let valentine = block_on(fetch_valentine(&store, &created.id)).unwrap();
    assert_eq!(valentine.sender_name, None);
    assert_eq!(valentine.receiver_name, "Sam");
}

#[test]
fn create_rejects_empty_receiver_without_writing() {
    let store = MemoryStore::default();
    for bad in ["", "   ", "\t\n"] {
        let err = block_on(create_valentine(&store, None, bad, ORIGIN)).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
    assert!(store.valentines.borrow().is_empty());
    assert!(store.tokens.borrow().is_empty());
}

#[test]
fn create_fails_as_a_whole_when_token_write_fails() {
    let inner = MemoryStore::default();
    let store = BrokenTokenStore(&inner);
    let err = block_on(create_valentine(&store, None, "Sam", ORIGIN)).unwrap_err();
    assert!(err.is_transient());
    assert!(inner.tokens.borrow().is_empty());
}

#[test]
fn ids_and_tokens_are_pairwise_distinct() {
    let store = MemoryStore::default();
    let mut ids = HashSet::new();
    let mut tokens = HashSet::new();
    for _ in 0..100 {
        let created = block_on(create_valentine(&store, None, "Sam", ORIGIN)).unwrap();
        assert!(ids.insert(created.id));
        assert!(tokens.insert(created.result_token));
    }
}

#[test]
fn answer_is_idempotent_across_values() {
    let store = MemoryStore::default();
    let created = block_on(create_valentine(&store, None, "Sam", ORIGIN)).unwrap();

    block_on(submit_answer(&store, &created.id, Answer::Yes, "t1")).unwrap();
    assert_eq!(store.status_of(&created.id), Status::Yes);
    let first_answered_at = block_on(fetch_valentine(&store, &created.id))
        .unwrap()
        .answered_at;

    block_on(submit_answer(&store, &created.id, Answer::Yes, "t2")).unwrap();
    block_on(submit_answer(&store, &created.id, Answer::No, "t3")).unwrap();

    let valentine = block_on(fetch_valentine(&store, &created.id)).unwrap();
    assert_eq!(valentine.status, Status::Yes);
    assert_eq!(valentine.answered_at, first_answered_at);
}

#[test]
fn lost_conditional_write_still_reports_success() {
    let inner = MemoryStore::default();
    let created = block_on(create_valentine(&inner, None, "Sam", ORIGIN)).unwrap();
    block_on(submit_answer(&inner, &created.id, Answer::Yes, "t1")).unwrap();

    // The racing submitter read "pending" but the conditional write loses.
    let masked = PendingMaskStore(&inner);
    block_on(submit_answer(&masked, &created.id, Answer::No, "t2")).unwrap();

    let valentine = block_on(fetch_valentine(&inner, &created.id)).unwrap();
    assert_eq!(valentine.status, Status::Yes);
    assert_eq!(valentine.answered_at.as_deref(), Some("t1"));
}

#[test]
fn answering_one_valentine_leaves_others_alone() {
    let store = MemoryStore::default();
    let first = block_on(create_valentine(&store, None, "Sam", ORIGIN)).unwrap();
    let second = block_on(create_valentine(&store, None, "Robin", ORIGIN)).unwrap();

    block_on(submit_answer(&store, &first.id, Answer::No, "t1")).unwrap();

    assert_eq!(store.status_of(&first.id), Status::No);
    assert_eq!(store.status_of(&second.id), Status::Pending);
}

#[test]
fn answer_for_unknown_valentine_is_not_found() {
    let store = MemoryStore::default();
    let err = block_on(submit_answer(
        &store,
        &ValentineId::random(),
        Answer::Yes,
        "t1",
    ))
    .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn result_follows_the_token_to_its_valentine() {
    let store = MemoryStore::default();
    let created = block_on(create_valentine(&store, Some("Alex"), "Sam", ORIGIN)).unwrap();

    let pending = block_on(fetch_result(&store, &created.result_token)).unwrap();
    assert_eq!(pending.valentine_id, created.id);
    assert_eq!(pending.status, Status::Pending);
    assert_eq!(pending.answered_at, None);

    block_on(submit_answer(&store, &created.id, Answer::Yes, "t1")).unwrap();
    let answered = block_on(fetch_result(&store, &created.result_token)).unwrap();
    assert_eq!(answered.status, Status::Yes);
    assert_eq!(answered.answered_at.as_deref(), Some("t1"));
    assert!(!answered.created_at.is_empty());
}

#[test]
fn unknown_result_token_is_not_found() {
    let store = MemoryStore::default();
    let err = block_on(fetch_result(&store, &ResultToken::random())).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn visitor_classification_requires_an_exact_match() {
    let token = SenderToken::random();
    let other = SenderToken::random();
    assert_eq!(
        classify_visitor(Some(&token), Some(&token)),
        Visitor::Sender
    );
    assert_eq!(
        classify_visitor(Some(&token), Some(&other)),
        Visitor::Receiver
    );
    assert_eq!(classify_visitor(None, Some(&token)), Visitor::Receiver);
    assert_eq!(classify_visitor(Some(&token), None), Visitor::Receiver);
    assert_eq!(classify_visitor(None, None), Visitor::Receiver);
}

#[test]
fn sender_for_one_valentine_is_receiver_for_another() {
    let store = MemoryStore::default();
    let mine = block_on(create_valentine(&store, None, "Sam", ORIGIN)).unwrap();
    let theirs = block_on(create_valentine(&store, None, "Robin", ORIGIN)).unwrap();

    // The creating browser holds a mapping for `mine` only.
    let local = mine.sender_token;

    let server_mine = block_on(store.fetch_sender_token(&mine.id)).unwrap();
    assert_eq!(
        classify_visitor(Some(&local), Some(&server_mine)),
        Visitor::Sender
    );

    let server_theirs = block_on(store.fetch_sender_token(&theirs.id)).unwrap();
    assert_eq!(
        classify_visitor(Some(&local), Some(&server_theirs)),
        Visitor::Receiver
    );
}

#[test]
fn full_flow_create_answer_result() {
    let store = MemoryStore::default();
    let created = block_on(create_valentine(&store, Some("Alex"), "Sam", ORIGIN)).unwrap();

    // The receiver opens the answer link and says yes.
    let valentine = block_on(fetch_valentine(&store, &created.id)).unwrap();
    assert_eq!(valentine.status, Status::Pending);
    block_on(submit_answer(&store, &created.id, Answer::Yes, "t1")).unwrap();

    // The creating browser resolves as sender and reads the result.
    let server_token = block_on(store.fetch_sender_token(&created.id)).unwrap();
    assert_eq!(
        classify_visitor(Some(&created.sender_token), Some(&server_token)),
        Visitor::Sender
    );
    let result = block_on(fetch_result(&store, &created.result_token)).unwrap();
    assert_eq!(result.status, Status::Yes);
    assert!(result.answered_at.is_some());
}
