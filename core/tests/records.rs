use std::collections::HashSet;

use barentain_core::ids::{is_valid_id, IdError, ResultToken, SenderToken, ValentineId};
use barentain_core::valentine::{answer_url, result_url, Answer, NewValentine, Status};

#[test]
fn generated_ids_are_canonical_and_round_trip() {
    for _ in 0..50 {
        let id = ValentineId::random();
        let text = id.to_string();
        assert_eq!(text.len(), 36);
        assert!(is_valid_id(&text));
        assert_eq!(ValentineId::parse(&text).unwrap(), id);
    }
}

#[test]
fn parse_rejects_non_canonical_forms() {
    let canonical = "9f1c1f2e-8a5b-4c6d-9e0f-123456789abc";
    assert!(ValentineId::parse(canonical).is_ok());
    assert!(ResultToken::parse(canonical).is_ok());
    assert!(SenderToken::parse(canonical).is_ok());

    let upper = canonical.to_uppercase();
    assert_eq!(
        ValentineId::parse(&upper).unwrap_err(),
        IdError::NotCanonical
    );

    let braced = format!("{{{canonical}}}");
    assert!(matches!(
        ValentineId::parse(&braced).unwrap_err(),
        IdError::InvalidLength { found: 38, .. }
    ));

    let simple = canonical.replace('-', "");
    assert!(matches!(
        ValentineId::parse(&simple).unwrap_err(),
        IdError::InvalidLength { found: 32, .. }
    ));

    assert_eq!(
        ValentineId::parse("9f1c1f2e-8a5b-4c6d-9e0f-12345678gabc").unwrap_err(),
        IdError::NotCanonical
    );
    assert!(!is_valid_id(""));
}

#[test]
fn random_ids_do_not_collide() {
    let mut seen = HashSet::new();
    for _ in 0..1_000 {
        assert!(seen.insert(ValentineId::random().to_string()));
    }
}

#[test]
fn share_urls_have_the_published_shape() {
    let id = ValentineId::parse("9f1c1f2e-8a5b-4c6d-9e0f-123456789abc").unwrap();
    let token = ResultToken::parse("01234567-89ab-4cde-8f01-23456789abcd").unwrap();

    assert_eq!(
        answer_url("https://barentain.example", &id),
        "https://barentain.example/v/9f1c1f2e-8a5b-4c6d-9e0f-123456789abc"
    );
    assert_eq!(
        result_url("https://barentain.example/", &token),
        "https://barentain.example/r/01234567-89ab-4cde-8f01-23456789abcd"
    );
}

#[test]
fn status_and_answer_strings_match_the_store_enum() {
    assert_eq!(Status::Pending.as_str(), "pending");
    assert_eq!(Status::Yes.as_str(), "yes");
    assert_eq!(Status::No.as_str(), "no");
    assert!(Status::Pending.is_pending());
    assert!(!Status::Yes.is_pending());
    assert_eq!(Answer::Yes.status(), Status::Yes);
    assert_eq!(Answer::No.status(), Status::No);
    assert_eq!(Answer::No.as_str(), "no");
}

#[test]
fn new_valentine_serializes_with_store_field_names() {
    let row = NewValentine {
        id: ValentineId::parse("9f1c1f2e-8a5b-4c6d-9e0f-123456789abc").unwrap(),
        sender_name: None,
        receiver_name: "Sam".to_string(),
        status: Status::Pending,
        sender_token: SenderToken::parse("01234567-89ab-4cde-8f01-23456789abcd").unwrap(),
    };
    let value = serde_json::to_value(&row).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "id": "9f1c1f2e-8a5b-4c6d-9e0f-123456789abc",
            "sender_name": null,
            "receiver_name": "Sam",
            "status": "pending",
            "sender_token": "01234567-89ab-4cde-8f01-23456789abcd",
        })
    );
}
