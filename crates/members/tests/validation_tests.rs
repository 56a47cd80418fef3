//! Behavioural tests for the member validation engine.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};

use roster_members::{
    normalize_name, EnumRegistry, Mode, NewMember, ValidationErrorKind, Validator,
};

fn validator() -> Validator {
    Validator::standard(Arc::new(EnumRegistry::standard()))
}

fn creation_input() -> Value {
    json!({
        "firstName": "mary-jane",
        "lastName": "o'brien",
        "email": "A@B.com",
        "authentication": { "passwordHash": "h" }
    })
}

fn with_field(mut input: Value, key: &str, value: Value) -> Value {
    input[key] = value;
    input
}

fn merged(base: Value, extra: Value) -> Value {
    let (Value::Object(mut base), Value::Object(extra)) = (base, extra) else {
        panic!("both values must be objects");
    };
    base.extend(extra);
    Value::Object(base)
}

#[test]
fn scenario_normalizes_names_email_and_defaults() {
    let record = validator()
        .validate(&creation_input(), Mode::Create)
        .expect("scenario input is valid");

    assert_eq!(record.get("firstName"), Some(&json!("Mary-Jane")));
    assert_eq!(record.get("lastName"), Some(&json!("O'Brien")));
    assert_eq!(record.get("email"), Some(&json!("a@b.com")));
    assert_eq!(record.get("status"), Some(&json!("pending")));
    assert_eq!(record.get("positions"), Some(&json!(["Member"])));
    assert_eq!(record.get("groups"), Some(&json!(["Member"])));
    assert_eq!(record.get("balance").and_then(Value::as_f64), Some(0.0));
    assert_eq!(record.get("totalDonation").and_then(Value::as_f64), Some(0.0));
}

#[test]
fn scenario_output_converts_into_a_new_member() {
    let record = validator()
        .validate(&creation_input(), Mode::Create)
        .expect("scenario input is valid");

    let member = NewMember::try_from(record).expect("normalized output deserializes");
    assert_eq!(member.first_name, "Mary-Jane");
    assert_eq!(member.authentication.password_hash, "h");
    assert!(!member.authentication.email_verified);
    assert!(member.settings.email_notifications.payments);
    assert_eq!(member.balance.cents(), 0);
}

#[test]
fn missing_password_hash_is_reported_on_its_nested_path() {
    for input in [
        json!({ "firstName": "Ada", "lastName": "Byron", "email": "ada@example.com" }),
        json!({
            "firstName": "Ada",
            "lastName": "Byron",
            "email": "ada@example.com",
            "authentication": { "emailVerified": true }
        }),
    ] {
        let errors = validator().validate(&input, Mode::Create).unwrap_err();
        let error = errors
            .for_field("authentication.passwordHash")
            .expect("password hash error present");
        assert_eq!(error.kind, ValidationErrorKind::Required);
        assert_eq!(error.message, "\"authentication.passwordHash\" is required");
    }
}

#[test]
fn password_hash_is_optional_in_update_mode_but_never_empty() {
    let record = validator()
        .validate(&json!({ "authentication": { "emailVerified": true } }), Mode::Update)
        .expect("partial authentication update is valid");
    assert_eq!(
        record.get("authentication"),
        Some(&json!({ "emailVerified": true }))
    );

    let errors = validator()
        .validate(&json!({ "authentication": { "passwordHash": "" } }), Mode::Update)
        .unwrap_err();
    assert_eq!(errors.iter().next().unwrap().kind, ValidationErrorKind::Empty);
}

#[test]
fn duplicate_positions_fail_before_member_injection() {
    let errors = validator()
        .validate(&json!({ "positions": ["President", "President"] }), Mode::Update)
        .unwrap_err();

    assert_eq!(errors.len(), 1);
    let error = errors.iter().next().unwrap();
    assert_eq!(error.kind, ValidationErrorKind::Duplicate);
    assert_eq!(error.field, "positions[1]");
}

#[test]
fn duplicate_member_tag_is_a_duplicate_not_an_injection() {
    let errors = validator()
        .validate(&json!({ "groups": ["Member", "Admin", "Member"] }), Mode::Update)
        .unwrap_err();
    assert_eq!(errors.iter().next().unwrap().field, "groups[2]");
}

#[test]
fn validated_tag_lists_always_hold_member_once() {
    let inputs = [
        json!({ "positions": ["President"], "groups": ["Admin", "PR"] }),
        json!({ "positions": ["Member", "Treasurer"], "groups": ["Member"] }),
        json!({ "positions": ["Historian", "Secretary", "Member"] }),
        json!({}),
    ];

    for input in inputs {
        let record = validator()
            .validate(&merged(creation_input(), input), Mode::Create)
            .expect("tag lists are valid");

        for key in ["positions", "groups"] {
            let tags: Vec<&str> = record
                .get(key)
                .and_then(Value::as_array)
                .unwrap()
                .iter()
                .filter_map(Value::as_str)
                .collect();
            assert_eq!(tags.iter().filter(|tag| **tag == "Member").count(), 1, "{key}: {tags:?}");
            let mut unique = tags.clone();
            unique.sort_unstable();
            unique.dedup();
            assert_eq!(unique.len(), tags.len(), "{key} has duplicates: {tags:?}");
        }
    }
}

#[test]
fn date_of_birth_must_be_strictly_in_the_past() {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let v = validator();

    let at_now = v
        .validate_at(&json!({ "dateOfBirth": now.to_rfc3339() }), Mode::Update, now)
        .unwrap_err();
    assert_eq!(at_now.iter().next().unwrap().kind, ValidationErrorKind::NotInPast);

    let one_second_earlier = (now - Duration::seconds(1)).to_rfc3339();
    let record = v
        .validate_at(&json!({ "dateOfBirth": one_second_earlier }), Mode::Update, now)
        .expect("one second in the past is accepted");
    assert_eq!(
        record.get("dateOfBirth"),
        Some(&json!("2024-06-01T11:59:59.000Z"))
    );
}

#[test]
fn name_length_boundaries() {
    let v = validator();
    let name = |length: usize| "a".repeat(length);

    for (length, accepted) in [(1, false), (2, true), (50, true), (51, false)] {
        let result = v.validate(&json!({ "firstName": name(length) }), Mode::Update);
        assert_eq!(result.is_ok(), accepted, "length {length}");
        if let Err(errors) = result {
            assert_eq!(errors.iter().next().unwrap().kind, ValidationErrorKind::Length);
        }
    }
}

#[test]
fn name_length_counts_codepoints_after_trimming() {
    let record = validator()
        .validate(&json!({ "lastName": "  zoë  " }), Mode::Update)
        .expect("three codepoints after trimming");
    assert_eq!(record.get("lastName"), Some(&json!("Zoë")));
}

#[test]
fn names_with_digits_use_the_field_message() {
    let errors = validator()
        .validate(&json!({ "firstName": "R2D2", "lastName": "C3PO" }), Mode::Update)
        .unwrap_err();
    assert_eq!(
        errors.messages(),
        vec![
            "First name may only contain letters, spaces, hyphens, and apostrophes.".to_string(),
            "Last name may only contain letters, spaces, hyphens, and apostrophes.".to_string(),
        ]
    );
}

#[test]
fn name_normalization_is_idempotent_over_validated_names() {
    for raw in ["mary-jane", "o'brien", "JEAN-LUC PICARD", "de la cruz", "ÉMILE", "ßabine", "ŉoel"] {
        let once = normalize_name(raw);
        assert_eq!(normalize_name(&once), once);
    }

    let record = validator()
        .validate(&json!({ "firstName": "ßabine" }), Mode::Update)
        .unwrap();
    assert_eq!(record.get("firstName"), Some(&json!("ßabine")));
}

#[test]
fn names_that_grow_past_the_limit_when_recased_are_rejected() {
    let raw = format!("a{}", "İ".repeat(49));
    assert_eq!(raw.chars().count(), 50);

    let errors = validator()
        .validate(&json!({ "lastName": raw }), Mode::Update)
        .unwrap_err();
    let error = errors.for_field("lastName").expect("length error present");
    assert_eq!(error.kind, ValidationErrorKind::Length);
    assert_eq!(
        error.message,
        "\"lastName\" length must be less than or equal to 50 characters long"
    );
}

#[test]
fn invalid_phone_is_rejected_and_empty_phone_is_absent() {
    let invalid = with_field(creation_input(), "phoneNumber", json!("not-a-number"));
    let errors = validator().validate(&invalid, Mode::Create).unwrap_err();
    let error = errors.for_field("phoneNumber").expect("phone error present");
    assert_eq!(error.kind, ValidationErrorKind::InvalidPhoneNumber);

    let empty = with_field(creation_input(), "phoneNumber", json!(""));
    let record = validator()
        .validate(&empty, Mode::Create)
        .expect("empty phone is accepted");
    assert!(record.get("phoneNumber").is_none());
}

#[test]
fn phone_is_stored_in_e164() {
    let input = with_field(creation_input(), "phoneNumber", json!("(202) 456-1111"));
    let record = validator().validate(&input, Mode::Create).unwrap();
    assert_eq!(record.get("phoneNumber"), Some(&json!("+12024561111")));
}

#[test]
fn creation_output_round_trips_through_update_mode() {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let input = json!({
        "firstName": "ada",
        "middleName": "king",
        "lastName": "lovelace",
        "email": " Ada@Example.COM ",
        "phoneNumber": "650-253-0000",
        "dateOfBirth": "1815-12-10",
        "status": "Active",
        "positions": ["Treasurer"],
        "groups": ["Finance", "Member"],
        "mentor": "65A1B2C3D4E5F60718293A4B",
        "balance": "10.005",
        "totalDonation": 25,
        "authentication": { "passwordHash": "$argon2id$v=19$hash", "lockUntil": null },
        "metadata": {
            "studentID": " 1234 ",
            "socialMedia": { "linkedin": "https://linkedin.com/in/ada" },
            "customFields": { "house": "Byron" }
        }
    });

    let v = validator();
    let created = v.validate_at(&input, Mode::Create, now).expect("creation input is valid");
    let revalidated = v
        .validate_at(&created.clone().into_value(), Mode::Update, now)
        .expect("creation output is valid in update mode");

    assert_eq!(revalidated.as_map(), created.as_map());
    assert_eq!(created.get("mentor"), Some(&json!("65a1b2c3d4e5f60718293a4b")));
    assert_eq!(created.get("metadata").unwrap()["studentID"], json!("1234"));
}

#[test]
fn update_mode_rejects_unknown_fields_at_every_level() {
    let input = json!({
        "nickname": "Countess",
        "metadata": { "favouriteNumber": 7, "customFields": { "anything": true } }
    });
    let errors = validator().validate(&input, Mode::Update).unwrap_err();
    let fields: Vec<_> = errors.iter().map(|error| error.field.as_str()).collect();
    assert_eq!(fields, vec!["metadata.favouriteNumber", "nickname"]);
    assert!(errors
        .iter()
        .all(|error| error.kind == ValidationErrorKind::Unknown));
}

#[test]
fn every_failing_field_is_reported() {
    let input = json!({
        "firstName": "",
        "lastName": 42,
        "email": "not-an-email",
        "status": "asleep",
        "totalDonation": -1,
        "settings": { "emailNotifications": { "fines": "sometimes" } }
    });
    let errors = validator().validate(&input, Mode::Create).unwrap_err();
    let kinds: Vec<_> = errors.iter().map(|error| (error.field.as_str(), error.kind)).collect();

    assert_eq!(
        kinds,
        vec![
            ("firstName", ValidationErrorKind::Empty),
            ("lastName", ValidationErrorKind::InvalidType),
            ("email", ValidationErrorKind::Pattern),
            ("status", ValidationErrorKind::NotAllowed),
            ("totalDonation", ValidationErrorKind::Range),
            ("authentication.passwordHash", ValidationErrorKind::Required),
            ("settings.emailNotifications.fines", ValidationErrorKind::InvalidType),
        ]
    );
}
