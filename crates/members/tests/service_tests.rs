//! Member service tests over the in-memory store.

use serde_json::json;

use roster_members::{
    BalanceStatus, MemberError, MemberFilter, MemberService, MemberStore, ValidationErrorKind,
};

fn ada() -> serde_json::Value {
    json!({
        "firstName": "ada",
        "lastName": "lovelace",
        "email": "Ada@Example.com",
        "positions": ["Treasurer"],
        "groups": ["Finance"],
        "balance": 12.5,
        "authentication": { "passwordHash": "hash" }
    })
}

fn grace() -> serde_json::Value {
    json!({
        "firstName": "grace",
        "lastName": "hopper",
        "email": "grace@example.com",
        "status": "active",
        "authentication": { "passwordHash": "hash" }
    })
}

#[tokio::test]
async fn create_normalizes_and_hides_authentication() {
    let service = MemberService::new_for_testing();

    let member = service.create_member(&ada()).await.unwrap();
    assert_eq!(member.full_name(), "Ada Lovelace");
    assert_eq!(member.email, "ada@example.com");
    assert_eq!(member.positions, vec!["Treasurer", "Member"]);
    assert_eq!(member.balance_status(), BalanceStatus::Credit);
    assert!(member.authentication.is_none());
    assert_eq!(member.join_date, member.created_at);
}

#[tokio::test]
async fn create_reports_every_validation_error() {
    let service = MemberService::new_for_testing();

    let error = service
        .create_member(&json!({ "firstName": "a" }))
        .await
        .unwrap_err();
    let MemberError::Validation(errors) = error else {
        panic!("expected validation error, got {error:?}");
    };
    let fields: Vec<_> = errors.iter().map(|error| error.field.as_str()).collect();
    assert_eq!(
        fields,
        vec!["firstName", "lastName", "email", "authentication.passwordHash"]
    );
    assert!(service.store().is_empty().await);
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let service = MemberService::new_for_testing();
    service.create_member(&ada()).await.unwrap();

    let mut again = grace();
    again["email"] = json!("ADA@example.com");
    let error = service.create_member(&again).await.unwrap_err();
    assert!(matches!(error, MemberError::DuplicateKey(ref field) if field == "email"));
}

#[tokio::test]
async fn update_merges_without_reapplying_defaults() {
    let service = MemberService::new_for_testing();
    let created = service.create_member(&grace()).await.unwrap();

    let updated = service
        .update_member(
            created.id.as_str(),
            &json!({ "balance": "-3.333", "authentication": { "emailVerified": true } }),
        )
        .await
        .unwrap();

    assert_eq!(updated.status, "active");
    assert_eq!(updated.balance.cents(), -333);
    assert_eq!(updated.balance_status(), BalanceStatus::Debt);

    let full = service
        .store()
        .find_by_id_with_authentication(&created.id)
        .await
        .unwrap()
        .unwrap();
    let auth = full.authentication.unwrap();
    assert!(auth.email_verified);
    assert_eq!(auth.password_hash, "hash");
}

#[tokio::test]
async fn amounts_without_exact_cents_are_validation_errors() {
    let service = MemberService::new_for_testing();

    let mut rich = ada();
    rich["balance"] = json!(1e20);
    let error = service.create_member(&rich).await.unwrap_err();
    let MemberError::Validation(errors) = error else {
        panic!("expected validation error, got {error:?}");
    };
    assert_eq!(errors.for_field("balance").unwrap().kind, ValidationErrorKind::Range);
    assert!(service.store().is_empty().await);

    let created = service.create_member(&grace()).await.unwrap();
    let error = service
        .update_member(created.id.as_str(), &json!({ "totalDonation": 1e300 }))
        .await
        .unwrap_err();
    assert!(matches!(error, MemberError::Validation(_)));
}

#[tokio::test]
async fn blank_phone_in_an_update_clears_the_stored_number() {
    let service = MemberService::new_for_testing();
    let mut input = grace();
    input["phoneNumber"] = json!("650-253-0000");
    let created = service.create_member(&input).await.unwrap();
    assert_eq!(created.phone_number.as_deref(), Some("+16502530000"));

    let updated = service
        .update_member(created.id.as_str(), &json!({ "phoneNumber": "" }))
        .await
        .unwrap();
    assert_eq!(updated.phone_number, None);

    let found = service.get_member(created.id.as_str()).await.unwrap();
    assert_eq!(found.phone_number, None);
}

#[tokio::test]
async fn locked_members_read_as_locked_without_authentication() {
    let service = MemberService::new_for_testing();
    let created = service.create_member(&grace()).await.unwrap();

    let updated = service
        .update_member(
            created.id.as_str(),
            &json!({ "authentication": { "lockUntil": "2999-01-01T00:00:00Z" } }),
        )
        .await
        .unwrap();
    assert!(updated.authentication.is_none());
    assert!(updated.is_locked());

    let found = service.get_member(created.id.as_str()).await.unwrap();
    assert!(found.is_locked());
    let listed = service.list_members(&MemberFilter::default()).await.unwrap();
    assert!(listed[0].is_locked());
}

#[tokio::test]
async fn update_rejects_unknown_fields_and_duplicates() {
    let service = MemberService::new_for_testing();
    let created = service.create_member(&grace()).await.unwrap();

    let error = service
        .update_member(created.id.as_str(), &json!({ "role": "admin" }))
        .await
        .unwrap_err();
    let MemberError::Validation(errors) = error else {
        panic!("expected validation error");
    };
    assert_eq!(errors.iter().next().unwrap().kind, ValidationErrorKind::Unknown);

    let error = service
        .update_member(created.id.as_str(), &json!({ "groups": ["PR", "PR"] }))
        .await
        .unwrap_err();
    assert!(matches!(error, MemberError::Validation(_)));
}

#[tokio::test]
async fn malformed_ids_are_rejected_before_the_store() {
    let service = MemberService::new_for_testing();

    for result in [
        service.get_member("42").await.map(|_| ()),
        service.delete_member("not-an-id").await,
        service.update_member("xyz", &json!({})).await.map(|_| ()),
    ] {
        assert!(matches!(result, Err(MemberError::InvalidId(_))));
    }
}

#[tokio::test]
async fn missing_members_are_not_found() {
    let service = MemberService::new_for_testing();
    let id = "65a1b2c3d4e5f60718293a4b";

    assert!(matches!(service.get_member(id).await, Err(MemberError::NotFound)));
    assert!(matches!(
        service.update_member(id, &json!({ "status": "alumni" })).await,
        Err(MemberError::NotFound)
    ));
    assert!(matches!(service.delete_member(id).await, Err(MemberError::NotFound)));
}

#[tokio::test]
async fn list_filters_and_keeps_creation_order() {
    let service = MemberService::new_for_testing();
    let first = service.create_member(&ada()).await.unwrap();
    let second = service.create_member(&grace()).await.unwrap();

    let everyone = service.list_members(&MemberFilter::default()).await.unwrap();
    let ids: Vec<_> = everyone.iter().map(|member| member.id.clone()).collect();
    assert_eq!(ids, vec![first.id.clone(), second.id.clone()]);

    let finance = service
        .list_members(&MemberFilter {
            group: Some("Finance".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(finance.len(), 1);
    assert_eq!(finance[0].id, first.id);

    let active = service
        .list_members(&MemberFilter {
            status: Some("active".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, second.id);
}

#[tokio::test]
async fn delete_removes_the_member() {
    let service = MemberService::new_for_testing();
    let created = service.create_member(&ada()).await.unwrap();

    service.delete_member(created.id.as_str()).await.unwrap();
    assert!(matches!(
        service.get_member(created.id.as_str()).await,
        Err(MemberError::NotFound)
    ));
}
