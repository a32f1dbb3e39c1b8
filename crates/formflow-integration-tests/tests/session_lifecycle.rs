//! Session lifecycle scenarios run against every local store backend

mod common;

use chrono::Duration;
use common::{stores, text_data};
use formflow_core::{
    FieldValue, FormId, FormSessionManager, MergeOutcome, SessionData, SessionToken, TokenCodec,
};

#[tokio::test]
async fn test_merge_overrides_only_submitted_keys() {
    for fixture in stores().await {
        let manager = FormSessionManager::new(fixture.store.clone());
        let form = FormId::new("test");

        let first = manager
            .merge_and_persist(
                &SessionToken::new(),
                &form,
                text_data(&[("name", "John"), ("email", "john@example.com")]),
            )
            .await
            .unwrap();

        // empty submission keeps everything
        let unchanged = manager
            .merge_and_persist(&first.token, &form, SessionData::new())
            .await
            .unwrap();
        assert_eq!(unchanged.record.data, first.record.data, "{}", fixture.name);

        // full overlap replaces every value
        let replaced = manager
            .merge_and_persist(
                &first.token,
                &form,
                text_data(&[("name", "Jane"), ("email", "jane@example.com")]),
            )
            .await
            .unwrap();
        assert_eq!(
            replaced.record.data,
            text_data(&[("name", "Jane"), ("email", "jane@example.com")]),
            "{}",
            fixture.name
        );
        assert_eq!(replaced.outcome, MergeOutcome::Merged, "{}", fixture.name);
        assert_eq!(replaced.record.id, first.record.id, "{}", fixture.name);
    }
}

#[tokio::test]
async fn test_forms_are_isolated() {
    for fixture in stores().await {
        let manager = FormSessionManager::new(fixture.store.clone());
        let form_a = FormId::new("form-a");
        let form_b = FormId::new("form-b");

        let a = manager
            .merge_and_persist(&SessionToken::new(), &form_a, text_data(&[("name", "A1")]))
            .await
            .unwrap();
        let b = manager
            .merge_and_persist(&a.token, &form_b, text_data(&[("name", "B1")]))
            .await
            .unwrap();

        assert_eq!(b.token.len(), 2, "{}", fixture.name);
        assert_ne!(b.token.get(&form_a), b.token.get(&form_b), "{}", fixture.name);

        let resolved_a = manager.resolve(&b.token, &form_a).await.unwrap().unwrap();
        let resolved_b = manager.resolve(&b.token, &form_b).await.unwrap().unwrap();
        assert_eq!(resolved_a.data, text_data(&[("name", "A1")]), "{}", fixture.name);
        assert_eq!(resolved_b.data, text_data(&[("name", "B1")]), "{}", fixture.name);
    }
}

#[tokio::test]
async fn test_stale_reference_recovery() {
    for fixture in stores().await {
        let manager = FormSessionManager::new(fixture.store.clone());
        let form = FormId::new("test");

        let first = manager
            .merge_and_persist(&SessionToken::new(), &form, text_data(&[("name", "John")]))
            .await
            .unwrap();
        assert!(fixture.store.delete(&first.record.id).await.unwrap());

        assert!(manager.resolve(&first.token, &form).await.unwrap().is_none());

        let recovered = manager
            .merge_and_persist(&first.token, &form, text_data(&[("email", "j@example.com")]))
            .await
            .unwrap();
        assert_eq!(recovered.outcome, MergeOutcome::Recovered, "{}", fixture.name);
        assert_ne!(recovered.record.id, first.record.id, "{}", fixture.name);
        assert_eq!(
            recovered.record.data,
            text_data(&[("email", "j@example.com")]),
            "{}",
            fixture.name
        );
        assert_eq!(recovered.token.get(&form), Some(&recovered.record.id));
    }
}

#[tokio::test]
async fn test_codec_round_trip_through_store() {
    let codec = TokenCodec::signed("integration-secret").unwrap();
    assert_eq!(codec.decode(Some(&codec.encode(&SessionToken::new()).unwrap())), SessionToken::new());

    for fixture in stores().await {
        let manager = FormSessionManager::new(fixture.store.clone());
        let form = FormId::new("test");

        let persisted = manager
            .merge_and_persist(&SessionToken::new(), &form, text_data(&[("name", "John")]))
            .await
            .unwrap();

        let raw = codec.encode(&persisted.token).unwrap();
        let decoded = codec.decode(Some(&raw));
        assert_eq!(decoded, persisted.token, "{}", fixture.name);

        let record = manager.resolve(&decoded, &form).await.unwrap().unwrap();
        assert_eq!(record.id, persisted.record.id, "{}", fixture.name);
    }
}

#[tokio::test]
async fn test_absent_token_creates_on_first_merge() {
    for fixture in stores().await {
        let manager = FormSessionManager::new(fixture.store.clone());
        let form = FormId::new("test");
        let codec = TokenCodec::unsigned();
        let token = codec.decode(None);

        assert!(manager.resolve(&token, &form).await.unwrap().is_none());

        let persisted = manager
            .merge_and_persist(&token, &form, text_data(&[("name", "John")]))
            .await
            .unwrap();
        assert_eq!(persisted.outcome, MergeOutcome::Created, "{}", fixture.name);
        assert_eq!(persisted.token.len(), 1, "{}", fixture.name);
    }
}

#[tokio::test]
async fn test_three_step_accumulation() {
    for fixture in stores().await {
        let manager = FormSessionManager::new(fixture.store.clone());
        let form = FormId::new("test");

        let mut step_1 = text_data(&[("name", "John Smith")]);
        step_1.insert("apples".to_string(), FieldValue::from(vec!["apple-1", "apple-2"]));
        step_1.insert("notifications".to_string(), FieldValue::Bool(true));

        let s1 = manager
            .merge_and_persist(&SessionToken::new(), &form, step_1.clone())
            .await
            .unwrap();
        let s2 = manager
            .merge_and_persist(&s1.token, &form, text_data(&[("phone", "(555) 555-1234")]))
            .await
            .unwrap();
        let s3 = manager
            .merge_and_persist(&s2.token, &form, text_data(&[("taxYear", "2024")]))
            .await
            .unwrap();

        assert_eq!(s3.record.id, s1.record.id, "{}", fixture.name);

        let mut expected = step_1;
        expected.extend(text_data(&[("phone", "(555) 555-1234"), ("taxYear", "2024")]));
        let resolved = manager.resolve(&s3.token, &form).await.unwrap().unwrap();
        assert_eq!(resolved.data, expected, "{}", fixture.name);
    }
}

#[tokio::test]
async fn test_same_step_edit_replaces_values() {
    for fixture in stores().await {
        let manager = FormSessionManager::new(fixture.store.clone());
        let form = FormId::new("test");

        let first = manager
            .merge_and_persist(
                &SessionToken::new(),
                &form,
                text_data(&[("name", "John"), ("phone", "(555) 555-1234")]),
            )
            .await
            .unwrap();
        let edited = manager
            .merge_and_persist(&first.token, &form, text_data(&[("name", "Jane")]))
            .await
            .unwrap();

        assert_eq!(
            edited.record.data,
            text_data(&[("name", "Jane"), ("phone", "(555) 555-1234")]),
            "{}",
            fixture.name
        );
    }
}

#[tokio::test]
async fn test_completion_detaches_session() {
    for fixture in stores().await {
        let manager = FormSessionManager::new(fixture.store.clone());
        let form = FormId::new("test");

        let persisted = manager
            .merge_and_persist(&SessionToken::new(), &form, text_data(&[("name", "John")]))
            .await
            .unwrap();

        let (token, completed) = manager.complete(&persisted.token, &form).await.unwrap();
        let completed = completed.unwrap();
        assert!(completed.is_completed(), "{}", fixture.name);
        assert!(token.get(&form).is_none(), "{}", fixture.name);

        // the record itself stays in the store
        assert!(
            fixture
                .store
                .find_by_id(&persisted.record.id)
                .await
                .unwrap()
                .is_some()
        );
    }
}

#[tokio::test]
async fn test_expired_sessions_are_ignored_and_cleaned_up() {
    for fixture in stores().await {
        let manager =
            FormSessionManager::new(fixture.store.clone()).with_ttl(Some(Duration::seconds(-1)));
        let form = FormId::new("test");

        let persisted = manager
            .merge_and_persist(&SessionToken::new(), &form, text_data(&[("name", "John")]))
            .await
            .unwrap();
        assert!(manager.resolve(&persisted.token, &form).await.unwrap().is_none());

        let stats = fixture
            .store
            .cleanup_expired(chrono::Utc::now())
            .await
            .unwrap();
        assert_eq!(stats.sessions_deleted, 1, "{}", fixture.name);
        assert!(
            fixture
                .store
                .find_by_id(&persisted.record.id)
                .await
                .unwrap()
                .is_none()
        );
    }
}
