//! Form catalog loaded from disk and reloaded into a running router

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use formflow_config_file::FileFormConfigStore;
use formflow_core::{FormConfigStore, FormSessionManager, InMemorySessionStore, TokenCodec};
use formflow_observability::metrics::Metrics;
use formflow_server::{AppState, cookie::CookieSettings, reload::reload_catalog, router};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tower::ServiceExt;

const ONE_FORM: &str = r#"
forms:
  contact:
    steps:
      - slug: details
        rows:
          - columns:
              - fields:
                  - { label: Email, name: email, type: email, required: true, validators: [email] }
"#;

const TWO_FORMS: &str = r#"
forms:
  contact:
    steps:
      - slug: details
  survey:
    steps:
      - slug: questions
      - slug: feedback
"#;

const BROKEN: &str = r#"
forms:
  contact:
    steps:
      - slug: checkout
"#;

fn write_catalog(file: &NamedTempFile, contents: &str) {
    std::fs::write(file.path(), contents).unwrap();
}

async fn status(app: &axum::Router, uri: &str) -> StatusCode {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_reload_exposes_new_forms_and_rejects_invalid_catalogs() {
    let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    write_catalog(&file, ONE_FORM);

    let store = FileFormConfigStore::new(file.path()).await.unwrap();
    let catalog = store.load_catalog().await.unwrap();
    store.validate_catalog(&catalog).await.unwrap();

    let state = AppState::new(
        FormSessionManager::new(Arc::new(InMemorySessionStore::new())),
        TokenCodec::unsigned(),
        catalog,
        Arc::new(Metrics::new().unwrap()),
        CookieSettings::default(),
    );
    let app = router(state.clone());

    assert_eq!(status(&app, "/flow/contact").await, StatusCode::SEE_OTHER);
    assert_eq!(status(&app, "/flow/survey").await, StatusCode::NOT_FOUND);

    write_catalog(&file, TWO_FORMS);
    assert_eq!(reload_catalog(&state, &store).await.unwrap(), 2);
    assert_eq!(status(&app, "/flow/survey/feedback").await, StatusCode::OK);

    // a catalog that fails validation leaves the running one in place
    write_catalog(&file, BROKEN);
    assert!(reload_catalog(&state, &store).await.is_err());
    assert_eq!(status(&app, "/flow/survey/questions").await, StatusCode::OK);
}

#[tokio::test]
async fn test_shipped_catalog_is_valid() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/forms.yaml");
    let store = FileFormConfigStore::new(path).await.unwrap();
    let catalog = store.load_catalog().await.unwrap();
    store.validate_catalog(&catalog).await.unwrap();

    assert!(catalog.visible_forms().count() >= 1);
}
