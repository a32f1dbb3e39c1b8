//! Step controller routes
//!
//! Every handler reads the session token from the request cookie, resolves
//! the form (and step) against the current catalog snapshot, and hands
//! validated step data to the `FormSessionManager`. Responses are JSON view
//! models; successful submissions redirect with `303 See Other`.

use axum::{
    Form, Json, Router,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use formflow_core::{
    Error, FormId, SessionData, SessionToken,
    form::{FormConfig, MetaDescriptor, Step, StepNavigation, StepSchema},
};

use crate::app::AppState;
use crate::error::AppError;

type HandlerResult<T> = std::result::Result<T, AppError>;

pub fn flow_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_forms))
        .route("/flow/{form_id}", get(start_flow))
        .route("/flow/{form_id}/checkout", get(show_checkout).post(submit_checkout))
        .route("/flow/{form_id}/finished", get(show_finished))
        .route("/flow/{form_id}/{step_slug}", get(show_step).post(submit_step))
}

#[derive(Debug, Serialize)]
pub struct FormSummary {
    pub id: FormId,
    pub title: Option<String>,
    #[serde(rename = "firstStep")]
    pub first_step: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepView<'a> {
    pub form_id: &'a FormId,
    pub step: &'a Step,
    pub navigation: StepNavigation,
    pub meta: Vec<MetaDescriptor>,
    pub existing_data: Option<SessionData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_config: Option<&'a FormConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutView<'a> {
    pub form_id: &'a FormId,
    pub meta: Vec<MetaDescriptor>,
    pub form_data: SessionData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishedView<'a> {
    pub form_id: &'a FormId,
    pub meta: Vec<MetaDescriptor>,
}

fn page_title(meta: &[MetaDescriptor]) -> Option<String> {
    meta.iter().find_map(|entry| match entry {
        MetaDescriptor::Title { title } => Some(title.clone()),
        _ => None,
    })
}

fn step_url(form_id: &FormId, step_slug: &str) -> String {
    format!("/flow/{}/{}", form_id, step_slug)
}

/// 303 redirect that also replaces the session cookie
fn redirect_with_token(state: &AppState, location: &str, token: &SessionToken) -> HandlerResult<Response> {
    let cookie = state.session_cookie(token)?;
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(location)).into_response())
}

/// Look up the session for `form_id`, counting store failures
async fn resolve_data(
    state: &AppState,
    token: &SessionToken,
    form_id: &FormId,
) -> HandlerResult<Option<SessionData>> {
    match state.manager().resolve(token, form_id).await {
        Ok(record) => Ok(record.map(|record| record.data)),
        Err(e) => {
            state.metrics().record_store_error("resolve");
            Err(e.into())
        }
    }
}

async fn list_forms(State(state): State<AppState>) -> Json<Vec<FormSummary>> {
    let catalog = state.catalog().await;
    let forms = catalog
        .visible_forms()
        .map(|(id, config)| FormSummary {
            id: id.clone(),
            title: page_title(&config.meta),
            first_step: config.first_step().map(|step| step.slug.clone()),
        })
        .collect();
    Json(forms)
}

async fn start_flow(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
    RawQuery(query): RawQuery,
) -> HandlerResult<Redirect> {
    let form_id = FormId::new(form_id);
    let catalog = state.catalog().await;
    let config = catalog.validate_form(&form_id)?;

    let first = config
        .first_step()
        .ok_or_else(|| Error::ConfigValidation(format!("form '{}' has no steps", form_id)))?;

    let mut location = step_url(&form_id, &first.slug);
    if let Some(query) = query.filter(|query| !query.is_empty()) {
        location.push('?');
        location.push_str(&query);
    }
    Ok(Redirect::to(&location))
}

async fn show_step(
    State(state): State<AppState>,
    Path((form_id, step_slug)): Path<(String, String)>,
    headers: HeaderMap,
) -> HandlerResult<Response> {
    let form_id = FormId::new(form_id);
    let catalog = state.catalog().await;
    let (config, step) = catalog.validate_form_and_step(&form_id, &step_slug)?;

    let navigation = config
        .navigation(&form_id, &step.slug)
        .ok_or_else(|| Error::Internal(format!("no navigation for step '{}'", step.slug)))?;

    let token = state.session_token(&headers);
    let existing_data = resolve_data(&state, &token, &form_id).await?;

    let view = StepView {
        form_id: &form_id,
        step,
        navigation,
        meta: config.step_meta(&step.slug),
        existing_data,
        form_config: config.debug.then_some(config),
    };
    Ok(Json(view).into_response())
}

async fn submit_step(
    State(state): State<AppState>,
    Path((form_id, step_slug)): Path<(String, String)>,
    headers: HeaderMap,
    Form(pairs): Form<Vec<(String, String)>>,
) -> HandlerResult<Response> {
    let form_id = FormId::new(form_id);
    let catalog = state.catalog().await;
    let (config, step) = catalog.validate_form_and_step(&form_id, &step_slug)?;

    let data = match StepSchema::from_step(step).parse(&pairs) {
        Ok(data) => data,
        Err(errors) => {
            debug!(form_id = %form_id, step = %step.slug, fields = errors.len(), "Step submission rejected");
            state.metrics().record_step_rejected(form_id.as_str(), &step.slug);
            return Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "errors": errors })),
            )
                .into_response());
        }
    };
    state.metrics().record_step_accepted(form_id.as_str(), &step.slug);

    let token = state.session_token(&headers);
    let persisted = match state.manager().merge_and_persist(&token, &form_id, data).await {
        Ok(persisted) => persisted,
        Err(e) => {
            state.metrics().record_store_error("merge_and_persist");
            return Err(e.into());
        }
    };
    state
        .metrics()
        .record_session_persisted(form_id.as_str(), persisted.outcome.as_str());

    let location = match config.next_step(&step.slug) {
        Some(next) => step_url(&form_id, &next.slug),
        None => step_url(&form_id, "checkout"),
    };
    redirect_with_token(&state, &location, &persisted.token)
}

async fn show_checkout(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
    headers: HeaderMap,
) -> HandlerResult<Response> {
    let form_id = FormId::new(form_id);
    let catalog = state.catalog().await;
    let config = catalog.validate_form(&form_id)?;

    let token = state.session_token(&headers);
    let form_data = resolve_data(&state, &token, &form_id).await?.unwrap_or_default();

    let view = CheckoutView {
        form_id: &form_id,
        meta: config.checkout_meta(),
        form_data,
    };
    Ok(Json(view).into_response())
}

async fn submit_checkout(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
    headers: HeaderMap,
) -> HandlerResult<Response> {
    let form_id = FormId::new(form_id);
    let catalog = state.catalog().await;
    catalog.validate_form(&form_id)?;

    let token = state.session_token(&headers);
    let (token, completed) = match state.manager().complete(&token, &form_id).await {
        Ok(result) => result,
        Err(e) => {
            state.metrics().record_store_error("complete");
            return Err(e.into());
        }
    };
    if completed.is_some() {
        state.metrics().record_session_completed(form_id.as_str());
    }

    redirect_with_token(&state, &step_url(&form_id, "finished"), &token)
}

async fn show_finished(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
) -> HandlerResult<Response> {
    let form_id = FormId::new(form_id);
    let catalog = state.catalog().await;
    let config = catalog.validate_form(&form_id)?;

    let view = FinishedView {
        form_id: &form_id,
        meta: config.finished_meta(),
    };
    Ok(Json(view).into_response())
}
