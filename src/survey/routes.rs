//! REST endpoints for driving survey sessions.
//!
//! These routes do not authenticate anyone. `POST .../sign-in` trusts the
//! identity in its body, so the router must only be reachable through the
//! login proxy that verified that identity.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Identity;
use crate::error::{Error, WizardError};

use super::model::{LivingSituation, Location, MealFrequency, UserType};
use super::registry::{SessionEntry, SessionRegistry};

/// User-facing notice for any sign-in failure.
const SIGN_IN_FAILED: &str = "Login failed. Please try again.";
/// User-facing notice for any submission failure.
const SUBMIT_FAILED: &str = "Something went wrong. Please check your internet connection.";

/// Shared state for survey routes.
#[derive(Clone)]
pub struct SurveyRouteState {
    pub registry: Arc<SessionRegistry>,
}

/// Request body carrying a single value.
#[derive(Debug, Deserialize)]
struct ValueBody<T> {
    value: T,
}

fn error_body(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({ "error": message.into() })),
    )
        .into_response()
}

/// Map a service error to an HTTP response.
fn error_response(err: Error) -> Response {
    match err {
        Error::Wizard(WizardError::OptionUnavailable { option }) => error_body(
            StatusCode::BAD_REQUEST,
            format!("Option {option} is not available yet"),
        ),
        Error::Wizard(e) => error_body(StatusCode::CONFLICT, e.to_string()),
        Error::Auth(_) => error_body(StatusCode::BAD_GATEWAY, SIGN_IN_FAILED),
        Error::Submit(_) => error_body(StatusCode::BAD_GATEWAY, SUBMIT_FAILED),
    }
}

fn not_found(id: Uuid) -> Response {
    error_body(StatusCode::NOT_FOUND, format!("No session {id}"))
}

async fn lookup(state: &SurveyRouteState, id: Uuid) -> Result<Arc<SessionEntry>, Response> {
    state.registry.get(id).await.ok_or_else(|| not_found(id))
}

/// Render the session, or the error if the action failed.
async fn respond<T, E>(entry: &SessionEntry, result: Result<T, E>) -> Response
where
    E: Into<Error>,
{
    match result {
        Ok(_) => Json(entry.session.view().await).into_response(),
        Err(e) => error_response(e.into()),
    }
}

// ── Sessions ────────────────────────────────────────────────────────────

/// POST /api/sessions
async fn create_session(State(state): State<SurveyRouteState>) -> impl IntoResponse {
    let entry = state.registry.create().await;
    (StatusCode::CREATED, Json(entry.session.view().await))
}

/// GET /api/sessions/{id}
async fn get_session(State(state): State<SurveyRouteState>, Path(id): Path<Uuid>) -> Response {
    match lookup(&state, id).await {
        Ok(entry) => Json(entry.session.view().await).into_response(),
        Err(resp) => resp,
    }
}

/// DELETE /api/sessions/{id}
async fn delete_session(State(state): State<SurveyRouteState>, Path(id): Path<Uuid>) -> Response {
    if state.registry.remove(id).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found(id)
    }
}

// ── Identity ────────────────────────────────────────────────────────────

/// POST /api/sessions/{id}/sign-in
///
/// The body carries the identity an upstream login proxy has verified.
/// Its `uid` is stored as-is on the submission record.
async fn sign_in(
    State(state): State<SurveyRouteState>,
    Path(id): Path<Uuid>,
    Json(identity): Json<Identity>,
) -> Response {
    let entry = match lookup(&state, id).await {
        Ok(entry) => entry,
        Err(resp) => return resp,
    };
    entry.identity.stage(identity).await;
    let result = entry.session.sign_in().await;
    respond(&entry, result).await
}

/// POST /api/sessions/{id}/sign-out
async fn sign_out(State(state): State<SurveyRouteState>, Path(id): Path<Uuid>) -> Response {
    let entry = match lookup(&state, id).await {
        Ok(entry) => entry,
        Err(resp) => return resp,
    };
    let result = entry.session.sign_out().await;
    respond(&entry, result).await
}

// ── Navigation ──────────────────────────────────────────────────────────

async fn continue_next(State(state): State<SurveyRouteState>, Path(id): Path<Uuid>) -> Response {
    let entry = match lookup(&state, id).await {
        Ok(entry) => entry,
        Err(resp) => return resp,
    };
    let result = entry.session.continue_next().await;
    respond(&entry, result).await
}

async fn go_back(State(state): State<SurveyRouteState>, Path(id): Path<Uuid>) -> Response {
    let entry = match lookup(&state, id).await {
        Ok(entry) => entry,
        Err(resp) => return resp,
    };
    let result = entry.session.go_back().await;
    respond(&entry, result).await
}

async fn select_user_type(
    State(state): State<SurveyRouteState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ValueBody<UserType>>,
) -> Response {
    let entry = match lookup(&state, id).await {
        Ok(entry) => entry,
        Err(resp) => return resp,
    };
    let result = entry.session.select_user_type(body.value).await;
    respond(&entry, result).await
}

async fn select_living_situation(
    State(state): State<SurveyRouteState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ValueBody<LivingSituation>>,
) -> Response {
    let entry = match lookup(&state, id).await {
        Ok(entry) => entry,
        Err(resp) => return resp,
    };
    let result = entry.session.select_living_situation(body.value).await;
    respond(&entry, result).await
}

async fn select_location(
    State(state): State<SurveyRouteState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ValueBody<Location>>,
) -> Response {
    let entry = match lookup(&state, id).await {
        Ok(entry) => entry,
        Err(resp) => return resp,
    };
    let result = entry.session.select_location(body.value).await;
    respond(&entry, result).await
}

// ── Meal plan, budget, contact ──────────────────────────────────────────

async fn set_meal_frequency(
    State(state): State<SurveyRouteState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ValueBody<MealFrequency>>,
) -> Response {
    let entry = match lookup(&state, id).await {
        Ok(entry) => entry,
        Err(resp) => return resp,
    };
    let result = entry.session.set_meal_frequency(body.value).await;
    respond(&entry, result).await
}

async fn toggle_premium(State(state): State<SurveyRouteState>, Path(id): Path<Uuid>) -> Response {
    let entry = match lookup(&state, id).await {
        Ok(entry) => entry,
        Err(resp) => return resp,
    };
    let result = entry.session.toggle_premium().await;
    respond(&entry, result).await
}

async fn toggle_protein(State(state): State<SurveyRouteState>, Path(id): Path<Uuid>) -> Response {
    let entry = match lookup(&state, id).await {
        Ok(entry) => entry,
        Err(resp) => return resp,
    };
    let result = entry.session.toggle_protein().await;
    respond(&entry, result).await
}

async fn toggle_extra_serving(
    State(state): State<SurveyRouteState>,
    Path(id): Path<Uuid>,
) -> Response {
    let entry = match lookup(&state, id).await {
        Ok(entry) => entry,
        Err(resp) => return resp,
    };
    let result = entry.session.toggle_extra_serving().await;
    respond(&entry, result).await
}

async fn set_budget(
    State(state): State<SurveyRouteState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ValueBody<u32>>,
) -> Response {
    let entry = match lookup(&state, id).await {
        Ok(entry) => entry,
        Err(resp) => return resp,
    };
    let result = entry.session.set_budget(body.value).await;
    respond(&entry, result).await
}

async fn set_contact(
    State(state): State<SurveyRouteState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ValueBody<String>>,
) -> Response {
    let entry = match lookup(&state, id).await {
        Ok(entry) => entry,
        Err(resp) => return resp,
    };
    let result = entry.session.set_contact(&body.value).await;
    respond(&entry, result).await
}

async fn toggle_trial(State(state): State<SurveyRouteState>, Path(id): Path<Uuid>) -> Response {
    let entry = match lookup(&state, id).await {
        Ok(entry) => entry,
        Err(resp) => return resp,
    };
    let result = entry.session.toggle_trial().await;
    respond(&entry, result).await
}

/// POST /api/sessions/{id}/submit
async fn submit(State(state): State<SurveyRouteState>, Path(id): Path<Uuid>) -> Response {
    let entry = match lookup(&state, id).await {
        Ok(entry) => entry,
        Err(resp) => return resp,
    };
    let result = entry.session.submit().await;
    respond(&entry, result).await
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Build the survey REST routes.
pub fn survey_routes(state: SurveyRouteState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session).delete(delete_session))
        .route("/api/sessions/{id}/sign-in", post(sign_in))
        .route("/api/sessions/{id}/sign-out", post(sign_out))
        .route("/api/sessions/{id}/continue", post(continue_next))
        .route("/api/sessions/{id}/back", post(go_back))
        .route("/api/sessions/{id}/user-type", post(select_user_type))
        .route("/api/sessions/{id}/living-situation", post(select_living_situation))
        .route("/api/sessions/{id}/location", post(select_location))
        .route("/api/sessions/{id}/meal-frequency", post(set_meal_frequency))
        .route("/api/sessions/{id}/add-ons/premium", post(toggle_premium))
        .route("/api/sessions/{id}/add-ons/protein", post(toggle_protein))
        .route("/api/sessions/{id}/add-ons/extra-serving", post(toggle_extra_serving))
        .route("/api/sessions/{id}/budget", post(set_budget))
        .route("/api/sessions/{id}/contact", post(set_contact))
        .route("/api/sessions/{id}/trial", post(toggle_trial))
        .route("/api/sessions/{id}/submit", post(submit))
        .with_state(state)
}
