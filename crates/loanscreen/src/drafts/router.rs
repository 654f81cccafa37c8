use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use super::domain::{ApplicantId, DraftFormData, DraftId, DraftInput};
use super::progress::completion_percentage;
use super::store::DraftStore;
use crate::storage::KeyValueStore;

/// Router builder exposing the draft store over HTTP.
pub fn draft_router<S>(store: Arc<DraftStore<S>>) -> Router
where
    S: KeyValueStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/drafts",
            post(save_handler::<S>)
                .get(list_handler::<S>)
                .delete(clear_handler::<S>),
        )
        .route("/api/v1/drafts/completion", post(completion_handler))
        .route(
            "/api/v1/drafts/:draft_id",
            get(fetch_handler::<S>).delete(remove_handler::<S>),
        )
        .route(
            "/api/v1/applicants/:applicant_id/drafts/latest",
            get(latest_handler::<S>),
        )
        .with_state(store)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListParams {
    #[serde(default)]
    pub(crate) applicant_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CompletionRequest {
    #[serde(default)]
    pub(crate) form_data: DraftFormData,
    pub(crate) current_step: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CompletionResponse {
    pub(crate) completion_percentage: u8,
}

pub(crate) async fn save_handler<S>(
    State(store): State<Arc<DraftStore<S>>>,
    Json(input): Json<DraftInput>,
) -> Response
where
    S: KeyValueStore + 'static,
{
    match blocking(store, move |store| store.save(input)).await {
        Ok(id) => (StatusCode::CREATED, Json(json!({ "id": id }))).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn list_handler<S>(
    State(store): State<Arc<DraftStore<S>>>,
    Query(params): Query<ListParams>,
) -> Response
where
    S: KeyValueStore + 'static,
{
    let drafts = blocking(store, move |store| match params.applicant_id {
        Some(applicant) => store.for_applicant(ApplicantId(applicant)),
        None => store.list(),
    })
    .await;

    match drafts {
        Ok(drafts) => {
            let now = Utc::now();
            let views: Vec<_> = drafts.iter().map(|draft| draft.summary_view(now)).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(response) => response,
    }
}

pub(crate) async fn fetch_handler<S>(
    State(store): State<Arc<DraftStore<S>>>,
    Path(draft_id): Path<String>,
) -> Response
where
    S: KeyValueStore + 'static,
{
    let id = DraftId(draft_id.clone());
    match blocking(store, move |store| store.get(&id)).await {
        Ok(Some(draft)) => (StatusCode::OK, Json(draft)).into_response(),
        Ok(None) => draft_not_found(&draft_id),
        Err(response) => response,
    }
}

pub(crate) async fn remove_handler<S>(
    State(store): State<Arc<DraftStore<S>>>,
    Path(draft_id): Path<String>,
) -> Response
where
    S: KeyValueStore + 'static,
{
    let id = DraftId(draft_id);
    match blocking(store, move |store| store.remove(&id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn clear_handler<S>(State(store): State<Arc<DraftStore<S>>>) -> Response
where
    S: KeyValueStore + 'static,
{
    match blocking(store, |store| store.clear()).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn latest_handler<S>(
    State(store): State<Arc<DraftStore<S>>>,
    Path(applicant_id): Path<i64>,
) -> Response
where
    S: KeyValueStore + 'static,
{
    let applicant = ApplicantId(applicant_id);
    match blocking(store, move |store| store.latest_for_applicant(applicant)).await {
        Ok(Some(draft)) => (StatusCode::OK, Json(draft)).into_response(),
        Ok(None) => {
            let payload = json!({
                "error": "no drafts for applicant",
                "applicant_id": applicant_id,
            });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        Err(response) => response,
    }
}

pub(crate) async fn completion_handler(
    Json(request): Json<CompletionRequest>,
) -> Json<CompletionResponse> {
    Json(CompletionResponse {
        completion_percentage: completion_percentage(&request.form_data, request.current_step),
    })
}

fn draft_not_found(draft_id: &str) -> Response {
    let payload = json!({
        "error": "draft not found",
        "draft_id": draft_id,
    });
    (StatusCode::NOT_FOUND, Json(payload)).into_response()
}

/// Runs a store call on the blocking pool; file-backed stores do synchronous I/O.
async fn blocking<S, T, F>(store: Arc<DraftStore<S>>, op: F) -> Result<T, Response>
where
    S: KeyValueStore + 'static,
    T: Send + 'static,
    F: FnOnce(&DraftStore<S>) -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || op(&store))
        .await
        .map_err(|err| {
            warn!(error = %err, "draft store task failed");
            let payload = json!({ "error": "draft store unavailable" });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        })
}
