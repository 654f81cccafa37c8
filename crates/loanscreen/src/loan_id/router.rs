use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use chrono::Utc;

use super::{extract_suffix, is_valid_format, parts, qr_payload, samples, MAX_SAMPLES};

/// Router builder exposing display id formatting and validation.
pub fn loan_id_router() -> Router {
    Router::new()
        .route("/api/v1/loan-ids/samples", get(samples_handler))
        .route("/api/v1/loan-ids/:loan_id", get(format_handler))
        .route("/api/v1/loan-ids/:loan_id/validate", get(validate_handler))
        .route("/api/v1/loan-ids/:loan_id/qr", get(qr_handler))
}

#[derive(Debug, Deserialize)]
pub(crate) struct SamplesParams {
    #[serde(default = "default_sample_count")]
    pub(crate) count: u32,
}

fn default_sample_count() -> u32 {
    10
}

#[derive(Debug, Serialize)]
pub(crate) struct ValidationView {
    pub(crate) display_id: String,
    pub(crate) valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) suffix: Option<String>,
}

fn parse_internal_id(raw: &str) -> Result<i64, Response> {
    raw.trim().parse::<i64>().map_err(|_| {
        let payload = json!({
            "error": "internal loan id must be an integer",
            "internal_id": raw,
        });
        (StatusCode::BAD_REQUEST, Json(payload)).into_response()
    })
}

pub(crate) async fn format_handler(Path(internal_id): Path<String>) -> Response {
    match parse_internal_id(&internal_id) {
        Ok(internal_id) => (StatusCode::OK, Json(parts(internal_id))).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn qr_handler(Path(internal_id): Path<String>) -> Response {
    match parse_internal_id(&internal_id) {
        Ok(internal_id) => {
            (StatusCode::OK, Json(qr_payload(internal_id, Utc::now()))).into_response()
        }
        Err(response) => response,
    }
}

pub(crate) async fn validate_handler(Path(display_id): Path<String>) -> Json<ValidationView> {
    Json(ValidationView {
        valid: is_valid_format(&display_id),
        suffix: extract_suffix(&display_id).map(str::to_string),
        display_id,
    })
}

pub(crate) async fn samples_handler(Query(params): Query<SamplesParams>) -> Response {
    if params.count > MAX_SAMPLES {
        let payload = json!({
            "error": format!("count must be at most {MAX_SAMPLES}"),
        });
        return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
    }
    (StatusCode::OK, Json(samples(params.count))).into_response()
}
