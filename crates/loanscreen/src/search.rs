//! Saved filter and sort state for the advanced search panels.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::storage::KeyValueStore;

/// Screens that keep their own search state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchContext {
    Applicants,
    Loans,
    Officers,
    General,
}

impl SearchContext {
    pub const fn label(self) -> &'static str {
        match self {
            SearchContext::Applicants => "applicants",
            SearchContext::Loans => "loans",
            SearchContext::Officers => "officers",
            SearchContext::General => "general",
        }
    }

    pub fn storage_key(self) -> String {
        format!("advanced_search_{}", self.label())
    }
}

impl fmt::Display for SearchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown search context '{0}'")]
pub struct UnknownSearchContext(pub String);

impl FromStr for SearchContext {
    type Err = UnknownSearchContext;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "applicants" => Ok(Self::Applicants),
            "loans" => Ok(Self::Loans),
            "officers" => Ok(Self::Officers),
            "general" => Ok(Self::General),
            _ => Err(UnknownSearchContext(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Persisted search state for one context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SavedSearch {
    pub filters: Map<String, Value>,
    pub sort_by: String,
    pub sort_order: SortOrder,
}

impl SavedSearch {
    pub fn active_filter_count(&self) -> usize {
        active_filter_count(&self.filters)
    }
}

/// Filters carrying a usable value: not null, not `""`, not an empty list.
pub fn active_filter_count(filters: &Map<String, Value>) -> usize {
    filters
        .values()
        .filter(|value| match value {
            Value::Null => false,
            Value::String(text) => !text.is_empty(),
            Value::Array(items) => !items.is_empty(),
            _ => true,
        })
        .count()
}

/// Per-context search preferences. Storage problems are logged and ignored.
pub struct SearchPreferences<S> {
    storage: Arc<S>,
}

impl<S> SearchPreferences<S>
where
    S: KeyValueStore + 'static,
{
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    pub fn load(&self, context: SearchContext) -> SavedSearch {
        match self.storage.get(&context.storage_key()) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!(%context, error = %err, "saved search is corrupt; using defaults");
                SavedSearch::default()
            }),
            Ok(None) => SavedSearch::default(),
            Err(err) => {
                warn!(%context, error = %err, "failed to load saved search");
                SavedSearch::default()
            }
        }
    }

    pub fn save(&self, context: SearchContext, search: &SavedSearch) {
        let raw = match serde_json::to_string(search) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(%context, error = %err, "failed to serialize saved search");
                return;
            }
        };
        if let Err(err) = self.storage.set(&context.storage_key(), &raw) {
            warn!(%context, error = %err, "failed to save search filters");
        }
    }

    pub fn clear(&self, context: SearchContext) {
        if let Err(err) = self.storage.remove(&context.storage_key()) {
            warn!(%context, error = %err, "failed to clear search filters");
        }
    }
}

/// Router builder exposing saved search state per context.
pub fn search_router<S>(preferences: Arc<SearchPreferences<S>>) -> Router
where
    S: KeyValueStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/search/:context",
            get(load_handler::<S>)
                .put(save_handler::<S>)
                .delete(clear_handler::<S>),
        )
        .with_state(preferences)
}

#[derive(Debug, Serialize)]
struct SavedSearchView {
    context: SearchContext,
    active_filter_count: usize,
    #[serde(flatten)]
    search: SavedSearch,
}

fn parse_context(raw: &str) -> Result<SearchContext, Response> {
    raw.parse().map_err(|err: UnknownSearchContext| {
        let payload = json!({ "error": err.to_string() });
        (StatusCode::NOT_FOUND, Json(payload)).into_response()
    })
}

async fn load_handler<S>(
    State(preferences): State<Arc<SearchPreferences<S>>>,
    Path(context): Path<String>,
) -> Response
where
    S: KeyValueStore + 'static,
{
    let context = match parse_context(&context) {
        Ok(context) => context,
        Err(response) => return response,
    };
    let search = preferences.load(context);
    let view = SavedSearchView {
        context,
        active_filter_count: search.active_filter_count(),
        search,
    };
    (StatusCode::OK, Json(view)).into_response()
}

async fn save_handler<S>(
    State(preferences): State<Arc<SearchPreferences<S>>>,
    Path(context): Path<String>,
    Json(search): Json<SavedSearch>,
) -> Response
where
    S: KeyValueStore + 'static,
{
    match parse_context(&context) {
        Ok(context) => {
            preferences.save(context, &search);
            StatusCode::NO_CONTENT.into_response()
        }
        Err(response) => response,
    }
}

async fn clear_handler<S>(
    State(preferences): State<Arc<SearchPreferences<S>>>,
    Path(context): Path<String>,
) -> Response
where
    S: KeyValueStore + 'static,
{
    match parse_context(&context) {
        Ok(context) => {
            preferences.clear(context);
            StatusCode::NO_CONTENT.into_response()
        }
        Err(response) => response,
    }
}
