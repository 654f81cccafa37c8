use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use loanscreen::config::StorageConfig;
use loanscreen::drafts::DraftStore;
use loanscreen::error::AppError;
use loanscreen::search::SearchPreferences;
use loanscreen::storage::{FileStore, KeyValueStore};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Draft store and search preferences sharing one backend.
pub(crate) struct Stores<S> {
    pub(crate) drafts: Arc<DraftStore<S>>,
    pub(crate) search: Arc<SearchPreferences<S>>,
}

impl<S> Stores<S>
where
    S: KeyValueStore + 'static,
{
    pub(crate) fn new(storage: Arc<S>, draft_limit: usize) -> Self {
        Self {
            drafts: Arc::new(DraftStore::with_limit(storage.clone(), draft_limit)),
            search: Arc::new(SearchPreferences::new(storage)),
        }
    }
}

pub(crate) fn file_stores(config: &StorageConfig) -> Result<Stores<FileStore>, AppError> {
    let storage = Arc::new(FileStore::open(&config.data_dir)?);
    Ok(Stores::new(storage, config.draft_limit))
}
