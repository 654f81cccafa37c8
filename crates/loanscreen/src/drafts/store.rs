use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};
use uuid::Uuid;

use super::domain::{ApplicantId, DraftApplication, DraftId, DraftInput};
use crate::storage::KeyValueStore;

/// Storage key holding the JSON array of drafts.
pub const DRAFTS_KEY: &str = "loanApplicationDrafts";
pub const DEFAULT_DRAFT_LIMIT: usize = 10;

/// Draft persistence on top of a key/value store.
///
/// Storage failures never reach callers: reads degrade to "no drafts" and writes are
/// dropped, both with a warning. Array entries that do not decode as drafts are hidden
/// from readers but written back untouched. Read-modify-write cycles are serialized per
/// store, but separate stores over the same backend remain last-write-wins.
pub struct DraftStore<S> {
    storage: Arc<S>,
    limit: usize,
    write_lock: Mutex<()>,
    changes: watch::Sender<Vec<DraftApplication>>,
}

impl<S> DraftStore<S>
where
    S: KeyValueStore + 'static,
{
    pub fn new(storage: Arc<S>) -> Self {
        Self::with_limit(storage, DEFAULT_DRAFT_LIMIT)
    }

    /// Store retaining at most `limit` drafts (at least one).
    pub fn with_limit(storage: Arc<S>, limit: usize) -> Self {
        let initial = read_drafts(storage.as_ref());
        let (changes, _) = watch::channel(initial);
        Self {
            storage,
            limit: limit.max(1),
            write_lock: Mutex::new(()),
            changes,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Save or update a draft, returning the identifier it was stored under.
    pub fn save(&self, input: DraftInput) -> DraftId {
        self.save_at(input, Utc::now())
    }

    /// `save` with an explicit clock reading.
    pub fn save_at(&self, input: DraftInput, now: DateTime<Utc>) -> DraftId {
        let _guard = self.lock();
        let mut entries = read_entries(self.storage.as_ref());

        let id = input
            .id
            .clone()
            .filter(|id| !id.0.is_empty())
            .unwrap_or_else(|| generate_draft_id(now));
        let existing = entries
            .iter()
            .position(|entry| entry.draft().is_some_and(|draft| draft.id == id));
        let created_at = input
            .created_at
            .or_else(|| {
                existing
                    .and_then(|index| entries[index].draft())
                    .map(|draft| draft.created_at)
            })
            .unwrap_or(now);
        let draft = StoredEntry::Draft(Box::new(input.into_draft(id.clone(), created_at, now)));

        match existing {
            Some(index) => entries[index] = draft,
            None => entries.insert(0, draft),
        }

        if entries.len() > self.limit {
            let evicted = entries.len() - self.limit;
            entries.truncate(self.limit);
            debug!(evicted, limit = self.limit, "evicted oldest drafts");
        }

        self.publish(entries);
        debug!(draft_id = %id.0, "draft saved");
        id
    }

    /// All drafts, newest insertions first. Never fails.
    pub fn list(&self) -> Vec<DraftApplication> {
        read_drafts(self.storage.as_ref())
    }

    pub fn get(&self, id: &DraftId) -> Option<DraftApplication> {
        self.list().into_iter().find(|draft| &draft.id == id)
    }

    pub fn remove(&self, id: &DraftId) {
        let _guard = self.lock();
        let mut entries = read_entries(self.storage.as_ref());
        entries.retain(|entry| !entry.draft().is_some_and(|draft| &draft.id == id));
        self.publish(entries);
    }

    pub fn clear(&self) {
        let _guard = self.lock();
        if let Err(err) = self.storage.remove(DRAFTS_KEY) {
            warn!(error = %err, "failed to clear drafts");
        }
        self.changes.send_replace(Vec::new());
    }

    pub fn for_applicant(&self, applicant: ApplicantId) -> Vec<DraftApplication> {
        self.list()
            .into_iter()
            .filter(|draft| draft.applicant_id == applicant)
            .collect()
    }

    pub fn has_drafts(&self, applicant: ApplicantId) -> bool {
        self.list()
            .iter()
            .any(|draft| draft.applicant_id == applicant)
    }

    pub fn latest_for_applicant(&self, applicant: ApplicantId) -> Option<DraftApplication> {
        self.list()
            .into_iter()
            .find(|draft| draft.applicant_id == applicant)
    }

    /// Change feed carrying the full list after every save, removal or clear.
    pub fn subscribe(&self) -> watch::Receiver<Vec<DraftApplication>> {
        self.changes.subscribe()
    }

    fn publish(&self, entries: Vec<StoredEntry>) {
        match serde_json::to_string(&entries) {
            Ok(raw) => {
                if let Err(err) = self.storage.set(DRAFTS_KEY, &raw) {
                    warn!(error = %err, "failed to persist drafts");
                }
            }
            Err(err) => warn!(error = %err, "failed to serialize drafts"),
        }
        self.changes.send_replace(into_drafts(entries));
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// One element of the persisted array.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum StoredEntry {
    Draft(Box<DraftApplication>),
    Unreadable(Value),
}

impl StoredEntry {
    fn decode(value: Value) -> Self {
        match DraftApplication::deserialize(&value) {
            Ok(draft) => StoredEntry::Draft(Box::new(draft)),
            Err(err) => {
                warn!(error = %err, "skipping unreadable draft entry");
                StoredEntry::Unreadable(value)
            }
        }
    }

    fn draft(&self) -> Option<&DraftApplication> {
        match self {
            StoredEntry::Draft(draft) => Some(draft.as_ref()),
            StoredEntry::Unreadable(_) => None,
        }
    }
}

fn into_drafts(entries: Vec<StoredEntry>) -> Vec<DraftApplication> {
    entries
        .into_iter()
        .filter_map(|entry| match entry {
            StoredEntry::Draft(draft) => Some(*draft),
            StoredEntry::Unreadable(_) => None,
        })
        .collect()
}

fn read_drafts<S: KeyValueStore + ?Sized>(storage: &S) -> Vec<DraftApplication> {
    into_drafts(read_entries(storage))
}

fn read_entries<S: KeyValueStore + ?Sized>(storage: &S) -> Vec<StoredEntry> {
    match storage.get(DRAFTS_KEY) {
        Ok(Some(raw)) => match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(values) => values.into_iter().map(StoredEntry::decode).collect(),
            Err(err) => {
                warn!(error = %err, "stored drafts are corrupt; ignoring them");
                Vec::new()
            }
        },
        Ok(None) => Vec::new(),
        Err(err) => {
            warn!(error = %err, "draft storage unavailable");
            Vec::new()
        }
    }
}

/// `draft_<unix millis>_<9 random chars>`.
fn generate_draft_id(now: DateTime<Utc>) -> DraftId {
    let suffix = Uuid::new_v4().simple().to_string();
    DraftId(format!("draft_{}_{}", now.timestamp_millis(), &suffix[..9]))
}
