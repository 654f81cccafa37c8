use std::sync::Arc;

use axum::body::to_bytes;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};

use crate::drafts::domain::{ApplicantId, DraftFormData, DraftInput, LoanTypeSelection};
use crate::drafts::store::{DraftStore, DRAFTS_KEY};
use crate::storage::{KeyValueStore, MemoryStore, StorageError};

pub(super) fn at(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, hour, minute, second)
        .single()
        .expect("valid timestamp")
}

pub(super) fn memory_store() -> (DraftStore<MemoryStore>, MemoryStore) {
    let backend = MemoryStore::default();
    let store = DraftStore::new(Arc::new(backend.clone()));
    (store, backend)
}

pub(super) fn home_loan() -> LoanTypeSelection {
    let mut details = serde_json::Map::new();
    details.insert("maxTenureYears".to_string(), json!(30));
    LoanTypeSelection {
        id: Some(json!(2)),
        name: Some("Home Loan".to_string()),
        details,
    }
}

/// Nine fields in total, four of them filled.
pub(super) fn partially_filled_form() -> DraftFormData {
    let value = json!({
        "loanTypeForm": { "loanType": "HOME" },
        "personalDetailsForm": {
            "firstName": "Priya",
            "lastName": "Sharma",
            "panNumber": "",
            "phone": null
        },
        "loanDetailsForm": { "loanAmount": 2500000, "tenureMonths": null },
        "financialDetailsForm": { "monthlyIncome": "" },
        "documentsForm": { "panCard": null }
    });
    serde_json::from_value(value).expect("valid form data")
}

pub(super) fn applicant_input(applicant: i64) -> DraftInput {
    DraftInput {
        applicant_id: Some(ApplicantId(applicant)),
        current_step: Some(3),
        selected_loan_type: Some(home_loan().into()),
        form_data: Some(partially_filled_form()),
        ..DraftInput::default()
    }
}

pub(super) fn corrupt_store() -> MemoryStore {
    let backend = MemoryStore::default();
    backend
        .set(DRAFTS_KEY, "{not json")
        .expect("memory store accepts writes");
    backend
}

/// Backend where every call fails, standing in for disabled browser storage.
#[derive(Default)]
pub(super) struct UnavailableStore;

impl KeyValueStore for UnavailableStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("storage disabled".to_string()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("storage disabled".to_string()))
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("storage disabled".to_string()))
    }
}

pub(super) async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}
