use super::common::*;
use std::sync::Arc;

use chrono::Duration;
use serde_json::json;

use crate::drafts::domain::{ApplicantId, DraftFormData, DraftId, DraftInput, SelectedLoanType};
use crate::drafts::store::{DraftStore, DRAFTS_KEY};
use crate::storage::{KeyValueStore, MemoryStore};

#[test]
fn save_fills_defaults_for_empty_input() {
    let (store, _) = memory_store();
    let now = at(9, 0, 0);

    let id = store.save_at(DraftInput::default(), now);
    let draft = store.get(&id).expect("draft stored");

    assert!(id.0.starts_with(&format!("draft_{}_", now.timestamp_millis())));
    assert_eq!(id.0.rsplit('_').next().map(str::len), Some(9));
    assert_eq!(draft.applicant_id, ApplicantId(0));
    assert_eq!(draft.current_step, 1);
    assert_eq!(draft.total_steps, 6);
    assert_eq!(draft.completion_percentage, 0);
    assert_eq!(draft.form_data, DraftFormData::default());
    assert_eq!(draft.selected_loan_type, None);
    assert_eq!(draft.created_at, now);
    assert_eq!(draft.last_saved, now);
    assert_eq!(draft.title, "Loan Application Draft");
    assert_eq!(draft.description, "Stopped at Loan Type (Step 1 of 6)");
}

#[test]
fn save_keeps_supplied_fields_and_derives_the_rest() {
    let (store, _) = memory_store();

    let id = store.save_at(applicant_input(42), at(9, 0, 0));
    let draft = store.get(&id).expect("draft stored");

    assert_eq!(draft.applicant_id, ApplicantId(42));
    assert_eq!(draft.current_step, 3);
    assert_eq!(draft.selected_loan_type, Some(home_loan().into()));
    assert_eq!(draft.form_data, partially_filled_form());
    assert_eq!(draft.completion_percentage, 48);
    assert_eq!(draft.title, "Home Loan Application");
    assert_eq!(draft.description, "Stopped at Loan Details (Step 3 of 6)");
}

#[test]
fn explicit_title_description_and_percentage_win() {
    let (store, _) = memory_store();
    let input = DraftInput {
        title: Some("Renovation".to_string()),
        description: Some("Waiting on salary slips".to_string()),
        completion_percentage: Some(70),
        ..applicant_input(7)
    };

    let id = store.save_at(input, at(9, 0, 0));
    let draft = store.get(&id).expect("draft stored");

    assert_eq!(draft.title, "Renovation");
    assert_eq!(draft.description, "Waiting on salary slips");
    assert_eq!(draft.completion_percentage, 70);
}

#[test]
fn updating_replaces_in_place_and_preserves_creation_time() {
    let (store, _) = memory_store();
    let first = store.save_at(applicant_input(1), at(9, 0, 0));
    let second = store.save_at(applicant_input(2), at(9, 5, 0));

    let update = DraftInput {
        id: Some(first.clone()),
        current_step: Some(5),
        ..applicant_input(1)
    };
    let returned = store.save_at(update, at(10, 0, 0));

    assert_eq!(returned, first);
    let drafts = store.list();
    assert_eq!(drafts.len(), 2);
    assert_eq!(drafts[0].id, second);
    assert_eq!(drafts[1].id, first);
    assert_eq!(drafts[1].current_step, 5);
    assert_eq!(drafts[1].created_at, at(9, 0, 0));
    assert_eq!(drafts[1].last_saved, at(10, 0, 0));
}

#[test]
fn unknown_supplied_id_is_kept_for_new_drafts() {
    let (store, _) = memory_store();
    let input = DraftInput {
        id: Some(DraftId("draft_resumed".to_string())),
        ..DraftInput::default()
    };

    let id = store.save_at(input, at(9, 0, 0));

    assert_eq!(id, DraftId("draft_resumed".to_string()));
    assert!(store.get(&id).is_some());
}

#[test]
fn eleventh_save_evicts_the_oldest() {
    let (store, _) = memory_store();
    let start = at(8, 0, 0);
    let ids: Vec<DraftId> = (0..11)
        .map(|offset| store.save_at(applicant_input(offset), start + Duration::minutes(offset)))
        .collect();

    let drafts = store.list();
    assert_eq!(drafts.len(), 10);
    assert!(store.get(&ids[0]).is_none(), "oldest draft evicted");
    let listed: Vec<&DraftId> = drafts.iter().map(|draft| &draft.id).collect();
    let expected: Vec<&DraftId> = ids[1..].iter().rev().collect();
    assert_eq!(listed, expected);
}

#[test]
fn custom_limit_is_respected() {
    let store = DraftStore::with_limit(Arc::new(MemoryStore::default()), 2);
    for applicant in 0..4 {
        store.save_at(applicant_input(applicant), at(9, 0, 0));
    }
    assert_eq!(store.limit(), 2);
    assert_eq!(store.list().len(), 2);

    let floor = DraftStore::with_limit(Arc::new(MemoryStore::default()), 0);
    assert_eq!(floor.limit(), 1);
}

#[test]
fn list_is_empty_for_missing_corrupt_or_unavailable_storage() {
    let (store, _) = memory_store();
    assert!(store.list().is_empty());

    let corrupt = DraftStore::new(Arc::new(corrupt_store()));
    assert!(corrupt.list().is_empty());
    assert!(corrupt.get(&DraftId("anything".to_string())).is_none());

    let unavailable = DraftStore::new(Arc::new(UnavailableStore));
    assert!(unavailable.list().is_empty());
}

#[test]
fn saving_over_corrupt_storage_starts_a_fresh_list() {
    let backend = corrupt_store();
    let store = DraftStore::new(Arc::new(backend.clone()));

    let id = store.save_at(applicant_input(3), at(9, 0, 0));

    assert_eq!(store.list().len(), 1);
    assert!(store.get(&id).is_some());
    let raw = backend.get(DRAFTS_KEY).expect("get").expect("persisted");
    assert!(raw.starts_with('['));
}

#[test]
fn write_failures_are_swallowed() {
    let store = DraftStore::new(Arc::new(UnavailableStore));
    let id = store.save_at(applicant_input(3), at(9, 0, 0));
    assert!(!id.0.is_empty());
    store.remove(&id);
    store.clear();
    assert!(store.list().is_empty());

    let quota = DraftStore::new(Arc::new(MemoryStore::with_quota(16)));
    quota.save_at(applicant_input(3), at(9, 0, 0));
    assert!(quota.list().is_empty(), "write over quota was dropped");
}

#[test]
fn remove_and_clear_delete_drafts() {
    let (store, backend) = memory_store();
    let first = store.save_at(applicant_input(1), at(9, 0, 0));
    let second = store.save_at(applicant_input(1), at(9, 1, 0));

    store.remove(&first);
    store.remove(&DraftId("missing".to_string()));
    assert!(store.get(&first).is_none());
    assert!(store.get(&second).is_some());

    store.clear();
    assert!(store.list().is_empty());
    assert_eq!(backend.get(DRAFTS_KEY).expect("get"), None);
}

#[test]
fn applicant_queries_filter_in_list_order() {
    let (store, _) = memory_store();
    let older = store.save_at(applicant_input(5), at(9, 0, 0));
    store.save_at(applicant_input(6), at(9, 1, 0));
    let newer = store.save_at(applicant_input(5), at(9, 2, 0));

    let mine = store.for_applicant(ApplicantId(5));
    let ids: Vec<&DraftId> = mine.iter().map(|draft| &draft.id).collect();
    assert_eq!(ids, vec![&newer, &older]);
    assert!(store.has_drafts(ApplicantId(6)));
    assert!(!store.has_drafts(ApplicantId(99)));
    assert_eq!(
        store
            .latest_for_applicant(ApplicantId(5))
            .map(|draft| draft.id),
        Some(newer)
    );
    assert!(store.latest_for_applicant(ApplicantId(99)).is_none());
}

#[test]
fn drafts_persist_across_store_instances() {
    let (store, backend) = memory_store();
    let id = store.save_at(applicant_input(8), at(9, 0, 0));

    let reopened = DraftStore::new(Arc::new(backend));
    let draft = reopened.get(&id).expect("draft survives reload");
    assert_eq!(draft.applicant_id, ApplicantId(8));
}

#[test]
fn stored_format_uses_camel_case_keys() {
    let (store, backend) = memory_store();
    store.save_at(applicant_input(8), at(9, 0, 0));

    let raw = backend.get(DRAFTS_KEY).expect("get").expect("persisted");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("json array");
    let first = &value[0];
    assert_eq!(first["applicantId"], 8);
    assert_eq!(first["currentStep"], 3);
    assert_eq!(first["selectedLoanType"]["name"], "Home Loan");
    assert_eq!(first["selectedLoanType"]["maxTenureYears"], 30);
    assert!(first["formData"]["personalDetailsForm"].is_object());
    assert!(first["lastSaved"].is_string());
}

#[test]
fn subscribers_observe_every_change() {
    let (store, _) = memory_store();
    let mut changes = store.subscribe();
    assert!(changes.borrow_and_update().is_empty());

    let id = store.save_at(applicant_input(1), at(9, 0, 0));
    assert!(changes.has_changed().expect("sender alive"));
    assert_eq!(changes.borrow_and_update()[0].id, id);

    store.remove(&id);
    assert!(changes.has_changed().expect("sender alive"));
    assert!(changes.borrow_and_update().is_empty());
}

#[test]
fn subscription_starts_from_persisted_drafts() {
    let (store, backend) = memory_store();
    store.save_at(applicant_input(1), at(9, 0, 0));

    let reopened = DraftStore::new(Arc::new(backend));
    assert_eq!(reopened.subscribe().borrow().len(), 1);
}

/// Array as written by the web client: bare loan type codes, null sections, and one
/// entry that is not a draft at all.
fn web_client_drafts() -> serde_json::Value {
    json!([
        {
            "id": "draft_1741942800000_a1b2c3d4e",
            "applicantId": 4,
            "currentStep": 2,
            "totalSteps": 6,
            "completionPercentage": 27,
            "selectedLoanType": { "id": 2, "name": "Home Loan" },
            "formData": {
                "loanTypeForm": { "loanType": "HOME" },
                "personalDetailsForm": { "firstName": "Meera" }
            },
            "lastSaved": "2025-03-14T09:00:00.000Z",
            "createdAt": "2025-03-14T08:55:00.000Z",
            "title": "Home Loan Application",
            "description": "Stopped at Personal Details (Step 2 of 6)"
        },
        {
            "id": "draft_1741942900000_f5e6d7c8b",
            "applicantId": 4,
            "currentStep": 3,
            "totalSteps": 6,
            "completionPercentage": 40,
            "selectedLoanType": "HOME",
            "formData": {
                "loanTypeForm": { "loanType": "HOME" },
                "personalDetailsForm": { "firstName": "Meera", "lastName": "" },
                "documentsForm": null,
                "reviewNotes": { "callback": "evening" }
            },
            "lastSaved": "2025-03-14T09:10:00.000Z",
            "createdAt": "2025-03-14T09:05:00.000Z",
            "title": "Loan Application Draft",
            "description": "Stopped at Loan Details (Step 3 of 6)"
        },
        { "id": 17, "currentStep": "three" }
    ])
}

fn seeded_with_web_client_drafts() -> (DraftStore<MemoryStore>, MemoryStore) {
    let backend = MemoryStore::default();
    backend
        .set(DRAFTS_KEY, &web_client_drafts().to_string())
        .expect("memory store accepts writes");
    (DraftStore::new(Arc::new(backend.clone())), backend)
}

#[test]
fn web_client_drafts_are_listed_alongside_each_other() {
    let (store, _) = seeded_with_web_client_drafts();

    let drafts = store.list();
    assert_eq!(drafts.len(), 2, "only the unreadable entry is hidden");

    let coded = store
        .get(&DraftId("draft_1741942900000_f5e6d7c8b".to_string()))
        .expect("draft with a bare loan type code");
    assert_eq!(
        coded.selected_loan_type,
        Some(SelectedLoanType::Code("HOME".to_string()))
    );
    assert!(coded.form_data.documents_form.is_empty());
    assert_eq!(coded.form_data.extra["reviewNotes"]["callback"], "evening");
}

#[test]
fn saving_keeps_every_existing_entry() {
    let (store, backend) = seeded_with_web_client_drafts();

    let id = store.save_at(applicant_input(4), at(10, 0, 0));

    let raw = backend.get(DRAFTS_KEY).expect("get").expect("persisted");
    let stored: serde_json::Value = serde_json::from_str(&raw).expect("json array");
    let entries = stored.as_array().expect("array");
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0]["id"], id.0.as_str());
    assert_eq!(entries[1]["id"], "draft_1741942800000_a1b2c3d4e");
    assert_eq!(entries[2]["id"], "draft_1741942900000_f5e6d7c8b");
    assert_eq!(entries[2]["selectedLoanType"], "HOME");
    assert_eq!(entries[2]["formData"]["reviewNotes"]["callback"], "evening");
    assert_eq!(entries[3], json!({ "id": 17, "currentStep": "three" }));
    assert_eq!(store.list().len(), 3);
}

#[test]
fn removing_one_draft_leaves_unreadable_entries_in_place() {
    let (store, backend) = seeded_with_web_client_drafts();

    store.remove(&DraftId("draft_1741942800000_a1b2c3d4e".to_string()));

    let raw = backend.get(DRAFTS_KEY).expect("get").expect("persisted");
    let stored: serde_json::Value = serde_json::from_str(&raw).expect("json array");
    assert_eq!(stored.as_array().map(Vec::len), Some(2));
    assert_eq!(store.list().len(), 1);
}

#[test]
fn bare_loan_type_codes_fall_back_to_the_generic_title() {
    let (store, _) = memory_store();
    let input: DraftInput = serde_json::from_value(json!({
        "applicantId": 9,
        "selectedLoanType": "HOME",
        "formData": { "documentsForm": null, "loanTypeForm": { "loanType": "HOME" } }
    }))
    .expect("web client payload decodes");

    let id = store.save_at(input, at(9, 0, 0));
    let draft = store.get(&id).expect("draft stored");

    assert_eq!(
        draft.selected_loan_type,
        Some(SelectedLoanType::Code("HOME".to_string()))
    );
    assert_eq!(draft.title, "Loan Application Draft");
    assert!(draft.form_data.documents_form.is_empty());
    assert_eq!(draft.completion_percentage, 85);

    let numeric: DraftInput =
        serde_json::from_value(json!({ "selectedLoanType": 3 })).expect("numeric id decodes");
    assert_eq!(numeric.selected_loan_type, Some(SelectedLoanType::Id(3)));
}
