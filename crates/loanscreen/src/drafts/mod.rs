//! Save-and-resume persistence for the multi-step loan application wizard.
//!
//! Drafts never leave the client: they live under a single key of a
//! [`KeyValueStore`](crate::storage::KeyValueStore) as a JSON array, capped to the
//! most recent entries.

pub mod domain;
pub mod progress;
pub mod router;
pub mod store;

#[cfg(test)]
mod tests;

pub use domain::{
    step_name, ApplicantId, DraftApplication, DraftFormData, DraftId, DraftInput,
    DraftSummaryView, FormSection, LoanTypeSelection, SelectedLoanType, WizardStep,
    DEFAULT_TOTAL_STEPS,
};
pub use progress::{completion_percentage, time_since};
pub use router::draft_router;
pub use store::{DraftStore, DEFAULT_DRAFT_LIMIT, DRAFTS_KEY};
