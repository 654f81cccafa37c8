//! Client-side draft persistence and display loan identifiers for the loan screening app.

pub mod config;
pub mod drafts;
pub mod error;
pub mod loan_id;
pub mod search;
pub mod storage;
pub mod telemetry;
