//! Cosmetic `LNIDxxxxxx` labels derived from internal loan ids.
//!
//! The label is a pure function of the internal id but the mixing step is not
//! injective: two loans can share a display id. Treat it as a label, never as a key.

pub mod router;

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

pub use router::loan_id_router;

pub const PREFIX: &str = "LNID";
/// Most sample ids produced in one request.
pub const MAX_SAMPLES: u32 = 100;
const SUFFIX_MIN: u64 = 100_000;
const SUFFIX_SPAN: u64 = 900_000;

/// User-facing loan identifier such as `LNID100032`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct DisplayLoanId(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a display loan id (expected LNID followed by six digits)")]
pub struct InvalidDisplayLoanId(pub String);

impl TryFrom<String> for DisplayLoanId {
    type Error = InvalidDisplayLoanId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if is_valid_format(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidDisplayLoanId(value))
        }
    }
}

impl DisplayLoanId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The six digits after the prefix.
    pub fn suffix(&self) -> &str {
        &self.0[PREFIX.len()..]
    }
}

impl fmt::Display for DisplayLoanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the display id for an internal loan id.
pub fn format(internal_id: i64) -> DisplayLoanId {
    DisplayLoanId(format!("{PREFIX}{}", suffix_for(internal_id)))
}

/// Six-digit suffix in `[100000, 999999]`.
///
/// The seed is truncated to 32 bits and mixed as `(seed << 5) - seed + seed`, wrapping
/// at 32 bits, which keeps labels identical to the ones the browser client renders.
fn suffix_for(internal_id: i64) -> u64 {
    let seed = internal_id as i32;
    let hash = seed
        .wrapping_shl(5)
        .wrapping_sub(seed)
        .wrapping_add(seed);
    SUFFIX_MIN + u64::from(hash.unsigned_abs()) % SUFFIX_SPAN
}

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^LNID[0-9]{6}$").expect("display id pattern compiles"))
}

pub fn is_valid_format(candidate: &str) -> bool {
    pattern().is_match(candidate)
}

/// The numeric part of a well-formed display id.
pub fn extract_suffix(candidate: &str) -> Option<&str> {
    is_valid_format(candidate).then(|| &candidate[PREFIX.len()..])
}

/// Parse an already formatted display id.
pub fn parse(candidate: &str) -> Option<DisplayLoanId> {
    DisplayLoanId::try_from(candidate.to_string()).ok()
}

/// Pieces used when rendering a display id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanIdParts {
    pub display_id: DisplayLoanId,
    pub formatted: String,
    pub prefix: &'static str,
    pub number: String,
}

pub fn parts(internal_id: i64) -> LoanIdParts {
    let display_id = format(internal_id);
    let number = display_id.suffix().to_string();
    LoanIdParts {
        formatted: format!("{PREFIX}-{number}"),
        display_id,
        prefix: PREFIX,
        number,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleLoanId {
    pub internal: i64,
    pub display: DisplayLoanId,
}

/// Display ids for internal ids `1..=count`.
pub fn samples(count: u32) -> Vec<SampleLoanId> {
    (1..=i64::from(count))
        .map(|internal| SampleLoanId {
            internal,
            display: format(internal),
        })
        .collect()
}

/// Payload encoded into loan QR codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPayload {
    pub loan_id: DisplayLoanId,
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: DateTime<Utc>,
}

pub fn qr_payload(internal_id: i64, now: DateTime<Utc>) -> QrPayload {
    QrPayload {
        loan_id: format(internal_id),
        kind: "LOAN_APPLICATION".to_string(),
        timestamp: now,
    }
}
