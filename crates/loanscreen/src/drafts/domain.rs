use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::progress::{completion_percentage, time_since};

/// Identifier wrapper for locally persisted drafts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DraftId(pub String);

/// Applicant that owns a draft; `0` marks drafts saved before sign-in completed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicantId(pub i64);

/// Free-form field values captured by one wizard step.
pub type FormSection = Map<String, Value>;

pub const DEFAULT_TOTAL_STEPS: u32 = 6;

/// Per-step payloads of the application wizard.
///
/// A section that is `null` or not an object reads as empty. Keys outside the five
/// wizard sections are kept in `extra` so they survive a re-save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftFormData {
    #[serde(default, deserialize_with = "lenient_section")]
    pub loan_type_form: FormSection,
    #[serde(default, deserialize_with = "lenient_section")]
    pub personal_details_form: FormSection,
    #[serde(default, deserialize_with = "lenient_section")]
    pub loan_details_form: FormSection,
    #[serde(default, deserialize_with = "lenient_section")]
    pub financial_details_form: FormSection,
    #[serde(default, deserialize_with = "lenient_section")]
    pub documents_form: FormSection,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DraftFormData {
    pub fn sections(&self) -> [&FormSection; 5] {
        [
            &self.loan_type_form,
            &self.personal_details_form,
            &self.loan_details_form,
            &self.financial_details_form,
            &self.documents_form,
        ]
    }

    /// Every field value of the wizard sections and of any extra object-valued key.
    pub fn fields(&self) -> impl Iterator<Item = &Value> + '_ {
        let extra = self.extra.values().filter_map(Value::as_object);
        self.sections()
            .into_iter()
            .chain(extra)
            .flat_map(|section| section.values())
    }
}

fn lenient_section<'de, D>(deserializer: D) -> Result<FormSection, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(section) => section,
        _ => FormSection::new(),
    })
}

/// Loan type recorded on a draft.
///
/// The web client stores the bare loan type id (`"HOME"`, `3`); richer clients store
/// the whole product record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectedLoanType {
    Product(LoanTypeSelection),
    Code(String),
    Id(i64),
}

impl SelectedLoanType {
    /// Display name, known only when the full product record was stored.
    pub fn name(&self) -> Option<&str> {
        match self {
            SelectedLoanType::Product(product) => product.name.as_deref(),
            SelectedLoanType::Code(_) | SelectedLoanType::Id(_) => None,
        }
    }
}

impl From<LoanTypeSelection> for SelectedLoanType {
    fn from(product: LoanTypeSelection) -> Self {
        SelectedLoanType::Product(product)
    }
}

/// Loan product picked on the first wizard step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanTypeSelection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// A not-yet-submitted loan application kept in client storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftApplication {
    pub id: DraftId,
    pub applicant_id: ApplicantId,
    pub current_step: u32,
    pub total_steps: u32,
    pub completion_percentage: u8,
    #[serde(default)]
    pub selected_loan_type: Option<SelectedLoanType>,
    #[serde(default)]
    pub form_data: DraftFormData,
    pub last_saved: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub description: String,
}

impl DraftApplication {
    pub fn step_name(&self) -> String {
        step_name(self.current_step)
    }

    pub fn summary_view(&self, now: DateTime<Utc>) -> DraftSummaryView {
        DraftSummaryView {
            id: self.id.clone(),
            applicant_id: self.applicant_id,
            title: self.title.clone(),
            description: self.description.clone(),
            current_step: self.current_step,
            total_steps: self.total_steps,
            step_name: self.step_name(),
            completion_percentage: self.completion_percentage,
            last_saved: self.last_saved,
            time_since: time_since(self.last_saved, now),
        }
    }
}

/// Partial draft accepted by `DraftStore::save`; anything missing is defaulted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DraftInput {
    pub id: Option<DraftId>,
    pub applicant_id: Option<ApplicantId>,
    pub current_step: Option<u32>,
    pub total_steps: Option<u32>,
    pub completion_percentage: Option<u8>,
    pub selected_loan_type: Option<SelectedLoanType>,
    pub form_data: Option<DraftFormData>,
    pub created_at: Option<DateTime<Utc>>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl DraftInput {
    pub(crate) fn into_draft(
        self,
        id: DraftId,
        created_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> DraftApplication {
        let current_step = self.current_step.filter(|step| *step > 0).unwrap_or(1);
        let total_steps = self
            .total_steps
            .filter(|steps| *steps > 0)
            .unwrap_or(DEFAULT_TOTAL_STEPS);
        let form_data = self.form_data.unwrap_or_default();
        let completion = self
            .completion_percentage
            .map(|pct| pct.min(100))
            .unwrap_or_else(|| completion_percentage(&form_data, current_step));
        let title = self
            .title
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| default_title(self.selected_loan_type.as_ref()));
        let description = self
            .description
            .filter(|description| !description.is_empty())
            .unwrap_or_else(|| default_description(current_step, total_steps));

        DraftApplication {
            id,
            applicant_id: self.applicant_id.unwrap_or_default(),
            current_step,
            total_steps,
            completion_percentage: completion,
            selected_loan_type: self.selected_loan_type,
            form_data,
            last_saved: now,
            created_at,
            title,
            description,
        }
    }
}

/// Lightweight listing entry used by dashboards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftSummaryView {
    pub id: DraftId,
    pub applicant_id: ApplicantId,
    pub title: String,
    pub description: String,
    pub current_step: u32,
    pub total_steps: u32,
    pub step_name: String,
    pub completion_percentage: u8,
    pub last_saved: DateTime<Utc>,
    pub time_since: String,
}

/// Steps of the loan application wizard, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    LoanType,
    PersonalDetails,
    LoanDetails,
    FinancialDetails,
    Documents,
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 6] = [
        WizardStep::LoanType,
        WizardStep::PersonalDetails,
        WizardStep::LoanDetails,
        WizardStep::FinancialDetails,
        WizardStep::Documents,
        WizardStep::Review,
    ];

    pub fn from_number(step: u32) -> Option<Self> {
        let index = usize::try_from(step.checked_sub(1)?).ok()?;
        Self::ALL.get(index).copied()
    }

    pub const fn label(self) -> &'static str {
        match self {
            WizardStep::LoanType => "Loan Type",
            WizardStep::PersonalDetails => "Personal Details",
            WizardStep::LoanDetails => "Loan Details",
            WizardStep::FinancialDetails => "Financial Details",
            WizardStep::Documents => "Documents",
            WizardStep::Review => "Review",
        }
    }
}

pub fn step_name(step: u32) -> String {
    match WizardStep::from_number(step) {
        Some(known) => known.label().to_string(),
        None => format!("Step {step}"),
    }
}

fn default_title(selection: Option<&SelectedLoanType>) -> String {
    match selection.and_then(SelectedLoanType::name) {
        Some(name) if !name.is_empty() => format!("{name} Application"),
        _ => "Loan Application Draft".to_string(),
    }
}

fn default_description(current_step: u32, total_steps: u32) -> String {
    format!(
        "Stopped at {} (Step {current_step} of {total_steps})",
        step_name(current_step)
    )
}
