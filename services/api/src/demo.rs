use std::sync::Arc;

use chrono::{Duration, Utc};
use clap::Args;
use loanscreen::config::AppConfig;
use loanscreen::drafts::{
    ApplicantId, DraftFormData, DraftInput, DraftStore, LoanTypeSelection,
};
use loanscreen::error::AppError;
use loanscreen::loan_id;
use loanscreen::search::{SavedSearch, SearchContext, SearchPreferences, SortOrder};
use loanscreen::storage::{FileStore, KeyValueStore, MemoryStore};
use serde_json::{json, Map};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Applicant id that owns the demo drafts.
    #[arg(long, default_value_t = 1001)]
    pub(crate) applicant: i64,
    /// Persist demo drafts into the configured data directory instead of memory.
    #[arg(long)]
    pub(crate) persist: bool,
}

pub(crate) fn run_demo(config: &AppConfig, args: DemoArgs) -> Result<(), AppError> {
    if args.persist {
        let storage = Arc::new(FileStore::open(&config.storage.data_dir)?);
        println!("Persisting demo drafts under {}", storage.root().display());
        run_demo_with(storage, config.storage.draft_limit, args.applicant);
    } else {
        let storage = Arc::new(MemoryStore::default());
        run_demo_with(storage, config.storage.draft_limit, args.applicant);
    }
    Ok(())
}

fn run_demo_with<S>(storage: Arc<S>, limit: usize, applicant: i64)
where
    S: KeyValueStore + 'static,
{
    let drafts = DraftStore::with_limit(storage.clone(), limit);
    let applicant = ApplicantId(applicant);
    let started = Utc::now() - Duration::hours(3);

    println!("Draft save-and-resume demo (applicant {})", applicant.0);

    let mut form_data = DraftFormData::default();
    form_data
        .loan_type_form
        .insert("loanType".to_string(), json!("HOME"));
    let first = DraftInput {
        applicant_id: Some(applicant),
        selected_loan_type: Some(home_loan().into()),
        form_data: Some(form_data.clone()),
        ..DraftInput::default()
    };
    let id = drafts.save_at(first, started);
    println!("- Step 1 auto-saved as {}", id.0);

    for (key, value) in [
        ("firstName", json!("Asha")),
        ("lastName", json!("Verma")),
        ("panNumber", json!("")),
    ] {
        form_data
            .personal_details_form
            .insert(key.to_string(), value);
    }
    form_data
        .loan_details_form
        .insert("loanAmount".to_string(), json!(2_500_000));
    form_data
        .loan_details_form
        .insert("tenureMonths".to_string(), json!(null));

    let resumed = DraftInput {
        id: Some(id.clone()),
        applicant_id: Some(applicant),
        current_step: Some(3),
        selected_loan_type: Some(home_loan().into()),
        form_data: Some(form_data),
        ..DraftInput::default()
    };
    drafts.save_at(resumed, started + Duration::minutes(40));
    println!("- Resumed and auto-saved at step 3");

    let now = Utc::now();
    println!("\nSaved drafts");
    for draft in drafts.for_applicant(applicant) {
        let view = draft.summary_view(now);
        println!(
            "- {} | {}% complete | {} | last saved {}",
            view.title, view.completion_percentage, view.description, view.time_since
        );
    }

    println!("\nDisplay loan ids");
    for internal in [1, 42, 12_345] {
        let parts = loan_id::parts(internal);
        println!("- loan #{internal} -> {} ({})", parts.display_id, parts.formatted);
    }

    let preferences = SearchPreferences::new(storage);
    let mut filters = Map::new();
    filters.insert("status".to_string(), json!("PENDING"));
    filters.insert("officer".to_string(), json!(""));
    preferences.save(
        SearchContext::Loans,
        &SavedSearch {
            filters,
            sort_by: "createdAt".to_string(),
            sort_order: SortOrder::Desc,
        },
    );
    let restored = preferences.load(SearchContext::Loans);
    println!(
        "\nSaved '{}' search restored with {} active filter(s), sorted by {}",
        SearchContext::Loans,
        restored.active_filter_count(),
        restored.sort_by
    );
}

fn home_loan() -> LoanTypeSelection {
    LoanTypeSelection {
        id: Some(json!(1)),
        name: Some("Home Loan".to_string()),
        details: Map::new(),
    }
}
