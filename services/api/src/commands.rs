use std::sync::Arc;

use chrono::Utc;
use clap::Subcommand;
use loanscreen::config::AppConfig;
use loanscreen::drafts::{ApplicantId, DraftApplication, DraftId, DraftStore};
use loanscreen::error::AppError;
use loanscreen::loan_id::{self, DisplayLoanId};
use loanscreen::storage::{FileStore, KeyValueStore};

#[derive(Subcommand, Debug)]
pub(crate) enum DraftsCommand {
    /// List saved drafts, newest first
    List {
        /// Only show drafts owned by this applicant
        #[arg(long)]
        applicant: Option<i64>,
    },
    /// Print one draft as JSON
    Show { id: String },
    /// Delete one draft
    Delete { id: String },
    /// Delete every saved draft
    Clear,
}

#[derive(Subcommand, Debug)]
pub(crate) enum LoanIdCommand {
    /// Print the display id for an internal loan id
    Format {
        #[arg(allow_negative_numbers = true)]
        internal_id: i64,
    },
    /// Check that a display id is well formed
    Validate { display_id: String },
    /// Print display ids for internal ids 1..=count
    Samples {
        #[arg(
            long,
            default_value_t = 10,
            value_parser = clap::value_parser!(u32).range(..=i64::from(loan_id::MAX_SAMPLES))
        )]
        count: u32,
    },
}

pub(crate) fn run_drafts(config: &AppConfig, command: DraftsCommand) -> Result<(), AppError> {
    let storage = Arc::new(FileStore::open(&config.storage.data_dir)?);
    let store = DraftStore::with_limit(storage, config.storage.draft_limit);
    let lines = draft_command_output(&store, command);
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

pub(crate) fn draft_command_output<S>(store: &DraftStore<S>, command: DraftsCommand) -> Vec<String>
where
    S: KeyValueStore + 'static,
{
    match command {
        DraftsCommand::List { applicant } => {
            let drafts = match applicant {
                Some(applicant) => store.for_applicant(ApplicantId(applicant)),
                None => store.list(),
            };
            if drafts.is_empty() {
                return vec!["No saved drafts".to_string()];
            }
            let now = Utc::now();
            drafts
                .iter()
                .map(|draft| describe_draft(draft, now))
                .collect()
        }
        DraftsCommand::Show { id } => match store.get(&DraftId(id.clone())) {
            Some(draft) => match serde_json::to_string_pretty(&draft) {
                Ok(json) => vec![json],
                Err(err) => vec![format!("Draft {id} could not be rendered: {err}")],
            },
            None => vec![format!("Draft {id} not found")],
        },
        DraftsCommand::Delete { id } => {
            store.remove(&DraftId(id.clone()));
            vec![format!("Deleted draft {id}")]
        }
        DraftsCommand::Clear => {
            store.clear();
            vec!["Cleared all drafts".to_string()]
        }
    }
}

fn describe_draft(draft: &DraftApplication, now: chrono::DateTime<Utc>) -> String {
    let view = draft.summary_view(now);
    format!(
        "- {} | applicant {} | {} | {}% | {} | saved {}",
        view.id.0,
        view.applicant_id.0,
        view.title,
        view.completion_percentage,
        view.description,
        view.time_since
    )
}

pub(crate) fn run_loan_id(command: LoanIdCommand) -> Result<(), AppError> {
    for line in loan_id_command_output(command)? {
        println!("{line}");
    }
    Ok(())
}

pub(crate) fn loan_id_command_output(command: LoanIdCommand) -> Result<Vec<String>, AppError> {
    match command {
        LoanIdCommand::Format { internal_id } => {
            let parts = loan_id::parts(internal_id);
            Ok(vec![format!(
                "{} ({}) <- internal {}",
                parts.display_id, parts.formatted, internal_id
            )])
        }
        LoanIdCommand::Validate { display_id } => {
            let display = DisplayLoanId::try_from(display_id)?;
            Ok(vec![format!("{display} is valid (number {})", display.suffix())])
        }
        LoanIdCommand::Samples { count } => Ok(loan_id::samples(count)
            .into_iter()
            .map(|sample| format!("{:>6} -> {}", sample.internal, sample.display))
            .collect()),
    }
}
