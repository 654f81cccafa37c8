use crate::commands::{run_drafts, run_loan_id, DraftsCommand, LoanIdCommand};
use crate::demo::{run_demo, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use loanscreen::config::AppConfig;
use loanscreen::error::AppError;
use loanscreen::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "Loan Screening Drafts",
    about = "Serve and inspect locally persisted loan application drafts and display loan ids",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Inspect or delete saved application drafts
    Drafts {
        #[command(subcommand)]
        command: DraftsCommand,
    },
    /// Format and validate display loan ids
    LoanId {
        #[command(subcommand)]
        command: LoanIdCommand,
    },
    /// Walk through a save-and-resume session end to end
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    match command {
        Command::Serve(args) => server::run(config, args).await,
        Command::Drafts { command } => run_drafts(&config, command),
        Command::LoanId { command } => run_loan_id(command),
        Command::Demo(args) => run_demo(&config, args),
    }
}
