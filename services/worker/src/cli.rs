use crate::process::{run_process, run_queue, ProcessArgs, QueueArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use rehab_discharge::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Rehabilitation Discharge Worker",
    about = "Discharge citizens from rehabilitation providers and close the robot tasks that requested it",
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
    /// Process a file of queued work items against a case snapshot
    Process(ProcessArgs),
    /// Select new robot discharge activities from an activity list export
    Queue(QueueArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Case snapshot backing the service (defaults to DISCHARGE_SNAPSHOT_PATH)
    #[arg(long)]
    pub(crate) snapshot: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Process(args) => run_process(args),
        Command::Queue(args) => run_queue(args),
    }
}
