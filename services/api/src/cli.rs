use crate::console::{run_assign, run_import, run_roster, AssignArgs, ImportArgs, RosterArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use peer_tutor::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Peer Tutor Assignments",
    about = "Validate peer tutor eligibility and assign tutors to courses",
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
    /// Check eligibility and assign a peer tutor to a course
    Assign(AssignArgs),
    /// List the peer tutors assigned to a course
    Roster(RosterArgs),
    /// Load courses, students, grades, and tutors from a directory of CSV files
    Import(ImportArgs),
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

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Assign(args) => run_assign(args),
        Command::Roster(args) => run_roster(args),
        Command::Import(args) => run_import(args),
    }
}
