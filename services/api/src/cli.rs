use crate::demo::{run_demo, run_eligibility_check, DemoArgs, EligibilityCheckArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use paj_diversion::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "PAJ-SM+ Diversion Coordinator",
    about = "Run and exercise the PAJ-SM+ diversion program service from the command line",
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
    /// Evaluate candidates against the program's intake rules
    Eligibility {
        #[command(subcommand)]
        command: EligibilityCommand,
    },
    /// Enroll a sample participant and walk it through every program stage
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum EligibilityCommand {
    /// Print the verdict and every failing reason for one candidate
    Check(EligibilityCheckArgs),
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
        Command::Eligibility {
            command: EligibilityCommand::Check(args),
        } => run_eligibility_check(args),
        Command::Demo(args) => run_demo(args),
    }
}
