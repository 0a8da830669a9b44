use anyhow::Result;
use clap::{Parser, Subcommand};
use xrate::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for xrate::AppCommand {
    fn from(cmd: Commands) -> xrate::AppCommand {
        match cmd {
            Commands::Serve => xrate::AppCommand::Serve,
            Commands::Convert { from, to, amount } => {
                xrate::AppCommand::Convert { from, to, amount }
            }
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Run the HTTP conversion service (default)
    Serve,
    /// Convert a single amount and print the result
    Convert {
        /// Source currency code
        #[arg(long)]
        from: String,
        /// Target currency code
        #[arg(long)]
        to: String,
        /// Amount to convert
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let command = cli.command.unwrap_or(Commands::Serve);
    let result = match command {
        Commands::Setup => xrate::cli::setup::setup(),
        cmd => xrate::run_command(cmd.into(), cli.config_path.as_deref()).await,
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
