pub mod bootstrap;
pub mod commands;
pub mod logging;
pub mod session;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "roster",
    about = "Manage user records in plain language",
    long_about = "Chat with the user store through a local text-generation backend, or run \
                  deterministic operations, migrations, config inspection and readiness checks.",
    after_help = "Examples:\n  roster\n  roster run \"list all users\"\n  roster parse \"get user with id=1\" --json\n  roster doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Start the interactive session (default)")]
    Chat,
    #[command(about = "Execute one operation sentence against the store without the backend")]
    Run {
        #[arg(required = true, help = "Operation text, e.g. `create user named Ada email ada@x.com`")]
        text: Vec<String>,
    },
    #[command(about = "Classify and extract an operation sentence without executing it")]
    Parse {
        #[arg(required = true, help = "Operation text to inspect")]
        text: Vec<String>,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, database connectivity and backend readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => commands::chat::run(),
        Command::Run { text } => commands::run::run(&text.join(" ")),
        Command::Parse { text, json } => commands::parse::run(&text.join(" "), json),
        Command::Migrate => commands::migrate::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}
