use tokio::io::BufReader;
use tracing::info;

use crate::bootstrap::bootstrap_with_config;
use crate::commands::{build_runtime, load_config, CommandResult};
use crate::logging::init_logging;
use crate::session::{run_session, BANNER};

/// Interactive session against the configured backend and store.
pub fn run() -> CommandResult {
    let config = match load_config("chat") {
        Ok(config) => config,
        Err(result) => return result,
    };
    init_logging(&config.logging);

    let runtime = match build_runtime("chat") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    runtime.block_on(async {
        let app = match bootstrap_with_config(config).await {
            Ok(app) => app,
            Err(error) => {
                return CommandResult::failure(
                    "chat",
                    error.error_class(),
                    error.to_string(),
                    error.exit_code(),
                );
            }
        };

        println!("\n{BANNER}");
        let mut stdout = std::io::stdout();
        let input = BufReader::new(tokio::io::stdin());

        let outcome = tokio::select! {
            outcome = run_session(&app.runtime, input, &mut stdout) => Some(outcome),
            _ = tokio::signal::ctrl_c() => None,
        };
        app.shutdown().await;

        match outcome {
            Some(Ok(_)) => CommandResult::quiet(),
            None => {
                info!(event_name = "cli.session.interrupted", "session interrupted");
                CommandResult::quiet()
            }
            Some(Err(error)) => CommandResult::failure(
                "chat",
                "session_io",
                format!("terminal i/o failed: {error}"),
                3,
            ),
        }
    })
}
