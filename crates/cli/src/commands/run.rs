use std::sync::Arc;

use roster_agent::Dispatcher;
use roster_db::{connect_with_settings, migrations, SqlUserRepository};

use crate::commands::{build_runtime, load_config, CommandResult};

/// Execute an operation sentence directly against the store, skipping the backend.
pub fn run(text: &str) -> CommandResult {
    let config = match load_config("run") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("run") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let dispatcher = Dispatcher::new(Arc::new(SqlUserRepository::new(pool.clone())));
        let outcome = dispatcher
            .execute_text(text)
            .await
            .map_err(|error| (error.error_class(), error.to_string(), 6u8));
        pool.close().await;
        outcome
    });

    match result {
        Ok(message) => CommandResult::success("run", message),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("run", error_class, message, exit_code)
        }
    }
}
