//! Supervision of a local `ollama serve` process for the lifetime of a session.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::{debug, info};

pub const DEFAULT_PROGRAM: &str = "ollama";
const KILL_SETTLE: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("`{program}` was not found on PATH")]
    NotInstalled { program: String },
    #[error("failed to run `{command}`: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status}")]
    CommandFailed { command: String, status: ExitStatus },
}

impl SupervisorError {
    fn io(command: impl Into<String>) -> impl FnOnce(std::io::Error) -> Self {
        let command = command.into();
        move |source| Self::Io { command, source }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelStatus {
    Present,
    Pulled,
}

/// A spawned server. Dropping it kills the child as well.
pub struct OllamaServer {
    program: PathBuf,
    child: Child,
}

impl OllamaServer {
    pub fn locate(program: &str) -> Result<PathBuf, SupervisorError> {
        which::which(program)
            .map_err(|_| SupervisorError::NotInstalled { program: program.to_string() })
    }

    /// Replace any running instance with a fresh `serve` child and give it
    /// `startup_grace` to bind its port.
    pub async fn start(program: &str, startup_grace: Duration) -> Result<Self, SupervisorError> {
        let path = Self::locate(program)?;
        kill_existing(program).await;

        let child = Command::new(&path)
            .arg("serve")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(SupervisorError::io(format!("{program} serve")))?;

        info!(
            event_name = "llm.server.spawned",
            pid = child.id(),
            startup_grace_ms = startup_grace.as_millis() as u64,
            "started ollama server"
        );
        tokio::time::sleep(startup_grace).await;

        Ok(Self { program: path, child })
    }

    /// Pull `model` unless `ollama list` already mentions it.
    pub async fn ensure_model(&self, model: &str) -> Result<ModelStatus, SupervisorError> {
        let list_command = format!("{} list", self.program.display());
        let output = Command::new(&self.program)
            .arg("list")
            .output()
            .await
            .map_err(SupervisorError::io(list_command.clone()))?;
        if !output.status.success() {
            return Err(SupervisorError::CommandFailed {
                command: list_command,
                status: output.status,
            });
        }

        if model_listed(&String::from_utf8_lossy(&output.stdout), model) {
            debug!(event_name = "llm.model.present", model, "model already available");
            return Ok(ModelStatus::Present);
        }

        info!(event_name = "llm.model.pull_started", model, "model not found, pulling");
        let pull_command = format!("{} pull {model}", self.program.display());
        // Pull progress goes straight to the terminal.
        let status = Command::new(&self.program)
            .args(["pull", model])
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(SupervisorError::io(pull_command.clone()))?;
        if !status.success() {
            return Err(SupervisorError::CommandFailed { command: pull_command, status });
        }

        info!(event_name = "llm.model.pulled", model, "model pulled");
        Ok(ModelStatus::Pulled)
    }

    pub async fn shutdown(mut self) -> Result<(), SupervisorError> {
        self.child.kill().await.map_err(SupervisorError::io("kill ollama serve"))?;
        info!(event_name = "llm.server.stopped", "stopped ollama server");
        Ok(())
    }
}

/// Substring match against `ollama list` output, so `tinyllama` also matches
/// `tinyllama:latest`.
pub fn model_listed(listing: &str, model: &str) -> bool {
    listing.contains(model)
}

async fn kill_existing(program: &str) {
    // pkill exits non-zero when nothing matched; that is not an error here.
    match Command::new("pkill").arg(program).status().await {
        Ok(status) if status.success() => {
            info!(event_name = "llm.server.replaced", program, "stopped existing instance");
            tokio::time::sleep(KILL_SETTLE).await;
        }
        _ => debug!(event_name = "llm.server.none_running", program, "no existing instance"),
    }
}
