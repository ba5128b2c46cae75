use std::io::{self, Write};

use roster_agent::AgentRuntime;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, info_span, Instrument};

pub const PROMPT: &str = "> ";
pub const QUIT_COMMAND: &str = "quit";

pub const BANNER: &str = "Starting AI-powered database management system
You can interact with the database using natural language.
Examples:
- Add a new person named John with email john@example.com
- Show me user with ID 1
- Find the person with email john@example.com
- Change user 1's email to new@example.com
- Remove user with ID 2
- Show all users
Type 'quit' to exit";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub lines: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Read-eval loop. Each line is handled to completion before the next prompt;
/// a failed line is reported and the loop moves on. Ends on `quit` or end of
/// input. Only I/O errors on the streams themselves abort the session; bytes
/// that are not valid UTF-8 are decoded lossily so one stray byte cannot end it.
pub async fn run_session<R, W>(
    runtime: &AgentRuntime,
    mut input: R,
    output: &mut W,
) -> io::Result<SessionSummary>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut buf = Vec::new();
    let mut summary = SessionSummary::default();

    loop {
        write!(output, "\n{PROMPT}")?;
        output.flush()?;

        buf.clear();
        if input.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = decode_line(&buf);
        if line.trim() == QUIT_COMMAND {
            break;
        }

        summary.lines += 1;
        let span = info_span!("request", correlation_id = %format!("line-{}", summary.lines));
        match runtime.handle_message(&line).instrument(span).await {
            Ok(message) => {
                summary.succeeded += 1;
                writeln!(output, "{message}")?;
            }
            Err(error) => {
                summary.failed += 1;
                writeln!(output, "Error: {}", error.user_message())?;
            }
        }
    }

    info!(
        event_name = "cli.session.ended",
        lines = summary.lines,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "session ended"
    );
    Ok(summary)
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}
