//! Stdio gateway: one text line per turn for a fixed session.

use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::contracts::{ChatRequest, UserInput};
use crate::pipeline::Pipeline;

/// Default session ID when not overridden by flag.
pub const DEFAULT_STDIO_SESSION_ID: &str = "default";

/// Run stdio loop: read lines, run turn, print reply. Exits on EOF or Ctrl+C.
///
/// # Errors
/// Fails on stdin/stdout I/O errors; turn faults are printed as replies.
pub async fn run_stdio(pipeline: Pipeline, user_id: String, session_id: String) -> Result<()> {
    let reader = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    run_lines(&pipeline, &user_id, &session_id, reader, &mut stdout).await
}

/// Line loop behind [`run_stdio`], generic over its input and output.
///
/// # Errors
/// Fails on read or write errors.
pub async fn run_lines<R, W>(
    pipeline: &Pipeline,
    user_id: &str,
    session_id: &str,
    reader: R,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let request = ChatRequest::new(session_id, user_id, UserInput::from_text(line));
        let envelope = pipeline.handle(request).await;
        writeln!(out, "{}", envelope.message)?;
        out.flush()?;
    }
    Ok(())
}
