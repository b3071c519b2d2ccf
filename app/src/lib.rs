//! Leadline CRM - headless application shell
//!
//! Reads one JSON command per line on stdin and answers with one JSON
//! result per line on stdout. All state stays on the Rust side.

mod commands;
mod state;

pub use state::AppState;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

pub use commands::{dispatch, dispatch_line, CommandResult, Request};

pub async fn run() -> anyhow::Result<()> {
    // Initialize logging
    leadline_core::init_logging();

    let state = AppState::new()?;
    state.initialize().await?;

    tracing::info!("Leadline started");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let reply = dispatch_line(&state, line).await;
        stdout.write_all(reply.to_string().as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    state.shutdown();
    tracing::info!("Leadline stopped");
    Ok(())
}
