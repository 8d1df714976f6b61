//! Terminal chat against the same session the web page uses

use crate::session::SessionClient;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Words that end the interactive loop
const EXIT_WORDS: [&str; 3] = ["exit", "quit", "bye"];

fn is_exit_word(input: &str) -> bool {
    EXIT_WORDS.contains(&input.to_lowercase().as_str())
}

/// Run the interactive prompt until an exit word or end of input
pub async fn run_interactive(session: Arc<SessionClient>) -> Result<()> {
    println!("Geospatial analysis chat");
    println!("Session: {} (thread {})", session.id(), session.default_thread_id());
    println!("Type 'exit', 'quit' or 'bye' to leave\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        let input = line.trim();

        if input.is_empty() {
            println!("Please enter a query.");
            continue;
        }
        if is_exit_word(input) {
            println!("Goodbye!");
            break;
        }

        if !session.is_connected().await {
            println!("Connecting to analysis tools...");
            if let Err(e) = session.connect().await {
                eprintln!("Error: {}\n", e);
                continue;
            }
            println!("Available tools: {}\n", session.tool_names().await.join(", "));
        }

        let response = session.analyze(input, None).await;
        println!("\n{}\n", response);

        if session.memory_enabled() {
            let turns = session.turn_count(session.default_thread_id()).await;
            tracing::debug!("Thread {} has {} turns", session.default_thread_id(), turns);
        }
    }

    session.close().await;
    Ok(())
}

/// Connect and print the tools the servers expose
pub async fn list_tools(session: Arc<SessionClient>) -> Result<()> {
    session
        .connect()
        .await
        .context("Failed to connect to MCP servers")?;

    let names = session.tool_names().await;
    println!("{} tool(s) available:", names.len());
    for name in names {
        println!("  - {}", name);
    }

    session.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_words() {
        assert!(is_exit_word("exit"));
        assert!(is_exit_word("QUIT"));
        assert!(is_exit_word("Bye"));
        assert!(!is_exit_word("goodbye"));
        assert!(!is_exit_word("exit now"));
    }
}
