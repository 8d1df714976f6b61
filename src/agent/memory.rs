//! In-process conversation memory keyed by thread id.
//!
//! Each thread accumulates the non-system messages of every completed
//! agent invocation, up to a message cap. Nothing is persisted; a restart
//! starts empty.

use crate::llm::{Message, Role};
use std::collections::HashMap;

/// Default number of messages kept per thread
pub const DEFAULT_MAX_HISTORY_MESSAGES: usize = 60;

#[derive(Default)]
struct ThreadEntry {
    messages: Vec<Message>,
    turns: usize,
}

/// Memory checkpoint shared by every invocation of one session
pub struct MemoryCheckpoint {
    entries: tokio::sync::RwLock<HashMap<String, ThreadEntry>>,
    max_messages: usize,
}

impl Default for MemoryCheckpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCheckpoint {
    pub fn new() -> Self {
        Self::with_max_messages(DEFAULT_MAX_HISTORY_MESSAGES)
    }

    /// Keep at most `max_messages` per thread (at least one)
    pub fn with_max_messages(max_messages: usize) -> Self {
        Self {
            entries: tokio::sync::RwLock::new(HashMap::new()),
            max_messages: max_messages.max(1),
        }
    }

    /// Messages recorded for a thread, oldest first. Unknown threads are empty.
    pub async fn history(&self, thread_id: &str) -> Vec<Message> {
        let entries = self.entries.read().await;
        entries
            .get(thread_id)
            .map(|e| e.messages.clone())
            .unwrap_or_default()
    }

    /// Record one completed invocation and return the thread's new turn count.
    ///
    /// System messages are dropped; the prompt is supplied fresh on every call.
    /// Past the cap the oldest messages go first, and the kept history always
    /// starts at a user message so no tool result loses its tool call.
    pub async fn append_turn(&self, thread_id: &str, messages: &[Message]) -> usize {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(thread_id.to_string()).or_default();
        entry.messages.extend(
            messages
                .iter()
                .filter(|m| m.role != Role::System)
                .cloned(),
        );
        entry.turns += 1;

        if entry.messages.len() > self.max_messages {
            let overflow = entry.messages.len() - self.max_messages;
            let cut = entry.messages[overflow..]
                .iter()
                .position(|m| m.role == Role::User)
                .map_or(entry.messages.len(), |i| overflow + i);
            entry.messages.drain(..cut);
            tracing::debug!("Checkpoint '{}' dropped {} old messages", thread_id, cut);
        }

        tracing::debug!(
            "Checkpoint '{}' now holds {} messages over {} turns",
            thread_id,
            entry.messages.len(),
            entry.turns
        );
        entry.turns
    }

    /// Number of completed invocations on a thread
    pub async fn turn_count(&self, thread_id: &str) -> usize {
        self.entries
            .read()
            .await
            .get(thread_id)
            .map_or(0, |e| e.turns)
    }
}
