//! Chat UI controller.
//!
//! Holds what the page displays: the conversation (most recent first), the
//! report panel, the status line and the panel split. Callers keep it behind
//! a single `tokio::sync::Mutex`, which makes submissions request-at-a-time.

use crate::report::{render_markdown, report_preview, ReportView, StatusIndicator};
use crate::session::SessionClient;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Who wrote a conversation entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryRole {
    User,
    Agent,
}

impl EntryRole {
    pub fn label(&self) -> &'static str {
        match self {
            EntryRole::User => "Me",
            EntryRole::Agent => "Agent",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatEntry {
    pub role: EntryRole,
    pub label: &'static str,
    pub text: String,
    pub is_error: bool,
    pub timestamp: DateTime<Utc>,
}

impl ChatEntry {
    fn new(role: EntryRole, text: impl Into<String>, is_error: bool) -> Self {
        Self {
            role,
            label: role.label(),
            text: text.into(),
            is_error,
            timestamp: Utc::now(),
        }
    }
}

/// Column split between report and chat (12-column grid)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LayoutState {
    pub report_width: u8,
    pub chat_width: u8,
    pub button_label: &'static str,
    pub collapsed: bool,
}

impl Default for LayoutState {
    fn default() -> Self {
        Self::expanded()
    }
}

impl LayoutState {
    pub fn expanded() -> Self {
        Self {
            report_width: 8,
            chat_width: 4,
            button_label: "−",
            collapsed: false,
        }
    }

    pub fn collapsed() -> Self {
        Self {
            report_width: 12,
            chat_width: 0,
            button_label: "+",
            collapsed: true,
        }
    }

    pub fn toggled(&self) -> Self {
        if self.collapsed {
            Self::expanded()
        } else {
            Self::collapsed()
        }
    }
}

/// Serializable view of everything the page renders
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub session_id: String,
    pub thread_id: String,
    pub memory_enabled: bool,
    pub turns: usize,
    pub connected: bool,
    pub conversation: Vec<ChatEntry>,
    pub report: ReportView,
    pub report_html: String,
    pub status: StatusIndicator,
    pub status_html: String,
    pub layout: LayoutState,
}

pub struct ChatController {
    session: Arc<SessionClient>,
    thread_id: String,
    conversation: Vec<ChatEntry>,
    report: ReportView,
    status: StatusIndicator,
    layout: LayoutState,
}

impl ChatController {
    pub fn new(session: Arc<SessionClient>) -> Self {
        let thread_id = session.default_thread_id().to_string();
        Self {
            session,
            thread_id,
            conversation: Vec::new(),
            report: ReportView::Empty,
            status: StatusIndicator::Empty,
            layout: LayoutState::default(),
        }
    }

    /// Use a fixed thread for submissions that do not name one
    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = thread_id.into();
        self
    }

    pub fn session(&self) -> &Arc<SessionClient> {
        &self.session
    }

    pub fn conversation(&self) -> &[ChatEntry] {
        &self.conversation
    }

    pub fn report(&self) -> &ReportView {
        &self.report
    }

    pub fn status(&self) -> &StatusIndicator {
        &self.status
    }

    pub fn layout(&self) -> LayoutState {
        self.layout
    }

    /// Run one request/response cycle.
    ///
    /// Returns `false` without touching any state when the query is blank.
    pub async fn submit(&mut self, query: &str, thread_id: Option<&str>) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return false;
        }
        let thread_id = thread_id
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(self.thread_id.as_str())
            .to_string();

        self.conversation
            .insert(0, ChatEntry::new(EntryRole::User, query, false));

        if !self.session.is_connected().await {
            tracing::info!("Connecting session on first use");
            if let Err(e) = self.session.connect().await {
                tracing::error!("Session connection failed: {}", e);
                self.conversation.insert(
                    0,
                    ChatEntry::new(
                        EntryRole::Agent,
                        format!(
                            "Sorry, I couldn't reach the analysis server. Please try again later. ({})",
                            e
                        ),
                        true,
                    ),
                );
                return true;
            }
        }

        let outcome = self
            .session
            .analyze_with_handle(query, Some(&thread_id))
            .await;
        let is_error = outcome.raw_content.is_empty()
            && outcome.response.starts_with("Error processing query");
        self.conversation.insert(
            0,
            ChatEntry::new(EntryRole::Agent, outcome.response, is_error),
        );

        let Some(handle) = outcome.handle else {
            return true;
        };

        self.report = ReportView::Loading;
        self.status = StatusIndicator::Loading;

        match self.session.resolve_handle(&handle, Some(&thread_id)).await {
            Ok(resolved) => {
                tracing::info!(
                    "Report {} displayed: {}",
                    handle,
                    report_preview(&resolved.content, 80)
                );
                self.status = StatusIndicator::loaded(&resolved.metadata);
                self.report = render_markdown(&resolved.content, Some(resolved.metadata));
            }
            Err(e) => {
                tracing::error!("{}", e);
                self.report = ReportView::error(e.to_string());
                self.status = StatusIndicator::Error;
            }
        }
        true
    }

    /// Flip between the split and the report-only layout
    pub fn toggle_panel(&mut self) -> LayoutState {
        self.layout = self.layout.toggled();
        self.layout
    }

    pub async fn snapshot(&self) -> Snapshot {
        Snapshot {
            session_id: self.session.id().to_string(),
            thread_id: self.thread_id.clone(),
            memory_enabled: self.session.memory_enabled(),
            turns: self.session.turn_count(&self.thread_id).await,
            connected: self.session.is_connected().await,
            conversation: self.conversation.clone(),
            report_html: self.report.to_html(),
            report: self.report.clone(),
            status_html: self.status.to_html(),
            status: self.status.clone(),
            layout: self.layout,
        }
    }
}
