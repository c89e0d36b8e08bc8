//! Conversation state and the send state machine
//!
//! The controller owns the in-memory transcript and orchestrates
//! optimistic updates against the backend: a pending turn is appended
//! before the request is issued and settled in place when it completes.

use std::sync::Arc;

use tracing::debug;

use crate::gateway::{ChatReply, Gateway};
use crate::session::{SessionManager, SessionStore};
use crate::Result;

/// Prefix shown before a failure message in the transcript
pub const ERROR_MARKER: &str = "❌";
/// Prefix shown before a success confirmation in the transcript
pub const OK_MARKER: &str = "✅";
/// Shown when the backend returns an empty reply
pub const EMPTY_REPLY: &str = "(empty response)";
/// Prompt label for system-authored turns
pub const SYSTEM_LABEL: &str = "(system)";

/// Confirmation used when the reset acknowledgement carries no text
const DEFAULT_RESET_NOTE: &str = "Session history cleared.";

/// Assistant side of a turn: pending until the request settles
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Pending,
    Settled(String),
}

impl Reply {
    pub fn is_pending(&self) -> bool {
        matches!(self, Reply::Pending)
    }

    /// Settled text, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            Reply::Pending => None,
            Reply::Settled(text) => Some(text),
        }
    }
}

/// Who authored the prompt side of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    System,
}

/// One exchange in the transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub speaker: Speaker,
    pub user_text: String,
    pub reply: Reply,
}

impl Turn {
    /// A user turn awaiting its reply
    fn pending(user_text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            user_text: user_text.into(),
            reply: Reply::Pending,
        }
    }

    /// An informational turn authored by the client itself
    fn system(note: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::System,
            user_text: SYSTEM_LABEL.to_string(),
            reply: Reply::Settled(note.into()),
        }
    }
}

/// Owns the transcript and serializes sends against the backend.
///
/// At most one turn is pending at any time: `submit` refuses re-entry
/// while a send is in flight, so settling the turn appended at issue time
/// by position is safe.
pub struct ConversationController<S: SessionStore> {
    sessions: SessionManager<S>,
    gateway: Arc<dyn Gateway>,
    turns: Vec<Turn>,
    sending: bool,
}

impl<S: SessionStore> ConversationController<S> {
    pub fn new(sessions: SessionManager<S>, gateway: Arc<dyn Gateway>) -> Self {
        Self {
            sessions,
            gateway,
            turns: Vec::new(),
            sending: false,
        }
    }

    /// Send a user message and settle its turn with the outcome.
    ///
    /// No-op (returns `Ok(false)`) when the trimmed text is empty or a
    /// prior send has not settled. Otherwise appends exactly one pending
    /// turn, issues the chat request, and settles exactly that turn with
    /// the reply text or an error-marked failure message.
    pub async fn submit(&mut self, text: &str) -> Result<bool> {
        let text = text.trim();
        if text.is_empty() || self.sending {
            return Ok(false);
        }

        let session_id = self.sessions.get_or_create()?;

        self.turns.push(Turn::pending(text));
        let index = self.turns.len() - 1;
        self.sending = true;
        debug!("Sending chat message for turn {}", index);

        let rendered = match self.gateway.chat(&session_id, text).await {
            Ok(reply) => render_reply(&reply),
            Err(e) => format!("{ERROR_MARKER} {e}"),
        };

        self.turns[index].reply = Reply::Settled(rendered);
        self.sending = false;
        Ok(true)
    }

    /// Ask the backend to clear its history for the current session.
    ///
    /// The outcome is reported as an appended system turn either way; the
    /// local transcript is never cleared here.
    pub async fn reset_backend(&mut self) -> Result<()> {
        let session_id = self.sessions.get_or_create()?;

        let note = match self.gateway.reset(&session_id).await {
            Ok(ack) => {
                let message = if ack.message.is_empty() {
                    DEFAULT_RESET_NOTE
                } else {
                    &ack.message
                };
                format!("{OK_MARKER} {message}")
            }
            Err(e) => format!("{ERROR_MARKER} {e}"),
        };

        self.turns.push(Turn::system(note));
        Ok(())
    }

    /// Renew the session id and empty the transcript. The backend is not
    /// contacted; its history for the old id stays orphaned server-side.
    pub fn start_new_session(&mut self) -> Result<String> {
        let id = self.sessions.renew()?;
        self.turns.clear();
        Ok(id)
    }

    /// Empty the transcript without touching the session id or the backend
    pub fn clear_local(&mut self) {
        self.turns.clear();
    }

    /// The session id in use, created on first call
    pub fn session_id(&mut self) -> Result<String> {
        self.sessions.get_or_create()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }
}

/// Transcript rendering of a successful chat reply: empty replies fall
/// back to a placeholder, and a named knowledge source is appended.
fn render_reply(reply: &ChatReply) -> String {
    let text = if reply.reply.is_empty() {
        EMPTY_REPLY.to_string()
    } else {
        reply.reply.clone()
    };

    match reply.source.as_str() {
        "" | "error" => text,
        source => format!("{text}\n\n— Source: {source}"),
    }
}
