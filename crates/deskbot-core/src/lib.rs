//! deskbot-core: Support Chat Client Core Library
//!
//! Session identity, conversation state and the backend gateway port for
//! the deskbot terminal chat client.

pub mod config;
pub mod conversation;
pub mod error;
pub mod gateway;
pub mod session;

pub use config::{BackendConfig, Config, SessionConfig, UiConfig};
pub use conversation::{ConversationController, Reply, Speaker, Turn};
pub use error::{Error, Result};
pub use gateway::{ChatReply, Gateway, HealthReport, RequestFailed, ResetAck};
pub use session::{MemorySessionStore, SessionManager, SessionStore, SqliteSessionStore};
