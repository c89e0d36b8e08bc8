//! Session identity
//!
//! A durable per-profile identifier the backend uses to correlate requests
//! with its stored conversation history.

mod manager;
mod store;

pub use manager::SessionManager;
pub use store::{MemorySessionStore, SessionStore, SqliteSessionStore};
