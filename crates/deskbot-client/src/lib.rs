//! deskbot-client: HTTP client for the deskbot support backend
//!
//! Implements the `Gateway` port from deskbot-core against the backend's
//! `/chat`, `/reset` and `/health` endpoints.

pub mod api;

pub use api::BackendClient;
