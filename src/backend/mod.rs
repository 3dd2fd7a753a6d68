//! Access to the hosted auth + database service that stores each user's journal.
//!
//! [`RestBackend`] talks to the hosted service over HTTP. [`FileBackend`] keeps
//! accounts and journals in a local JSON document for development and tests.

mod file;
mod rest;

pub use file::{BackendDocument, FileBackend, UserRecord};
pub use rest::RestBackend;

use crate::models::{Journal, Profile, Session, StoredState};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("{0}")]
    AuthFailed(String),
    #[error("network error: {0}")]
    Transport(String),
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("storage error: {0}")]
    Io(String),
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[async_trait]
pub trait Backend: Send + Sync + 'static {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, BackendError>;

    async fn sign_out(&self, session: &Session) -> Result<(), BackendError>;

    async fn select_profile(&self, session: &Session, user_id: &str) -> Result<Option<Profile>, BackendError>;

    /// Every profile whose role is not admin, newest first.
    async fn list_clients(&self, session: &Session) -> Result<Vec<Profile>, BackendError>;

    async fn get_user_state(&self, session: &Session, user_id: &str) -> Result<Option<StoredState>, BackendError>;

    /// Replaces the stored journal of `user_id` with `data`.
    async fn upsert_user_state(&self, session: &Session, user_id: &str, data: &Journal) -> Result<(), BackendError>;
}

pub type SharedBackend = Arc<dyn Backend>;
