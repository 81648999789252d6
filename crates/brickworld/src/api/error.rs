use thiserror::Error;

use crate::api::types::EntityId;

/// Errors surfaced by world construction, queries and session management.
#[derive(Debug, Error)]
pub enum Error {
    /// A grid token has no registered constructor and the builder has no fallback.
    #[error("unable to build world: no constructor registered for token {token:?}")]
    UnknownToken { token: char },
    /// Query on an entity that was removed or never added.
    #[error("entity {0:?} not found")]
    NotFound(EntityId),
    #[error("unknown level {0:?}")]
    UnknownLevel(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
