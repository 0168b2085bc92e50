//! Crate-wide error type
//!
//! Each concern owns its own error enum; `Error` unifies them for callers that
//! drive the whole pipeline (CLI, wasm bindings).

use thiserror::Error;

use crate::game::TransitionError;
use crate::settings::ConfigError;
use crate::sim::SearchError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("failed to serialize outcome: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
