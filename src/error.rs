use thiserror::Error;

/// Errors surfaced by the engine and its collaborators.
///
/// Input handling swallows these (see `Engine::handle`); they only reach the
/// caller through the `try_*` entry points.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The rendering context could not be started.
    #[error("audio host error: {0}")]
    Host(String),

    /// An operation was requested from a state that does not allow it.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    #[error("encoder error: {0}")]
    Encoder(#[from] hound::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings format error: {0}")]
    Json(#[from] serde_json::Error),
}
