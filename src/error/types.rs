use thiserror::Error;

/// Unified result type for the windowing layer.
pub type Result<T> = std::result::Result<T, HubError>;

/// Errors surfaced by the hub and its surfaces.
///
/// Expected control flow never travels through this enum; fallibility is
/// confined to surface I/O and backend wiring.
#[derive(Debug, Error)]
pub enum HubError {
    #[error("surface backend error: {0}")]
    Backend(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
