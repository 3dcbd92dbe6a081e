/// Centralized error types for commit-bisect using thiserror
///
/// Every failure propagates to the caller unmodified; the core performs no
/// internal retries and no silent fallback.
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, BisectError>;

/// Main error type for the bisection core
#[derive(Error, Debug)]
pub enum BisectError {
    /// Midpoint requested across repositories, or the claimed
    /// ancestor/descendant relationship does not hold.
    #[error("Commit range is not linear: {0}")]
    NonLinear(String),

    #[error("Unknown repository: {0}")]
    UnknownRepository(String),

    /// A (repository, hash) pair does not exist according to the history
    /// provider; carries the provider's message for diagnostics.
    #[error("Unknown commit: {0}")]
    UnknownCommit(String),

    /// The dependency document uses a construct outside the restricted
    /// declarative grammar.
    #[error("Unsupported dependency spec: {0}")]
    UnsupportedSpec(String),

    /// A pin string has more than one '@' separator.
    #[error("Unsupported pin format: {0}")]
    UnsupportedPinFormat(String),

    /// A label already maps to a different URL. This indicates a logic error
    /// upstream (two distinct repositories sharing a basename) and is not
    /// recoverable within the call.
    #[error(
        "Repository label '{label}' already maps to '{existing}', refusing to rebind to '{requested}'"
    )]
    LabelCollision {
        label: String,
        existing: String,
        requested: String,
    },

    #[error("History provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("{0}")]
    Other(String),
}

/// Errors surfaced by a [`crate::history::HistoryProvider`] implementation
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The commit or path does not exist at the queried revision.
    #[error("not found: {0}")]
    NotFound(String),

    /// The query could not be completed (network, auth, backend failure).
    #[error("request failed: {0}")]
    Request(String),
}

// Conversion from anyhow::Error for collaborator plumbing (registry stores)
impl From<anyhow::Error> for BisectError {
    fn from(err: anyhow::Error) -> Self {
        BisectError::Other(format!("{:#}", err))
    }
}

impl BisectError {
    /// Create a new error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        BisectError::Other(msg.into())
    }

    /// Check if this error signals a broken invariant rather than bad input;
    /// fatal errors must abort the enclosing operation, never be swallowed
    pub fn is_fatal(&self) -> bool {
        matches!(self, BisectError::LabelCollision { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BisectError::UnknownRepository("chromium".to_string());
        assert_eq!(err.to_string(), "Unknown repository: chromium");
    }

    #[test]
    fn test_non_linear_display() {
        let err = BisectError::NonLinear("repositories differ".to_string());
        assert_eq!(
            err.to_string(),
            "Commit range is not linear: repositories differ"
        );
    }

    #[test]
    fn test_label_collision_display() {
        let err = BisectError::LabelCollision {
            label: "v8".to_string(),
            existing: "https://chromium.googlesource.com/v8/v8".to_string(),
            requested: "https://example.com/forks/v8".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Repository label 'v8' already maps to \
             'https://chromium.googlesource.com/v8/v8', refusing to rebind to \
             'https://example.com/forks/v8'"
        );
        assert!(err.is_fatal());
    }

    #[test]
    fn test_provider_error_conversion() {
        let provider_err = ProviderError::NotFound("commit abc123".to_string());
        let err: BisectError = provider_err.into();
        assert!(matches!(err, BisectError::Provider(_)));
        assert_eq!(
            err.to_string(),
            "History provider error: not found: commit abc123"
        );
    }

    #[test]
    fn test_error_from_anyhow() {
        let anyhow_err = anyhow::anyhow!("store unavailable");
        let err: BisectError = anyhow_err.into();
        assert!(matches!(err, BisectError::Other(_)));
    }

    #[test]
    fn test_is_fatal() {
        let recoverable = BisectError::UnsupportedPinFormat("a@b@c".to_string());
        assert!(!recoverable.is_fatal());
    }
}
