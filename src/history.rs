//! Read-only query surface over a remote commit graph
//!
//! The core never clones or mirrors repositories; everything it knows about
//! history comes through this trait. Implementations typically wrap a
//! gitiles-style HTTP API. Retry and timeout policy belongs to the
//! implementation, not to callers in this crate.

use crate::error::ProviderError;
use serde::{Deserialize, Serialize};

/// Metadata for a single commit as reported by the history service
///
/// Only the hash is required by the core; the remaining fields are carried
/// through for callers that want to display them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitMetadata {
    /// Full commit hash
    pub commit: String,
    /// Author line, if the backend reports one
    #[serde(default)]
    pub author: Option<String>,
    /// Commit message, if the backend reports one
    #[serde(default)]
    pub message: Option<String>,
}

impl CommitMetadata {
    /// Metadata carrying only a hash
    pub fn from_hash(commit: impl Into<String>) -> Self {
        Self {
            commit: commit.into(),
            author: None,
            message: None,
        }
    }
}

/// Trait for querying a remote commit history service
#[async_trait::async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Fetch raw file contents at a given commit.
    /// Fails with [`ProviderError::NotFound`] if the path does not exist at
    /// that commit.
    async fn file_contents(
        &self,
        repository_url: &str,
        git_hash: &str,
        path: &str,
    ) -> Result<String, ProviderError>;

    /// Fetch metadata for a single commit.
    /// Fails with [`ProviderError::NotFound`] if the commit does not exist.
    async fn commit_info(
        &self,
        repository_url: &str,
        git_hash: &str,
    ) -> Result<CommitMetadata, ProviderError>;

    /// Fetch the ordered list of commits from `high_hash` down to `low_hash`
    /// inclusive, newest first, following first parents. Returns an empty
    /// list if no path exists between the two hashes.
    async fn commit_range(
        &self,
        repository_url: &str,
        low_hash: &str,
        high_hash: &str,
    ) -> Result<Vec<CommitMetadata>, ProviderError>;
}
