//! Commit identity model
//!
//! A [`Commit`] names one point of history in one repository: a short
//! repository label paired with a git hash. Identities are immutable and
//! compared by exact value of both fields; there is no hash-prefix matching.
//! Hash validity is only checked on demand through [`Commit::from_record`],
//! never at construction.

use crate::error::{BisectError, ProviderError, Result};
use crate::history::HistoryProvider;
use crate::registry::RepositoryDirectory;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A repository pinned to a particular commit
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Commit {
    repository: String,
    git_hash: String,
}

/// Serialized form of a [`Commit`] for API boundaries
///
/// `url` is a browsable commit URL filled in by [`Commit::to_record`]; it is
/// a pure projection and is ignored when reconstructing.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CommitRecord {
    /// Short repository label, or a full repository URL on input
    pub repository: String,
    /// Full git hash
    pub git_hash: String,
    /// Browsable commit URL (output only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Commit {
    /// Construct an identity without validating the hash.
    ///
    /// Trusted construction path: callers are expected to hold hashes that
    /// either came from the history provider or were validated through
    /// [`Commit::from_record`].
    pub fn new(repository: impl Into<String>, git_hash: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            git_hash: git_hash.into(),
        }
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn git_hash(&self) -> &str {
        &self.git_hash
    }

    /// Short display form: `repository@` plus the first 7 hash characters
    pub fn short_label(&self) -> String {
        let prefix = self.git_hash.get(..7).unwrap_or(&self.git_hash);
        format!("{}@{}", self.repository, prefix)
    }

    /// A string unique to this repository and git hash, usable as a
    /// cache or lookup key
    pub fn key(&self) -> String {
        format!("{}@{}", self.repository, self.git_hash)
    }

    /// The HTTPS URL of the repository as passed to `git clone`.
    /// Fails with [`BisectError::UnknownRepository`] if the label is not
    /// registered.
    pub async fn repository_url(&self, directory: &RepositoryDirectory) -> Result<String> {
        directory.url(&self.repository).await
    }

    /// Project this identity to its serialized record, including the
    /// browsable commit URL
    pub async fn to_record(&self, directory: &RepositoryDirectory) -> Result<CommitRecord> {
        let url = self.repository_url(directory).await?;
        Ok(CommitRecord {
            repository: self.repository.clone(),
            git_hash: self.git_hash.clone(),
            url: Some(format!("{}/+/{}", url, self.git_hash)),
        })
    }

    /// Reconstruct an identity from a record and validate it.
    ///
    /// If the record's `repository` field is a full URL it is resolved to
    /// its short label first; an unknown URL is an error, never an
    /// auto-registration. The commit is then validated against the history
    /// provider; a not-found response fails with
    /// [`BisectError::UnknownCommit`] carrying the provider's message.
    ///
    /// This is the only construction path that validates the hash.
    pub async fn from_record(
        record: &CommitRecord,
        directory: &RepositoryDirectory,
        history: &dyn HistoryProvider,
    ) -> Result<Commit> {
        let repository = if record.repository.contains("://") {
            directory.label(&record.repository).await?
        } else {
            record.repository.clone()
        };

        let commit = Commit::new(repository, record.git_hash.clone());

        let url = commit.repository_url(directory).await?;
        match history.commit_info(&url, &commit.git_hash).await {
            Ok(_) => Ok(commit),
            Err(ProviderError::NotFound(msg)) => Err(BisectError::UnknownCommit(msg)),
            Err(err) => Err(err.into()),
        }
    }
}

impl fmt::Display for Commit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_label())
    }
}
