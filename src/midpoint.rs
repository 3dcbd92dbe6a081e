//! Bisection midpoint selection
//!
//! Given the two endpoints of a linear commit range, picks the commit the
//! next bisection step should investigate. The resolver is stateless; each
//! call is a pure function of its inputs and the current remote history.

use crate::commit::Commit;
use crate::error::{BisectError, Result};
use crate::history::HistoryProvider;
use crate::registry::RepositoryDirectory;
use std::sync::Arc;

/// Resolves the midpoint of an ancestor/descendant commit range
pub struct MidpointResolver {
    directory: Arc<RepositoryDirectory>,
    history: Arc<dyn HistoryProvider>,
}

impl MidpointResolver {
    pub fn new(directory: Arc<RepositoryDirectory>, history: Arc<dyn HistoryProvider>) -> Self {
        Self { directory, history }
    }

    /// Return a commit halfway between `a` and `b`.
    ///
    /// The caller asserts that `a` is an ancestor of (or equal to) `b`;
    /// ancestry is not verified beyond what the range query implies.
    ///
    /// Returns `a` if the commits are the same or adjacent. For a range with
    /// an even number of candidate commits this selects the commit before
    /// the arithmetic midpoint, counted newest to oldest. That asymmetry
    /// determines which half a bisection narrows into and must not be
    /// changed to the other rounding.
    ///
    /// Fails with [`BisectError::NonLinear`] if the commits are in different
    /// repositories or `a` does not come before `b`.
    pub async fn midpoint(&self, a: &Commit, b: &Commit) -> Result<Commit> {
        if a == b {
            return Ok(a.clone());
        }

        if a.repository() != b.repository() {
            return Err(BisectError::NonLinear(format!(
                "repositories differ between commits: {} vs {}",
                a.repository(),
                b.repository()
            )));
        }

        let repository_url = a.repository_url(&self.directory).await?;
        let mut range = self
            .history
            .commit_range(&repository_url, a.git_hash(), b.git_hash())
            .await?;

        if range.is_empty() {
            return Err(BisectError::NonLinear(format!(
                "commit {} does not come before commit {}",
                a.short_label(),
                b.short_label()
            )));
        }
        if range.len() == 1 {
            // Adjacent commits; no finer bisection is possible.
            return Ok(a.clone());
        }

        // Drop b itself, leaving the candidates newest-first ending at a.
        range.remove(0);
        let midpoint = &range[range.len() / 2];
        tracing::debug!(
            "Midpoint of {}..{} over {} candidates: {}",
            a.short_label(),
            b.short_label(),
            range.len(),
            midpoint.commit
        );
        Ok(Commit::new(a.repository(), midpoint.commit.clone()))
    }
}
