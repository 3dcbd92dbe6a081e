//! Dependency-pin extraction
//!
//! Reads the dependency specification document of a commit and turns every
//! pinned entry into a [`Commit`], registering previously-unseen repository
//! URLs in the directory along the way.

/// Restricted declarative grammar for dependency documents
pub mod parser;

pub use parser::ResolvedDeps;

use crate::commit::Commit;
use crate::error::{BisectError, Result};
use crate::history::HistoryProvider;
use crate::registry::RepositoryDirectory;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Well-known path of the dependency specification document
pub const DEFAULT_DEPS_FILE: &str = "DEPS";

/// Extracts pinned sub-dependency commits from dependency documents
pub struct DependencyExtractor {
    directory: Arc<RepositoryDirectory>,
    history: Arc<dyn HistoryProvider>,
    deps_file: String,
}

impl DependencyExtractor {
    pub fn new(directory: Arc<RepositoryDirectory>, history: Arc<dyn HistoryProvider>) -> Self {
        Self {
            directory,
            history,
            deps_file: DEFAULT_DEPS_FILE.to_string(),
        }
    }

    /// Override the dependency document path (defaults to `DEPS`)
    pub fn with_deps_file(mut self, path: impl Into<String>) -> Self {
        self.deps_file = path.into();
        self
    }

    /// Return the dependency pins of a commit as a set of [`Commit`]s.
    ///
    /// Unpinned entries (no `@` in the pin string) are skipped; a pin with
    /// more than one `@` fails with [`BisectError::UnsupportedPinFormat`].
    /// Repository URLs not yet in the directory are registered under a label
    /// derived from the URL's final path segment.
    pub async fn extract_pins(&self, commit: &Commit) -> Result<HashSet<Commit>> {
        let repository_url = commit.repository_url(&self.directory).await?;
        let contents = self
            .history
            .file_contents(&repository_url, commit.git_hash(), &self.deps_file)
            .await?;

        let resolved = parser::parse(&contents)?;
        let merged = merge_os_overlays(resolved);

        let mut pins = HashSet::new();
        for (path, pin) in &merged {
            let parts: Vec<&str> = pin.split('@').collect();
            let (dep_url, git_hash) = match parts.as_slice() {
                // Not pinned to any particular revision.
                [_] => continue,
                [url, hash] => (*url, *hash),
                _ => return Err(BisectError::UnsupportedPinFormat(pin.clone())),
            };

            let label = self.directory.resolve_or_register(dep_url).await?;
            tracing::debug!("Pin {} -> {}@{}", path, label, git_hash);
            pins.insert(Commit::new(label, git_hash));
        }

        tracing::debug!(
            "Extracted {} pins from {} entries at {}",
            pins.len(),
            merged.len(),
            commit.short_label()
        );
        Ok(pins)
    }
}

/// Fold the OS-keyed overlays into the base `deps` mapping.
///
/// Overlays are applied in sorted OS-key order with last-write-wins on path
/// collision, so the result never depends on map iteration order. A
/// collision that changes an already-merged pin is logged; the final pin for
/// a path is whichever overlay sorts last.
fn merge_os_overlays(resolved: ResolvedDeps) -> HashMap<String, String> {
    let mut merged = resolved.deps;
    for (os, overlay) in resolved.deps_os {
        for (path, pin) in overlay {
            if let Some(previous) = merged.insert(path.clone(), pin.clone())
                && previous != pin
            {
                tracing::warn!(
                    "deps_os['{}'] overrides pin for '{}' ({} -> {})",
                    os,
                    path,
                    previous,
                    pin
                );
            }
        }
    }
    merged
}
