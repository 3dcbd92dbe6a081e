//! Repository label registry
//!
//! Maps short repository labels to canonical repository URLs. The backing
//! store is injected through [`RegistryStore`] so the core stays independent
//! of any particular storage technology; [`RepositoryDirectory`] layers the
//! lookup and atomic-registration semantics on top of the raw get/set
//! surface.

use crate::error::{BisectError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// A single registry entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepositoryEntry {
    /// Canonical repository URL, stored without a trailing `.git`
    pub repository_url: String,
}

/// The fully-materialized registry table: label -> entry
pub type RepositoryMap = HashMap<String, RepositoryEntry>;

/// Trait for the keyed store backing the repository registry
///
/// The registry is a small table read and replaced whole; implementations
/// over a paginated store are out of scope.
#[async_trait::async_trait]
pub trait RegistryStore: Send + Sync {
    /// Read the whole registry table
    async fn get(&self) -> anyhow::Result<RepositoryMap>;

    /// Replace the whole registry table
    async fn set(&self, map: RepositoryMap) -> anyhow::Result<()>;
}

/// Strip a trailing `.git` suffix; registry URLs are stored without it
fn normalize_url(repository_url: &str) -> &str {
    repository_url.strip_suffix(".git").unwrap_or(repository_url)
}

/// Directory of repository labels with atomic lazy registration
///
/// Registration is read-check-write under a mutex so that two concurrent
/// callers encountering the same unknown URL create at most one label, and a
/// genuine collision (same label, different URL) is detected rather than
/// lost.
pub struct RepositoryDirectory {
    store: Arc<dyn RegistryStore>,
    register_lock: Mutex<()>,
}

impl RepositoryDirectory {
    pub fn new(store: Arc<dyn RegistryStore>) -> Self {
        Self {
            store,
            register_lock: Mutex::new(()),
        }
    }

    /// Resolve a label to its repository URL.
    /// Fails with [`BisectError::UnknownRepository`] if the label has no
    /// entry.
    pub async fn url(&self, label: &str) -> Result<String> {
        let map = self.store.get().await?;
        map.get(label)
            .map(|entry| entry.repository_url.clone())
            .ok_or_else(|| BisectError::UnknownRepository(label.to_string()))
    }

    /// Resolve a repository URL (with or without a `.git` suffix) to its
    /// label. Fails with [`BisectError::UnknownRepository`] if no entry
    /// matches; this never registers anything.
    pub async fn label(&self, repository_url: &str) -> Result<String> {
        let url = normalize_url(repository_url);
        let map = self.store.get().await?;
        map.iter()
            .find(|(_, entry)| entry.repository_url == url)
            .map(|(label, _)| label.clone())
            .ok_or_else(|| BisectError::UnknownRepository(url.to_string()))
    }

    /// Resolve a URL to its label, registering a new label derived from the
    /// URL's final path segment if the URL is not yet known.
    ///
    /// Fails with [`BisectError::LabelCollision`] if the derived label
    /// already maps to a different URL; that invariant violation is fatal to
    /// the enclosing operation.
    pub async fn resolve_or_register(&self, repository_url: &str) -> Result<String> {
        let url = normalize_url(repository_url);

        let _guard = self.register_lock.lock().await;

        // Re-check under the lock: a concurrent caller may have won the race,
        // in which case its label is ours too.
        let mut map = self.store.get().await?;
        if let Some((label, _)) = map.iter().find(|(_, entry)| entry.repository_url == url) {
            return Ok(label.clone());
        }

        let label = url.rsplit('/').next().unwrap_or(url).to_string();
        if let Some(existing) = map.get(&label) {
            return Err(BisectError::LabelCollision {
                label,
                existing: existing.repository_url.clone(),
                requested: url.to_string(),
            });
        }

        tracing::info!("Registering repository '{}' -> {}", label, url);
        map.insert(
            label.clone(),
            RepositoryEntry {
                repository_url: url.to_string(),
            },
        );
        self.store.set(map).await?;

        Ok(label)
    }
}

/// In-memory registry store
///
/// The reference backing for tests and single-process deployments; services
/// persisting the registry implement [`RegistryStore`] over their own
/// storage.
#[derive(Default)]
pub struct InMemoryStore {
    map: RwLock<RepositoryMap>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with (label, url) pairs
    pub fn with_entries<I, L, U>(entries: I) -> Self
    where
        I: IntoIterator<Item = (L, U)>,
        L: Into<String>,
        U: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(label, url)| {
                (
                    label.into(),
                    RepositoryEntry {
                        repository_url: url.into(),
                    },
                )
            })
            .collect();
        Self {
            map: RwLock::new(map),
        }
    }
}

#[async_trait::async_trait]
impl RegistryStore for InMemoryStore {
    async fn get(&self) -> anyhow::Result<RepositoryMap> {
        Ok(self.map.read().await.clone())
    }

    async fn set(&self, map: RepositoryMap) -> anyhow::Result<()> {
        *self.map.write().await = map;
        Ok(())
    }
}
