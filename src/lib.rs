//! # Commit Bisect - Range-Bisection Primitives for Regression Search
//!
//! Core building blocks for a commit-range bisection service: a commit
//! identity model, dependency-pin extraction from DEPS-style documents, and
//! the midpoint selection that drives each bisection step.
//!
//! ## Overview
//!
//! A bisection job repeatedly narrows an ancestor/descendant commit range
//! until it isolates the commit that introduced a regression. This crate
//! owns the three pieces with real algorithmic content:
//!
//! - **Commit identity**: an immutable (repository label, git hash) value
//!   with validated reconstruction from API records
//! - **Dependency extraction**: a restricted declarative DEPS parser that
//!   turns pinned sub-dependencies into commit identities without executing
//!   the document
//! - **Midpoint selection**: deterministic halving of a linear commit range,
//!   preserving the exact tie-break parity bisection convergence depends on
//!
//! Everything else - the repository registry's storage and the remote
//! history service - is injected through traits. The crate owns no CLI, file
//! format, or wire protocol; it is a library consumed by a surrounding
//! service.
//!
//! ## Usage Example
//!
//! ```no_run
//! use commit_bisect::commit::Commit;
//! use commit_bisect::midpoint::MidpointResolver;
//! use commit_bisect::registry::{InMemoryStore, RepositoryDirectory};
//! use std::sync::Arc;
//!
//! # async fn example(history: Arc<dyn commit_bisect::history::HistoryProvider>) -> commit_bisect::error::Result<()> {
//! let store = Arc::new(InMemoryStore::with_entries([(
//!     "chromium",
//!     "https://chromium.googlesource.com/chromium/src",
//! )]));
//! let directory = Arc::new(RepositoryDirectory::new(store));
//! let resolver = MidpointResolver::new(directory, history);
//!
//! let good = Commit::new("chromium", "0e57e34b9a1d00b3f56ecba9a1dde9d2b4a3e2f1");
//! let bad = Commit::new("chromium", "f44c2ba5a7eb7c0fd95d0e1d71cbfd3bbbeb1e77");
//! let next = resolver.midpoint(&good, &bad).await?;
//! # Ok(())
//! # }
//! ```

/// Commit identity values and their serialized records
pub mod commit;

/// Dependency-pin extraction and the restricted DEPS parser
pub mod deps;

/// Error types and result alias
pub mod error;

/// Read-only history-service trait and commit metadata
pub mod history;

/// Bisection midpoint selection
pub mod midpoint;

/// Repository label registry and its storage trait
pub mod registry;
