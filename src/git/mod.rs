//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the repository queries
//! version resolution needs, allowing for multiple implementations including
//! real Git repositories and mock implementations for testing.
//!
//! # Overview
//!
//! The primary abstraction is the [Repository] trait. The concrete
//! implementations include:
//!
//! - [repository::Git2Repository]: A real implementation using the `git2` crate
//! - [mock::MockRepository]: An in-memory implementation for testing
//!
//! # Usage
//!
//! Resolution code depends on the [Repository] trait rather than concrete
//! implementations, and receives the repository explicitly.
//!
//! ```rust
//! # use git_autoversion::git::Repository;
//! # fn example<R: Repository>(repo: &R) -> git_autoversion::Result<()> {
//! let tags = repo.tags("v*")?;
//! let dirty = repo.is_dirty(Some("child1"))?;
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::domain::TagRecord;
use crate::error::Result;
use std::fmt;

/// An uncommitted change in the working copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    /// Short status code, e.g. `M` (modified), `A` (added), `?` (untracked)
    pub status: char,
    /// Path relative to the repository root
    pub path: String,
}

impl Change {
    pub fn new(status: char, path: impl Into<String>) -> Self {
        Change {
            status,
            path: path.into(),
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.path)
    }
}

/// Repository queries used to resolve a version
///
/// ## Paths
///
/// Every `path` argument is relative to the repository root. `None` means the
/// whole repository.
///
/// ## Error Handling
///
/// All methods return [crate::error::Result<T>]. Implementations map
/// underlying errors (like `git2::Error`) to the appropriate
/// [crate::error::AutoVersionError] variants, and report malformed data as
/// [crate::error::AutoVersionError::SourceData].
///
/// ## Implementations
///
/// - [Git2Repository](repository::Git2Repository): Real Git implementation using the `git2` crate
/// - [MockRepository](mock::MockRepository): Test implementation
pub trait Repository {
    /// Get the tags whose names match a glob pattern
    ///
    /// # Arguments
    /// * `pattern` - Glob over tag names (e.g. `"v*"`, `"child1/*"`)
    ///
    /// # Returns
    /// * `Ok(Vec<TagRecord>)` - Matching tags, most recently committed first
    /// * `Err` - If a tag cannot be read or its data is malformed
    fn tags(&self, pattern: &str) -> Result<Vec<TagRecord>>;

    /// Get the id of the last commit touching `path`, or of `HEAD` when no
    /// path is given
    ///
    /// # Arguments
    /// * `short` - Abbreviated id instead of the full hex id
    /// * `path` - Optional path restricting which commits count
    fn commit_id(&self, short: bool, path: Option<&str>) -> Result<String>;

    /// Count the commits reachable from `HEAD` but not from `tag`,
    /// optionally only those touching `path`
    fn commit_count(&self, tag: &str, path: Option<&str>) -> Result<u32>;

    /// Short name of the checked out branch, `"HEAD"` when detached
    fn branch_name(&self) -> Result<String>;

    /// Uncommitted changes, optionally restricted to `path`
    fn status(&self, path: Option<&str>) -> Result<Vec<Change>>;

    /// Whether there are uncommitted changes, optionally restricted to `path`
    fn is_dirty(&self, path: Option<&str>) -> Result<bool> {
        Ok(!self.status(path)?.is_empty())
    }
}
