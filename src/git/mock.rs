use crate::domain::TagRecord;
use crate::error::{AutoVersionError, Result};
use crate::git::{Change, Repository};
use std::cell::Cell;
use std::collections::HashMap;

/// Mock repository for testing without actual git operations
///
/// Tags are returned in insertion order, so add them most recent first.
pub struct MockRepository {
    tags: Vec<TagRecord>,
    head_id: String,
    path_ids: HashMap<String, String>,
    commit_counts: HashMap<(String, Option<String>), u32>,
    branch: String,
    changes: Vec<Change>,
    commit_count_calls: Cell<usize>,
}

impl MockRepository {
    /// Create a new empty mock repository on branch `main`
    pub fn new() -> Self {
        MockRepository {
            tags: Vec::new(),
            head_id: "0000000".to_string(),
            path_ids: HashMap::new(),
            commit_counts: HashMap::new(),
            branch: "main".to_string(),
            changes: Vec::new(),
            commit_count_calls: Cell::new(0),
        }
    }

    /// Add a tag. Tags added earlier are treated as more recent.
    pub fn add_tag(&mut self, record: TagRecord) {
        self.tags.push(record);
    }

    /// Set the id reported for `HEAD`
    pub fn set_head_id(&mut self, id: impl Into<String>) {
        self.head_id = id.into();
    }

    /// Set the id of the last commit touching `path`
    pub fn set_path_id(&mut self, path: impl Into<String>, id: impl Into<String>) {
        self.path_ids.insert(path.into(), id.into());
    }

    /// Set the number of commits since `tag`, optionally under `path`
    pub fn set_commit_count(&mut self, tag: impl Into<String>, path: Option<&str>, count: u32) {
        self.commit_counts
            .insert((tag.into(), path.map(str::to_string)), count);
    }

    /// Set the checked out branch
    pub fn set_branch(&mut self, branch: impl Into<String>) {
        self.branch = branch.into();
    }

    /// Add an uncommitted change
    pub fn add_change(&mut self, change: Change) {
        self.changes.push(change);
    }

    /// How many times [`Repository::commit_count`] was called
    pub fn commit_count_calls(&self) -> usize {
        self.commit_count_calls.get()
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

/// Glob match supporting `*` and `?`, enough for tag patterns
fn glob_matches(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            backtrack = Some((p, t));
            p += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            t = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}

fn under_path(candidate: &str, path: &str) -> bool {
    candidate == path
        || candidate
            .strip_prefix(path)
            .is_some_and(|rest| rest.starts_with('/'))
}

impl Repository for MockRepository {
    fn tags(&self, pattern: &str) -> Result<Vec<TagRecord>> {
        Ok(self
            .tags
            .iter()
            .filter(|tag| glob_matches(pattern, &tag.name))
            .cloned()
            .collect())
    }

    fn commit_id(&self, _short: bool, path: Option<&str>) -> Result<String> {
        match path {
            None => Ok(self.head_id.clone()),
            Some(path) => self.path_ids.get(path).cloned().ok_or_else(|| {
                AutoVersionError::source_data(format!("no commit touches path '{}'", path))
            }),
        }
    }

    fn commit_count(&self, tag: &str, path: Option<&str>) -> Result<u32> {
        self.commit_count_calls.set(self.commit_count_calls.get() + 1);
        let key = (tag.to_string(), path.map(str::to_string));
        Ok(self.commit_counts.get(&key).copied().unwrap_or(0))
    }

    fn branch_name(&self) -> Result<String> {
        Ok(self.branch.clone())
    }

    fn status(&self, path: Option<&str>) -> Result<Vec<Change>> {
        Ok(self
            .changes
            .iter()
            .filter(|change| path.map_or(true, |p| under_path(&change.path, p)))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_matches() {
        assert!(glob_matches("v*", "v1.0.0"));
        assert!(glob_matches("child1/*", "child1/v2.0.0-CHILD1"));
        assert!(!glob_matches("v*", "child1/v2.0.0"));
        assert!(!glob_matches("child1/*", "child10/v1.0"));
        assert!(glob_matches("v?.0", "v1.0"));
        assert!(glob_matches("*", ""));
    }

    #[test]
    fn test_mock_repository_tags() {
        let mut repo = MockRepository::new();
        repo.add_tag(TagRecord::named("child1/v2.0.0"));
        repo.add_tag(TagRecord::named("v1.1.0"));
        repo.add_tag(TagRecord::named("v1.0.0"));

        let tags: Vec<String> = repo.tags("v*").unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(tags, vec!["v1.1.0", "v1.0.0"]);
        assert_eq!(repo.tags("child1/*").unwrap().len(), 1);
    }

    #[test]
    fn test_mock_repository_commit_ids() {
        let mut repo = MockRepository::new();
        repo.set_head_id("abc1234");
        repo.set_path_id("child1", "def5678");

        assert_eq!(repo.commit_id(true, None).unwrap(), "abc1234");
        assert_eq!(repo.commit_id(true, Some("child1")).unwrap(), "def5678");
        assert!(repo.commit_id(true, Some("child2")).is_err());
    }

    #[test]
    fn test_mock_repository_status_by_path() {
        let mut repo = MockRepository::new();
        repo.add_change(Change::new('M', "child1/src/lib.rs"));

        assert!(repo.is_dirty(None).unwrap());
        assert!(repo.is_dirty(Some("child1")).unwrap());
        assert!(!repo.is_dirty(Some("child2")).unwrap());
        assert!(!repo.is_dirty(Some("child")).unwrap());
    }

    #[test]
    fn test_mock_repository_counts_calls() {
        let mut repo = MockRepository::new();
        repo.set_commit_count("v1.0.0", None, 3);

        assert_eq!(repo.commit_count("v1.0.0", None).unwrap(), 3);
        assert_eq!(repo.commit_count("v1.0.0", Some("child1")).unwrap(), 0);
        assert_eq!(repo.commit_count_calls(), 2);
    }

    #[test]
    fn test_mock_repository_default() {
        let repo = MockRepository::default();
        assert!(repo.tags("*").unwrap().is_empty());
        assert_eq!(repo.branch_name().unwrap(), "main");
    }
}
