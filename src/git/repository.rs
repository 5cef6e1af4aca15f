use crate::domain::TagRecord;
use crate::error::{AutoVersionError, Result};
use crate::git::Change;
use chrono::{DateTime, FixedOffset};
use git2::{
    Commit, DiffOptions, Oid, Repository as Git2Repo, Sort, Status, StatusOptions, Time, Tree,
};
use std::collections::{BinaryHeap, HashSet};
use std::path::{Component, Path};
use tracing::trace;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    /// Root of the working copy
    pub fn workdir(&self) -> Result<&Path> {
        self.repo.workdir().ok_or_else(|| {
            AutoVersionError::source_data(format!(
                "repository at '{}' has no working directory",
                self.repo.path().display()
            ))
        })
    }

    /// Path of `dir` relative to the working copy root, with `/` separators.
    ///
    /// Returns `None` for the root itself.
    pub fn relative_path<P: AsRef<Path>>(&self, dir: P) -> Result<Option<String>> {
        let root = self.workdir()?.canonicalize()?;
        let dir = dir.as_ref().canonicalize()?;

        let relative = dir.strip_prefix(&root).map_err(|_| {
            AutoVersionError::source_data(format!(
                "'{}' is outside the repository at '{}'",
                dir.display(),
                root.display()
            ))
        })?;

        let mut segments = Vec::new();
        for component in relative.components() {
            if let Component::Normal(segment) = component {
                let segment = segment.to_str().ok_or_else(|| {
                    AutoVersionError::source_data(format!(
                        "path '{}' is not valid UTF-8",
                        relative.display()
                    ))
                })?;
                segments.push(segment);
            }
        }

        if segments.is_empty() {
            Ok(None)
        } else {
            Ok(Some(segments.join("/")))
        }
    }

    fn head_commit(&self) -> Result<Commit<'_>> {
        Ok(self.repo.head()?.peel_to_commit()?)
    }

    fn short_id(&self, commit: &Commit<'_>) -> Result<String> {
        let buf = commit.as_object().short_id()?;
        buf.as_str().map(str::to_string).ok_or_else(|| {
            AutoVersionError::source_data(format!("short id of {} is not valid UTF-8", commit.id()))
        })
    }

    /// Whether `tree` differs from `base` (or from the empty tree) under `path`
    fn differs(&self, base: Option<&Tree<'_>>, tree: &Tree<'_>, path: &str) -> Result<bool> {
        let mut options = DiffOptions::new();
        options.pathspec(path);
        let diff = self
            .repo
            .diff_tree_to_tree(base, Some(tree), Some(&mut options))?;
        Ok(diff.deltas().len() > 0)
    }

    /// Decide whether `commit` changes `path` and which parents to walk next.
    ///
    /// A merge unchanged under `path` relative to a walked parent follows
    /// only that parent and is not reported. Parents in `hidden` never
    /// simplify a merge and only decide the outcome when every parent is
    /// hidden.
    fn simplify(
        &self,
        commit: &Commit<'_>,
        path: &str,
        hidden: &HashSet<Oid>,
    ) -> Result<(bool, Vec<(i64, Oid)>)> {
        let tree = commit.tree()?;
        if commit.parent_count() == 0 {
            return Ok((self.differs(None, &tree, path)?, Vec::new()));
        }

        let mut next = Vec::with_capacity(commit.parent_count());
        let mut walked_parents = 0;
        let (mut walked_change, mut hidden_change) = (false, false);

        for parent in commit.parents() {
            let walked = !hidden.contains(&parent.id());
            let same = !self.differs(Some(&parent.tree()?), &tree, path)?;
            let entry = (parent.time().seconds(), parent.id());

            match (same, walked) {
                (true, true) => return Ok((false, vec![entry])),
                (true, false) => {}
                (false, true) => walked_change = true,
                (false, false) => hidden_change = true,
            }
            if walked {
                walked_parents += 1;
            }
            next.push(entry);
        }

        let changed = if walked_parents > 0 {
            walked_change
        } else {
            hidden_change
        };
        Ok((changed, next))
    }

    /// Commits changing `path` that are reachable from `HEAD` but not from
    /// any commit in `hidden`, most recently committed first.
    ///
    /// Follows the default history simplification of `git log -- <path>`.
    /// Stops after `limit` commits when given.
    fn path_history(
        &self,
        path: &str,
        hidden: &HashSet<Oid>,
        limit: Option<usize>,
    ) -> Result<Vec<Oid>> {
        let head = self.head_commit()?;
        let mut queue = BinaryHeap::new();
        let mut seen = HashSet::new();
        let mut found = Vec::new();

        if !hidden.contains(&head.id()) {
            seen.insert(head.id());
            queue.push((head.time().seconds(), head.id()));
        }

        while let Some((_, oid)) = queue.pop() {
            let commit = self.repo.find_commit(oid)?;
            let (changed, parents) = self.simplify(&commit, path, hidden)?;

            if changed {
                found.push(oid);
                if limit.is_some_and(|limit| found.len() >= limit) {
                    break;
                }
            }

            for (time, parent) in parents {
                if !hidden.contains(&parent) && seen.insert(parent) {
                    queue.push((time, parent));
                }
            }
        }

        Ok(found)
    }

    /// Every commit reachable from `tip`, inclusive
    fn ancestry(&self, tip: Oid) -> Result<HashSet<Oid>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push(tip)?;
        revwalk
            .map(|oid| oid.map_err(AutoVersionError::from))
            .collect()
    }

    fn history_from_head(&self, hide: Option<Oid>) -> Result<git2::Revwalk<'_>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME)?;
        revwalk.push_head()?;
        if let Some(oid) = hide {
            revwalk.hide(oid)?;
        }
        Ok(revwalk)
    }

    fn tag_record(&self, name: &str) -> Result<TagRecord> {
        let commit = self
            .repo
            .find_reference(&format!("refs/tags/{}", name))
            .and_then(|reference| reference.peel_to_commit())
            .map_err(|e| {
                AutoVersionError::source_data(format!(
                    "tag '{}' does not point at a commit: {}",
                    name, e
                ))
            })?;

        let commit_date = commit_date(commit.committer().when()).ok_or_else(|| {
            AutoVersionError::source_data(format!("tag '{}' has an invalid commit date", name))
        })?;

        Ok(TagRecord {
            name: name.to_string(),
            commit_date: Some(commit_date),
            subject: commit.summary().unwrap_or_default().to_string(),
            short_id: self.short_id(&commit)?,
            long_id: commit.id().to_string(),
        })
    }
}

fn commit_date(when: Time) -> Option<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(when.offset_minutes().checked_mul(60)?)?;
    DateTime::from_timestamp(when.seconds(), 0).map(|utc| utc.with_timezone(&offset))
}

fn status_code(status: Status) -> char {
    if status.is_conflicted() {
        'U'
    } else if status.intersects(Status::INDEX_NEW) {
        'A'
    } else if status.intersects(Status::INDEX_DELETED | Status::WT_DELETED) {
        'D'
    } else if status.intersects(Status::INDEX_RENAMED | Status::WT_RENAMED) {
        'R'
    } else if status.intersects(Status::INDEX_TYPECHANGE | Status::WT_TYPECHANGE) {
        'T'
    } else if status.intersects(Status::WT_NEW) {
        '?'
    } else {
        'M'
    }
}

impl super::Repository for Git2Repository {
    fn tags(&self, pattern: &str) -> Result<Vec<TagRecord>> {
        trace!(pattern, "listing tags");
        let names = self.repo.tag_names(Some(pattern))?;

        let mut records = names
            .iter()
            .flatten()
            .map(|name| self.tag_record(name))
            .collect::<Result<Vec<_>>>()?;

        // most recently committed first
        records.sort_by(|a, b| b.commit_date.cmp(&a.commit_date));
        Ok(records)
    }

    fn commit_id(&self, short: bool, path: Option<&str>) -> Result<String> {
        trace!(short, path, "looking up commit id");
        let commit = match path {
            None => self.head_commit()?,
            Some(path) => {
                let last = self
                    .path_history(path, &HashSet::new(), Some(1))?
                    .into_iter()
                    .next()
                    .ok_or_else(|| {
                        AutoVersionError::source_data(format!("no commit touches path '{}'", path))
                    })?;
                self.repo.find_commit(last)?
            }
        };

        if short {
            self.short_id(&commit)
        } else {
            Ok(commit.id().to_string())
        }
    }

    fn commit_count(&self, tag: &str, path: Option<&str>) -> Result<u32> {
        trace!(tag, path, "counting commits");
        let tagged = self
            .repo
            .revparse_single(&format!("refs/tags/{}", tag))?
            .peel_to_commit()?;

        let commits = match path {
            Some(path) => {
                let hidden = self.ancestry(tagged.id())?;
                self.path_history(path, &hidden, None)?.len()
            }
            None => {
                let mut count = 0;
                for oid in self.history_from_head(Some(tagged.id()))? {
                    oid?;
                    count += 1;
                }
                count
            }
        };

        u32::try_from(commits).map_err(|_| {
            AutoVersionError::source_data(format!("too many commits since '{}'", tag))
        })
    }

    fn branch_name(&self) -> Result<String> {
        let head = self.repo.head()?;
        if !head.is_branch() {
            return Ok("HEAD".to_string());
        }
        head.shorthand().map(str::to_string).ok_or_else(|| {
            AutoVersionError::source_data("branch name is not valid UTF-8".to_string())
        })
    }

    fn status(&self, path: Option<&str>) -> Result<Vec<Change>> {
        trace!(path, "reading status");
        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);
        if let Some(path) = path {
            options.pathspec(path);
        }

        let statuses = self.repo.statuses(Some(&mut options))?;
        statuses
            .iter()
            .filter(|entry| entry.status() != Status::CURRENT)
            .map(|entry| {
                let path = entry.path().ok_or_else(|| {
                    AutoVersionError::source_data("changed path is not valid UTF-8".to_string())
                })?;
                Ok(Change::new(status_code(entry.status()), path))
            })
            .collect()
    }
}
