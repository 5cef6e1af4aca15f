//! Where a version came from: a tag, or the fallback commit id

use crate::domain::version::Version;
use chrono::{DateTime, FixedOffset};
use regex::Regex;
use std::fmt;
use std::rc::Rc;

/// Locates the version inside a tag name, e.g. `child1/v2.0.0-CHILD1` -> `2.0.0-CHILD1`.
/// The qualifier grammar is the same one [`Version::parse`] accepts.
const TAG_VERSION_PATTERN: &str = r"v(\d+(?:\.\d+){0,2}(?:-[A-Za-z0-9.-]+)?)";

/// The kind of a version source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    Tag,
    Commit,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceType::Tag => write!(f, "TAG"),
            SourceType::Commit => write!(f, "COMMIT"),
        }
    }
}

/// Deferred, human readable description of where a source was found.
///
/// The closure only runs when the description is displayed.
#[derive(Clone)]
pub struct Explanation(Rc<dyn Fn() -> String>);

impl Explanation {
    pub fn new(describe: impl Fn() -> String + 'static) -> Self {
        Explanation(Rc::new(describe))
    }

    pub fn describe(&self) -> String {
        (self.0)()
    }
}

impl fmt::Debug for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Explanation(..)")
    }
}

/// Tag data as reported by the repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    pub name: String,
    pub commit_date: Option<DateTime<FixedOffset>>,
    pub subject: String,
    pub short_id: String,
    pub long_id: String,
}

impl TagRecord {
    /// A record with only a name, for tags whose commit metadata is not needed
    pub fn named(name: impl Into<String>) -> Self {
        TagRecord {
            name: name.into(),
            commit_date: None,
            subject: String::new(),
            short_id: String::new(),
            long_id: String::new(),
        }
    }
}

/// A tag used as version source
#[derive(Debug, Clone)]
pub struct GitTag {
    record: TagRecord,
    explanation: Explanation,
}

impl GitTag {
    pub fn new(record: TagRecord, explanation: Explanation) -> Self {
        GitTag {
            record,
            explanation,
        }
    }

    pub fn record(&self) -> &TagRecord {
        &self.record
    }

    /// The version part of the tag name, or the whole name when no
    /// `v<digits>` run is found
    pub fn version_string(&self) -> &str {
        Regex::new(TAG_VERSION_PATTERN)
            .ok()
            .and_then(|re| re.captures(&self.record.name))
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str())
            .unwrap_or(&self.record.name)
    }
}

/// The last commit id, used when no tag is available
#[derive(Debug, Clone)]
pub struct CommitSource {
    id: String,
    explanation: Explanation,
}

impl CommitSource {
    pub fn new(id: impl Into<String>, explanation: Explanation) -> Self {
        CommitSource {
            id: id.into(),
            explanation,
        }
    }
}

/// A candidate source of version information
#[derive(Debug, Clone)]
pub enum VersionSource {
    Tag(GitTag),
    Commit(CommitSource),
}

impl VersionSource {
    pub fn source_type(&self) -> SourceType {
        match self {
            VersionSource::Tag(_) => SourceType::Tag,
            VersionSource::Commit(_) => SourceType::Commit,
        }
    }

    /// Raw text of the source: the tag name or the commit id
    pub fn value(&self) -> &str {
        match self {
            VersionSource::Tag(tag) => &tag.record.name,
            VersionSource::Commit(commit) => &commit.id,
        }
    }

    pub fn explanation(&self) -> &Explanation {
        match self {
            VersionSource::Tag(tag) => &tag.explanation,
            VersionSource::Commit(commit) => &commit.explanation,
        }
    }

    pub fn version(&self) -> Version {
        match self {
            VersionSource::Tag(tag) => Version::parse(tag.version_string()),
            VersionSource::Commit(commit) => Version::parse(&commit.id),
        }
    }

    /// Type, value and interpreted version on one line
    pub fn display_string(&self) -> String {
        format!(
            "{} '{}' interpreted as version={}",
            self.source_type(),
            self.value(),
            self.version()
        )
    }
}

impl fmt::Display for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn tag(name: &str) -> VersionSource {
        VersionSource::Tag(GitTag::new(
            TagRecord::named(name),
            Explanation::new(|| "test tags".to_string()),
        ))
    }

    #[test]
    fn test_tag_version_strips_prefix() {
        assert_eq!(tag("v1.0.0").version().to_string(), "1.0.0");
        assert_eq!(tag("v3.1").version().to_string(), "3.1");
        assert!(tag("v1.0.0").version().is_incrementable());
    }

    #[test]
    fn test_scoped_tag_version() {
        let source = tag("child1/v2.0.0-CHILD1");
        let version = source.version();
        assert_eq!(version.to_string(), "2.0.0-CHILD1");
        assert_eq!(version.qualifier(), "CHILD1");
    }

    #[test]
    fn test_lowercase_and_dotted_qualifier() {
        assert_eq!(tag("v1.2.0-rc.1").version().to_string(), "1.2.0-rc.1");
    }

    #[test]
    fn test_tag_without_version_used_verbatim() {
        let version = tag("release").version();
        assert!(!version.is_incrementable());
        assert_eq!(version.to_string(), "release");
    }

    #[test]
    fn test_commit_source() {
        let source = VersionSource::Commit(CommitSource::new(
            "abc1234",
            Explanation::new(|| "Commit ID on project @ child1".to_string()),
        ));
        assert_eq!(source.source_type(), SourceType::Commit);
        assert_eq!(source.value(), "abc1234");
        assert!(!source.version().is_incrementable());
        assert_eq!(source.explanation().describe(), "Commit ID on project @ child1");
    }

    #[test]
    fn test_display_string() {
        assert_eq!(
            tag("v1.0.0").display_string(),
            "TAG 'v1.0.0' interpreted as version=1.0.0"
        );
    }

    #[test]
    fn test_explanation_is_lazy() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let source = VersionSource::Commit(CommitSource::new(
            "abc1234",
            Explanation::new(move || {
                counter.set(counter.get() + 1);
                "lazy".to_string()
            }),
        ));

        let _ = source.version();
        assert_eq!(calls.get(), 0);

        assert_eq!(source.explanation().describe(), "lazy");
        assert_eq!(calls.get(), 1);
    }
}
