use crate::config::Config;
use crate::domain::amendment::apply_all;
use crate::domain::{
    Amendment, BranchRuleSet, CommitSource, Explanation, GitTag, SourceType, Version,
    VersionSource,
};
use crate::error::{AutoVersionError, Result};
use crate::git::Repository;
use std::fmt;
use tracing::debug;

/// Where the project lives inside the repository
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectContext {
    path: Option<String>,
    tag_scope: Option<String>,
}

impl ProjectContext {
    /// The whole repository, without scoped tags
    pub fn root() -> Self {
        ProjectContext::default()
    }

    /// A project at repository-relative `path` whose own tags live under
    /// `tag_scope/`. Blank values count as absent.
    pub fn new(path: Option<&str>, tag_scope: Option<&str>) -> Self {
        ProjectContext {
            path: non_blank(path),
            tag_scope: non_blank(tag_scope),
        }
    }

    /// A project whose tag scope is its path, e.g. `child1` with tags `child1/v1.0.0`
    pub fn at_path(path: &str) -> Self {
        ProjectContext::new(Some(path), Some(path))
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn tag_scope(&self) -> Option<&str> {
        self.tag_scope.as_deref()
    }

    fn display_path(&self) -> String {
        self.path.clone().unwrap_or_else(|| ".".to_string())
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim().trim_matches('/'))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Outcome of one resolution
#[derive(Debug)]
pub struct Resolution {
    /// The amended version
    pub version: Version,
    /// The source the version was taken from
    pub source: VersionSource,
    /// Candidates that were not selected, in precedence order
    pub alternatives: Vec<VersionSource>,
    /// Descriptions of the applied amendments, in application order
    pub amendments: Vec<String>,
    /// The checked out branch
    pub branch: String,
    /// Each auto-increment rule with its outcome for `branch`, in order
    pub branch_rules: Vec<(String, bool)>,
}

impl Resolution {
    /// Whether `branch` passed every auto-increment rule
    pub fn is_auto_increment_branch(&self) -> bool {
        self.branch_rules.iter().all(|(_, matched)| *matched)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.version, f)
    }
}

/// Take the first candidate; the rest are kept for explanation only
pub fn select_source(
    candidates: Vec<VersionSource>,
) -> Result<(VersionSource, Vec<VersionSource>)> {
    let mut candidates = candidates.into_iter();
    let selected = candidates
        .next()
        .ok_or_else(|| AutoVersionError::exhausted("no tag or commit candidates found"))?;
    Ok((selected, candidates.collect()))
}

/// Resolves the version of one project from the state of a repository
pub struct VersionResolver<'a, R: Repository> {
    repo: &'a R,
    project: ProjectContext,
    rules: BranchRuleSet,
    tag_pattern: String,
    dirty_qualifier: String,
}

impl<'a, R: Repository> VersionResolver<'a, R> {
    /// Create a resolver using the branch rules, tag pattern and dirty
    /// qualifier from `config`
    pub fn new(repo: &'a R, project: ProjectContext, config: &Config) -> Self {
        VersionResolver {
            repo,
            project,
            rules: config.branch_rules(),
            tag_pattern: config.tag_pattern.clone(),
            dirty_qualifier: config.dirty_qualifier.clone(),
        }
    }

    /// Candidate sources, in order of preference:
    /// 1. tags under the project's tag scope, most recent first
    /// 2. tags matching the generic pattern, most recent first
    /// 3. the short id of the last commit touching the project path
    pub fn candidate_versions(&self) -> Result<Vec<VersionSource>> {
        let mut candidates = Vec::new();

        if let Some(scope) = self.project.tag_scope() {
            candidates.extend(self.tag_sources(&format!("{}/*", scope))?);
        }
        candidates.extend(self.tag_sources(&self.tag_pattern)?);

        let commit_id = self.repo.commit_id(true, self.project.path())?;
        let project_path = self.project.display_path();
        candidates.push(VersionSource::Commit(CommitSource::new(
            commit_id,
            Explanation::new(move || format!("Commit ID on project @ {}", project_path)),
        )));

        debug!(count = candidates.len(), "collected version candidates");
        Ok(candidates)
    }

    fn tag_sources(&self, pattern: &str) -> Result<Vec<VersionSource>> {
        let refs = format!("refs/tags/{}", pattern);
        let explanation = Explanation::new(move || format!("git tags for {}", refs));

        Ok(self
            .repo
            .tags(pattern)?
            .into_iter()
            .map(|record| VersionSource::Tag(GitTag::new(record, explanation.clone())))
            .collect())
    }

    /// Whether versions built on `branch` are auto-incremented
    pub fn is_auto_increment_branch(&self, branch: &str) -> bool {
        self.rules.is_eligible(branch)
    }

    /// Amendments for `source` given the current repository state.
    ///
    /// The commit count increment comes first so a dirty qualifier is never
    /// followed by another change.
    pub fn amendments(&self, source: &VersionSource) -> Result<Vec<Amendment>> {
        let branch = self.repo.branch_name()?;
        self.amendments_on(source, &branch)
    }

    fn amendments_on(&self, source: &VersionSource, branch: &str) -> Result<Vec<Amendment>> {
        let mut amendments = Vec::with_capacity(2);
        let path = self.project.path();

        let eligible = self.is_auto_increment_branch(branch);
        debug!(branch, eligible, "checked auto-increment branch rules");

        let incrementable = source.source_type() == SourceType::Tag
            && source.version().is_incrementable();
        if eligible && incrementable {
            let commits = self.repo.commit_count(source.value(), path)?;
            if commits > 0 {
                amendments.push(Amendment::increment(
                    format!(
                        "Increment version, found {} commits in path {}, \
                         on an incrementable branch '{}'",
                        commits,
                        self.project.display_path(),
                        branch
                    ),
                    commits,
                ));
            }
        }

        if self.repo.is_dirty(path)? {
            amendments.push(Amendment::qualify(
                format!(
                    "Add '{}' qualifier, as repository is dirty",
                    self.dirty_qualifier
                ),
                self.dirty_qualifier.clone(),
            ));
        }

        Ok(amendments)
    }

    /// Select a source and apply its amendments
    pub fn resolve(&self) -> Result<Resolution> {
        let (source, alternatives) = select_source(self.candidate_versions()?)?;
        debug!(source = %source, "selected version source");

        let branch = self.repo.branch_name()?;
        let amendments = self.amendments_on(&source, &branch)?;
        for amendment in &amendments {
            debug!(amendment = amendment.description(), "applying amendment");
        }
        let version = apply_all(source.version(), &amendments)?;

        let branch_rules = self
            .rules
            .rules()
            .iter()
            .map(|rule| (rule.description().to_string(), rule.matches(&branch)))
            .collect();

        Ok(Resolution {
            version,
            source,
            alternatives,
            amendments: amendments
                .iter()
                .map(|a| a.description().to_string())
                .collect(),
            branch,
            branch_rules,
        })
    }

    /// The resolved version as a string
    pub fn git_version(&self) -> Result<String> {
        Ok(self.resolve()?.version.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BranchPatterns;
    use crate::domain::TagRecord;
    use crate::git::{Change, MockRepository};

    fn resolver(
        repo: &MockRepository,
        project: ProjectContext,
    ) -> VersionResolver<'_, MockRepository> {
        VersionResolver::new(repo, project, &Config::default())
    }

    #[test]
    fn test_project_context_blank_values() {
        let project = ProjectContext::new(Some("  "), Some(""));
        assert_eq!(project, ProjectContext::root());
        assert_eq!(ProjectContext::at_path("child1/").path(), Some("child1"));
    }

    #[test]
    fn test_candidate_order() {
        let mut repo = MockRepository::new();
        repo.add_tag(TagRecord::named("child1/v2.0.0-CHILD1"));
        repo.add_tag(TagRecord::named("v1.1.0"));
        repo.add_tag(TagRecord::named("v1.0.0"));
        repo.set_path_id("child1", "abc1234");

        let candidates = resolver(&repo, ProjectContext::at_path("child1"))
            .candidate_versions()
            .unwrap();
        let values: Vec<&str> = candidates.iter().map(|c| c.value()).collect();
        assert_eq!(
            values,
            vec!["child1/v2.0.0-CHILD1", "v1.1.0", "v1.0.0", "abc1234"]
        );
        assert_eq!(candidates[3].source_type(), SourceType::Commit);
        assert_eq!(
            candidates[0].explanation().describe(),
            "git tags for refs/tags/child1/*"
        );
        assert_eq!(
            candidates[3].explanation().describe(),
            "Commit ID on project @ child1"
        );
    }

    #[test]
    fn test_root_project_ignores_scoped_tags() {
        let mut repo = MockRepository::new();
        repo.add_tag(TagRecord::named("child1/v2.0.0"));
        repo.set_head_id("abc1234");

        let candidates = resolver(&repo, ProjectContext::root())
            .candidate_versions()
            .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].value(), "abc1234");
    }

    #[test]
    fn test_select_source_empty_is_exhausted() {
        let err = select_source(Vec::new()).unwrap_err();
        assert!(matches!(err, AutoVersionError::ResolutionExhausted(_)));
    }

    #[test]
    fn test_no_increment_on_excluded_branch() {
        let mut repo = MockRepository::new();
        repo.add_tag(TagRecord::named("v1.0.0"));
        repo.set_branch("master");
        repo.set_commit_count("v1.0.0", None, 3);

        let resolver = resolver(&repo, ProjectContext::root());
        let source = resolver.candidate_versions().unwrap().remove(0);
        assert!(resolver.amendments(&source).unwrap().is_empty());
        assert_eq!(repo.commit_count_calls(), 0);
    }

    #[test]
    fn test_increment_then_dirty() {
        let mut repo = MockRepository::new();
        repo.add_tag(TagRecord::named("v1.0.0"));
        repo.set_branch("feature/x");
        repo.set_commit_count("v1.0.0", None, 3);
        repo.add_change(Change::new('M', "README.md"));

        let resolver = resolver(&repo, ProjectContext::root());
        let source = resolver.candidate_versions().unwrap().remove(0);
        let amendments = resolver.amendments(&source).unwrap();
        assert_eq!(amendments.len(), 2);
        assert!(amendments[0].description().starts_with("Increment version, found 3 commits"));
        assert!(amendments[0].description().contains("'feature/x'"));
        assert_eq!(
            amendments[1].description(),
            "Add 'dirty' qualifier, as repository is dirty"
        );
        assert_eq!(resolver.git_version().unwrap(), "1.0.3-dirty");
    }

    #[test]
    fn test_zero_commits_no_increment() {
        let mut repo = MockRepository::new();
        repo.add_tag(TagRecord::named("v1.0.0"));
        repo.set_branch("develop");

        let resolver = resolver(&repo, ProjectContext::root());
        let source = resolver.candidate_versions().unwrap().remove(0);
        assert!(resolver.amendments(&source).unwrap().is_empty());
        assert_eq!(repo.commit_count_calls(), 1);
    }

    #[test]
    fn test_unincrementable_tag_not_counted() {
        let mut repo = MockRepository::new();
        repo.add_tag(TagRecord::named("vnext"));
        repo.set_branch("develop");
        repo.set_commit_count("vnext", None, 4);

        let resolver = resolver(&repo, ProjectContext::root());
        assert_eq!(resolver.git_version().unwrap(), "vnext");
        assert_eq!(repo.commit_count_calls(), 0);
    }

    #[test]
    fn test_commit_source_never_incremented() {
        let mut repo = MockRepository::new();
        repo.set_head_id("1234567");
        repo.set_branch("develop");

        let resolver = resolver(&repo, ProjectContext::root());
        assert_eq!(resolver.git_version().unwrap(), "1234567");
        assert_eq!(repo.commit_count_calls(), 0);
    }

    #[test]
    fn test_configured_rules_and_qualifier() {
        let mut repo = MockRepository::new();
        repo.add_tag(TagRecord::named("v3.2"));
        repo.set_branch("main");
        repo.set_commit_count("v3.2", None, 1);
        repo.add_change(Change::new('?', "new.txt"));

        let config = Config {
            dirty_qualifier: "SNAPSHOT".to_string(),
            auto_increment: Some(BranchPatterns {
                includes: vec!["main".to_string()],
                excludes: vec![],
            }),
            ..Config::default()
        };
        let resolver = VersionResolver::new(&repo, ProjectContext::root(), &config);
        assert!(resolver.is_auto_increment_branch("main"));
        assert!(!resolver.is_auto_increment_branch("develop"));
        assert_eq!(resolver.git_version().unwrap(), "3.2.1-SNAPSHOT");
    }

    #[test]
    fn test_resolution_records_alternatives() {
        let mut repo = MockRepository::new();
        repo.add_tag(TagRecord::named("v1.1.0"));
        repo.add_tag(TagRecord::named("v1.0.0"));
        repo.set_head_id("abc1234");

        let resolution = resolver(&repo, ProjectContext::root()).resolve().unwrap();
        assert_eq!(resolution.source.value(), "v1.1.0");
        assert_eq!(resolution.alternatives.len(), 2);
        assert!(resolution.amendments.is_empty());
        assert_eq!(resolution.to_string(), "1.1.0");
        assert_eq!(resolution.branch, "main");
        assert_eq!(
            resolution.branch_rules,
            vec![("Branch is not 'main' or 'master'".to_string(), false)]
        );
        assert!(!resolution.is_auto_increment_branch());
    }

    #[test]
    fn test_resolution_reports_each_rule() {
        let mut repo = MockRepository::new();
        repo.set_branch("feature/x");

        let config = Config {
            auto_increment: Some(BranchPatterns {
                includes: vec!["develop".to_string()],
                excludes: vec!["main".to_string()],
            }),
            ..Config::default()
        };
        let resolution = VersionResolver::new(&repo, ProjectContext::root(), &config)
            .resolve()
            .unwrap();
        assert_eq!(
            resolution.branch_rules,
            vec![
                ("Includes: [develop]".to_string(), false),
                ("Excludes: [main]".to_string(), true),
            ]
        );
        assert!(!resolution.is_auto_increment_branch());
    }
}
