use crate::config::BranchPatterns;
use std::fmt;

/// Branches that never get auto-incremented versions unless configured otherwise
pub const DEFAULT_EXCLUDED_BRANCHES: [&str; 2] = ["main", "master"];

/// A named predicate over branch names
pub struct BranchRule {
    description: String,
    predicate: Box<dyn Fn(&str) -> bool>,
}

impl BranchRule {
    pub fn new(description: impl Into<String>, predicate: impl Fn(&str) -> bool + 'static) -> Self {
        BranchRule {
            description: description.into(),
            predicate: Box::new(predicate),
        }
    }

    /// Matches branches in `includes`, or every branch if `includes` is empty
    pub fn includes(includes: &[String]) -> Self {
        if includes.is_empty() {
            return BranchRule::new("No includes specified, default include all", |_| true);
        }
        let names = includes.to_vec();
        BranchRule::new(format!("Includes: [{}]", includes.join(",")), move |branch| {
            names.iter().any(|name| name == branch)
        })
    }

    /// Matches branches not in `excludes`, or every branch if `excludes` is empty
    pub fn excludes(excludes: &[String]) -> Self {
        if excludes.is_empty() {
            return BranchRule::new("No excludes specified, default exclude none", |_| true);
        }
        let names = excludes.to_vec();
        BranchRule::new(format!("Excludes: [{}]", excludes.join(",")), move |branch| {
            !names.iter().any(|name| name == branch)
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn matches(&self, branch: &str) -> bool {
        (self.predicate)(branch)
    }
}

impl fmt::Debug for BranchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BranchRule")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Ordered rules deciding whether a branch gets auto-incremented versions.
/// A branch is eligible only when every rule matches.
#[derive(Debug)]
pub struct BranchRuleSet {
    rules: Vec<BranchRule>,
}

impl BranchRuleSet {
    pub fn new(rules: Vec<BranchRule>) -> Self {
        BranchRuleSet { rules }
    }

    /// Include rule followed by exclude rule
    pub fn from_patterns(patterns: &BranchPatterns) -> Self {
        BranchRuleSet::new(vec![
            BranchRule::includes(&patterns.includes),
            BranchRule::excludes(&patterns.excludes),
        ])
    }

    pub fn is_eligible(&self, branch: &str) -> bool {
        self.rules.iter().all(|rule| rule.matches(branch))
    }

    pub fn rules(&self) -> &[BranchRule] {
        &self.rules
    }
}

impl Default for BranchRuleSet {
    fn default() -> Self {
        BranchRuleSet::new(vec![BranchRule::new(
            "Branch is not 'main' or 'master'",
            |branch| !DEFAULT_EXCLUDED_BRANCHES.iter().any(|name| *name == branch),
        )])
    }
}
