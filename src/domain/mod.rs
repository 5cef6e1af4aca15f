//! Domain logic - pure version rules independent of git operations

pub mod amendment;
pub mod branch;
pub mod source;
pub mod version;

pub use amendment::Amendment;
pub use branch::{BranchRule, BranchRuleSet};
pub use source::{CommitSource, Explanation, GitTag, SourceType, TagRecord, VersionSource};
pub use version::{StructuredVersion, TextVersion, Version};
