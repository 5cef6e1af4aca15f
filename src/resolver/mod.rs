//! Resolution engine turning repository state into a version string

pub mod version_resolver;

pub use version_resolver::{select_source, ProjectContext, Resolution, VersionResolver};
