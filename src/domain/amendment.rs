use crate::domain::version::Version;
use crate::error::Result;
use std::fmt;

/// A change to the resolved version reflecting the state of the repository
pub struct Amendment {
    description: String,
    amender: Box<dyn Fn(&Version) -> Result<Version>>,
}

impl Amendment {
    pub fn new(
        description: impl Into<String>,
        amender: impl Fn(&Version) -> Result<Version> + 'static,
    ) -> Self {
        Amendment {
            description: description.into(),
            amender: Box::new(amender),
        }
    }

    /// Bump the incremental component by `commits`
    pub fn increment(description: impl Into<String>, commits: u32) -> Self {
        Amendment::new(description, move |version| version.increment(commits))
    }

    /// Replace the qualifier with `qualifier`
    pub fn qualify(description: impl Into<String>, qualifier: impl Into<String>) -> Self {
        let qualifier = qualifier.into();
        Amendment::new(description, move |version| {
            Ok(version.with_qualifier(Some(&qualifier)))
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amended(&self, version: &Version) -> Result<Version> {
        (self.amender)(version)
    }
}

impl fmt::Debug for Amendment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Amendment")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Apply each amendment in order, starting from `version`
pub fn apply_all(version: Version, amendments: &[Amendment]) -> Result<Version> {
    amendments
        .iter()
        .try_fold(version, |current, amendment| amendment.amended(&current))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_amendment() {
        let amendment = Amendment::increment("bump", 3);
        let amended = amendment.amended(&Version::parse("1.0.0")).unwrap();
        assert_eq!(amended.to_string(), "1.0.3");
        assert_eq!(amendment.description(), "bump");
    }

    #[test]
    fn test_qualify_amendment() {
        let amendment = Amendment::qualify("dirty", "dirty");
        let amended = amendment.amended(&Version::parse("2.0.0-CHILD1")).unwrap();
        assert_eq!(amended.to_string(), "2.0.0-dirty");
    }

    #[test]
    fn test_apply_in_order() {
        let amendments = vec![
            Amendment::increment("bump", 2),
            Amendment::qualify("dirty", "dirty"),
        ];
        let version = apply_all(Version::parse("1.4"), &amendments).unwrap();
        assert_eq!(version.to_string(), "1.4.2-dirty");
    }

    #[test]
    fn test_apply_none_is_identity() {
        let version = apply_all(Version::parse("abc1234"), &[]).unwrap();
        assert_eq!(version.to_string(), "abc1234");
    }

    #[test]
    fn test_failed_amendment_aborts() {
        let amendments = vec![Amendment::increment("bump", 1)];
        assert!(apply_all(Version::parse("abc1234"), &amendments).is_err());
    }
}
