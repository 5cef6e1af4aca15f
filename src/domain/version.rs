use crate::error::{AutoVersionError, Result};
use regex::Regex;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Grammar of a structured version:
/// `major[.minor[.incremental]][-qualifier]`
const STRUCTURED_PATTERN: &str = concat!(
    r"^(?P<major>\d+)(?:\.(?P<minor>\d+))?(?:\.(?P<incremental>\d+))?",
    r"(?:-(?P<qualifier>[A-Za-z0-9.-]+))?$"
);

/// Separator between the core of a text version and its qualifier
pub const QUALIFIER_SEPARATOR: char = '-';

/// A version derived from a tag or commit.
///
/// Anything matching the structured grammar becomes [`Version::Structured`],
/// everything else is kept verbatim as [`Version::Text`]. Parsing never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Version {
    Structured(StructuredVersion),
    Text(TextVersion),
}

/// `major[.minor[.incremental]][-qualifier]` with components that were never
/// defined left as `None`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredVersion {
    pub major: u32,
    pub minor: Option<u32>,
    pub incremental: Option<u32>,
    pub qualifier: Option<String>,
}

/// An opaque version string. The qualifier is everything after the last `-`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextVersion {
    value: String,
}

impl Version {
    /// Parse a version string, degrading to [`Version::Text`] when the whole
    /// input does not match the structured grammar
    pub fn parse(input: &str) -> Self {
        match StructuredVersion::parse(input) {
            Some(structured) => Version::Structured(structured),
            None => Version::Text(TextVersion::new(input)),
        }
    }

    /// Whether this version has numeric components that can be incremented
    pub fn is_incrementable(&self) -> bool {
        matches!(self, Version::Structured(_))
    }

    /// Add `amount` to the incremental component
    ///
    /// # Errors
    /// `UnsupportedOperation` for text versions, or if the incremental
    /// component would overflow.
    pub fn increment(&self, amount: u32) -> Result<Self> {
        match self {
            Version::Structured(v) => v.increment(amount).map(Version::Structured),
            Version::Text(v) => Err(AutoVersionError::unsupported(format!(
                "text version '{}' cannot be incremented",
                v.value
            ))),
        }
    }

    /// Replace the qualifier. `None` (or an empty qualifier) removes it.
    pub fn with_qualifier(&self, qualifier: Option<&str>) -> Self {
        match self {
            Version::Structured(v) => Version::Structured(v.with_qualifier(qualifier)),
            Version::Text(v) => Version::Text(v.with_qualifier(qualifier)),
        }
    }

    /// The qualifier segment, or an empty string
    pub fn qualifier(&self) -> &str {
        match self {
            Version::Structured(v) => v.qualifier.as_deref().unwrap_or(""),
            Version::Text(v) => v.qualifier(),
        }
    }
}

impl FromStr for Version {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Version::parse(s))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Structured(v) => fmt::Display::fmt(v, f),
            Version::Text(v) => fmt::Display::fmt(v, f),
        }
    }
}

impl StructuredVersion {
    /// Create a structured version
    pub fn new(
        major: u32,
        minor: Option<u32>,
        incremental: Option<u32>,
        qualifier: Option<&str>,
    ) -> Self {
        StructuredVersion {
            major,
            minor,
            incremental,
            qualifier: qualifier.map(str::to_string),
        }
    }

    /// Match the whole input against the structured grammar.
    ///
    /// Returns `None` for partial matches and for numbers that do not fit a `u32`.
    pub fn parse(input: &str) -> Option<Self> {
        let captures = Regex::new(STRUCTURED_PATTERN)
            .ok()
            .and_then(|re| re.captures(input))?;

        let number = |name: &str| -> Option<Option<u32>> {
            match captures.name(name) {
                Some(m) => m.as_str().parse::<u32>().ok().map(Some),
                None => Some(None),
            }
        };

        let major = number("major")??;
        let minor = number("minor")?;
        let incremental = number("incremental")?;
        let qualifier = captures.name("qualifier").map(|m| m.as_str().to_string());

        Some(StructuredVersion {
            major,
            minor,
            incremental,
            qualifier,
        })
    }

    /// Add `amount` to the incremental slot, materializing minor as 0 and
    /// incremental as `amount` when they are absent. Never touches major,
    /// minor or the qualifier.
    pub fn increment(&self, amount: u32) -> Result<Self> {
        let incremental = match self.incremental {
            Some(current) => current.checked_add(amount).ok_or_else(|| {
                AutoVersionError::unsupported(format!(
                    "incrementing '{}' by {} overflows",
                    self, amount
                ))
            })?,
            None => amount,
        };

        Ok(StructuredVersion {
            major: self.major,
            minor: Some(self.minor.unwrap_or(0)),
            incremental: Some(incremental),
            qualifier: self.qualifier.clone(),
        })
    }

    /// Copy of this version with the qualifier replaced
    pub fn with_qualifier(&self, qualifier: Option<&str>) -> Self {
        StructuredVersion {
            qualifier: qualifier.filter(|q| !q.is_empty()).map(str::to_string),
            ..self.clone()
        }
    }
}

impl fmt::Display for StructuredVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.major)?;
        if let Some(minor) = self.minor {
            write!(f, ".{}", minor)?;
            if let Some(incremental) = self.incremental {
                write!(f, ".{}", incremental)?;
            }
        }
        if let Some(qualifier) = &self.qualifier {
            write!(f, "{}{}", QUALIFIER_SEPARATOR, qualifier)?;
        }
        Ok(())
    }
}

impl TextVersion {
    pub fn new(value: impl Into<String>) -> Self {
        TextVersion {
            value: value.into(),
        }
    }

    /// Everything after the last `-`, or an empty string
    pub fn qualifier(&self) -> &str {
        match self.value.rfind(QUALIFIER_SEPARATOR) {
            Some(i) => &self.value[i + 1..],
            None => "",
        }
    }

    /// Replace everything after the last `-`, appending `-qualifier` when the
    /// value has no separator yet
    pub fn with_qualifier(&self, qualifier: Option<&str>) -> Self {
        let core = match self.value.rfind(QUALIFIER_SEPARATOR) {
            Some(i) => &self.value[..i],
            None => self.value.as_str(),
        };

        match qualifier.filter(|q| !q.is_empty()) {
            Some(q) => TextVersion::new(format!("{}{}{}", core, QUALIFIER_SEPARATOR, q)),
            None => TextVersion::new(core),
        }
    }
}

impl fmt::Display for TextVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}
