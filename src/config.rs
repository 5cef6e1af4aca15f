use crate::domain::branch::DEFAULT_EXCLUDED_BRANCHES;
use crate::domain::BranchRuleSet;
use crate::error::{AutoVersionError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the current directory
pub const CONFIG_FILE_NAME: &str = "gitversion.toml";

/// Represents the complete configuration for git-autoversion.
///
/// Contains the generic tag pattern, the dirty qualifier and the branch
/// patterns that control auto-incrementing.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_tag_pattern")]
    pub tag_pattern: String,

    #[serde(default = "default_dirty_qualifier")]
    pub dirty_qualifier: String,

    /// When absent, only `main` and `master` are excluded
    #[serde(default)]
    pub auto_increment: Option<BranchPatterns>,
}

/// Returns the glob for unscoped version tags.
fn default_tag_pattern() -> String {
    "v*".to_string()
}

/// Returns the qualifier appended when the working copy has changes.
fn default_dirty_qualifier() -> String {
    "dirty".to_string()
}

/// Returns the branch names excluded from auto-incrementing by default.
fn default_excludes() -> Vec<String> {
    DEFAULT_EXCLUDED_BRANCHES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Branch names that are (or are not) auto-incremented.
///
/// An empty `includes` list includes every branch; an empty `excludes` list
/// excludes none.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BranchPatterns {
    #[serde(default)]
    pub includes: Vec<String>,

    #[serde(default = "default_excludes")]
    pub excludes: Vec<String>,
}

impl Default for BranchPatterns {
    fn default() -> Self {
        BranchPatterns {
            includes: Vec::new(),
            excludes: default_excludes(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            tag_pattern: default_tag_pattern(),
            dirty_qualifier: default_dirty_qualifier(),
            auto_increment: None,
        }
    }
}

impl Config {
    /// Build the branch rules described by this configuration
    pub fn branch_rules(&self) -> BranchRuleSet {
        match &self.auto_increment {
            Some(patterns) => BranchRuleSet::from_patterns(patterns),
            None => BranchRuleSet::default(),
        }
    }

    /// Parse and validate a configuration document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| AutoVersionError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.tag_pattern.trim().is_empty() {
            return Err(AutoVersionError::config("tag_pattern must not be blank"));
        }
        if self.dirty_qualifier.trim().is_empty() {
            return Err(AutoVersionError::config("dirty_qualifier must not be blank"));
        }
        Ok(())
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `gitversion.toml` in current directory
/// 3. `.gitversion.toml` in user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let path = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config(),
    };

    let Some(path) = path else {
        tracing::debug!("no configuration file found, using defaults");
        return Ok(Config::default());
    };

    let content = fs::read_to_string(&path).map_err(|e| {
        AutoVersionError::config(format!("cannot read '{}': {}", path.display(), e))
    })?;
    let config = Config::from_toml(&content).map_err(|e| match e {
        AutoVersionError::Config(reason) => {
            AutoVersionError::config(format!("cannot load '{}': {}", path.display(), reason))
        }
        other => other,
    })?;

    tracing::debug!(path = %path.display(), "loaded configuration");
    Ok(config)
}

fn discover_config() -> Option<PathBuf> {
    let local = Path::new(".").join(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join(format!(".{}", CONFIG_FILE_NAME)))
        .filter(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.tag_pattern, "v*");
        assert_eq!(config.dirty_qualifier, "dirty");
        assert!(config.auto_increment.is_none());
    }

    #[test]
    fn test_default_branch_rules() {
        let rules = Config::default().branch_rules();
        assert!(!rules.is_eligible("main"));
        assert!(!rules.is_eligible("master"));
        assert!(rules.is_eligible("develop"));
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_omitted_excludes_default_to_main_and_master() {
        let config = Config::from_toml("[auto_increment]\nincludes = []\n").unwrap();
        let patterns = config.auto_increment.clone().unwrap();
        assert_eq!(patterns.excludes, vec!["main", "master"]);
        assert!(!config.branch_rules().is_eligible("main"));
    }

    #[test]
    fn test_explicit_empty_excludes() {
        let config = Config::from_toml("[auto_increment]\nexcludes = []\n").unwrap();
        assert!(config.branch_rules().is_eligible("main"));
    }

    #[test]
    fn test_blank_dirty_qualifier_rejected() {
        let err = Config::from_toml("dirty_qualifier = \"\"\n").unwrap_err();
        assert!(matches!(err, AutoVersionError::Config(_)));
        assert!(err.to_string().contains("dirty_qualifier"));

        assert!(Config::from_toml("dirty_qualifier = \"  \"\n").is_err());
    }

    #[test]
    fn test_blank_tag_pattern_rejected() {
        let err = Config::from_toml("tag_pattern = \"\"\n").unwrap_err();
        assert!(err.to_string().contains("tag_pattern"));
    }

    #[test]
    fn test_invalid_document() {
        let err = Config::from_toml("dirty_qualifier = [").unwrap_err();
        assert!(matches!(err, AutoVersionError::Config(_)));
    }
}
