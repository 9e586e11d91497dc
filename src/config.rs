//! Pipeline options and their TOML configuration file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading options.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Which stages of the pipeline run, and how.
///
/// Every field is optional in a configuration file; missing ones keep
/// their default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Strip `[[File:...]]` anchors and resolve `[[link|text]]` anchors
    pub clean_references: bool,
    /// Only split on `==Heading==`, leaving deeper headings in the body
    pub main_sections_only: bool,
    /// Run the citation extractor
    pub extract_references: bool,
    /// Treat `<ref>http://...</ref>` as a bare link instead of a template
    pub extract_broken_references: bool,
    /// Build the section tree
    pub split_sections: bool,
    /// Build the citing-statement index
    pub extract_statements: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            clean_references: false,
            main_sections_only: true,
            extract_references: true,
            extract_broken_references: true,
            split_sections: true,
            extract_statements: false,
        }
    }
}

impl Options {
    /// Parses options from TOML text.
    ///
    /// # Examples
    ///
    /// ```
    /// use wikicite::Options;
    ///
    /// let options = Options::from_toml_str("main_sections_only = false").unwrap();
    /// assert!(!options.main_sections_only);
    /// assert!(options.extract_references);
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

/// Loads options from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid TOML for
/// [`Options`].
pub fn load_options(path: &Path) -> Result<Options, ConfigError> {
    let content = fs::read_to_string(path)?;
    Options::from_toml_str(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_is_default() {
        let options = Options::from_toml_str("").unwrap();
        assert_eq!(options, Options::default());
    }

    #[test]
    fn test_load_options_from_file() {
        // Given: A config file overriding two flags
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "clean_references = true\nextract_statements = true").unwrap();

        // When: We load it
        let options = load_options(file.path()).unwrap();

        // Then: Those flags change, the rest keep their defaults
        assert!(options.clean_references);
        assert!(options.extract_statements);
        assert!(options.main_sections_only);
        assert!(options.extract_broken_references);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = Options::from_toml_str("split_section = false");
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_wrong_type_rejected() {
        let result = Options::from_toml_str("split_sections = \"yes\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = load_options(Path::new("/nonexistent/wikicite.toml"));
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }
}
