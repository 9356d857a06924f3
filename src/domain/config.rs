use std::path::Path;

use serde::{Deserialize, Serialize};

/// Configuration for a model.
///
/// Controls how requirement identifiers are generated and rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Versions", into = "Versions")]
pub struct Config {
    /// Alphabetic prefix of generated requirement identifiers.
    ///
    /// For example 'ID' in 'ID007'.
    identifier_prefix: String,

    /// The number of digits in a generated requirement identifier.
    ///
    /// Digits are padded to this width with leading zeros.
    /// For example, '007' (3 digits) or '0007' (4 digits).
    identifier_digits: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            identifier_prefix: default_prefix(),
            identifier_digits: default_digits(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the prefix of generated requirement identifiers.
    #[must_use]
    pub fn identifier_prefix(&self) -> &str {
        &self.identifier_prefix
    }

    /// Returns the number of digits generated identifiers are padded to.
    #[must_use]
    pub const fn identifier_digits(&self) -> usize {
        self.identifier_digits
    }

    /// Sets the identifier prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix is empty or contains anything other
    /// than ASCII letters.
    pub fn set_identifier_prefix(&mut self, prefix: String) -> Result<(), String> {
        validate_prefix(&prefix)?;
        self.identifier_prefix = prefix;
        Ok(())
    }

    /// Sets the number of digits generated identifiers are padded to.
    pub const fn set_identifier_digits(&mut self, digits: usize) {
        self.identifier_digits = digits;
    }
}

fn default_prefix() -> String {
    "ID".to_string()
}

const fn default_digits() -> usize {
    3
}

fn validate_prefix(prefix: &str) -> Result<(), String> {
    if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(format!(
            "Invalid identifier prefix '{prefix}': must be non-empty and contain only ASCII letters"
        ));
    }
    Ok(())
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_prefix")]
        identifier_prefix: String,

        #[serde(default = "default_digits")]
        identifier_digits: usize,
    },
}

impl TryFrom<Versions> for Config {
    type Error = String;

    fn try_from(versions: Versions) -> Result<Self, Self::Error> {
        match versions {
            Versions::V1 {
                identifier_prefix,
                identifier_digits,
            } => {
                validate_prefix(&identifier_prefix)?;
                Ok(Self {
                    identifier_prefix,
                    identifier_digits,
                })
            }
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            identifier_prefix: config.identifier_prefix,
            identifier_digits: config.identifier_digits,
        }
    }
}
