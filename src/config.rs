use std::path::Path;

use crate::error::Error;

/// File name of the tool settings, looked up in the working directory.
pub const CONFIG_FILE: &str = ".discref.toml";

/// Tool settings loaded from `.discref.toml`.
/// Controls which authoring program is run and where the document is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Authoring program, looked up on `PATH` unless it contains a separator.
    pub program: String,
    /// File name of the rendered document inside the output directory.
    pub document: String,
}

/// Raw TOML structure for `.discref.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct DiscrefTomlConfig {
    /// Overrides [`Config::program`].
    program: Option<String>,
    /// Overrides [`Config::document`].
    document: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        return Self {
            program: "dvdauthor".to_string(),
            document: "dvdauthor.xml".to_string(),
        };
    }
}

impl Config {
    /// Load config from `.discref.toml` in the given root directory.
    /// Returns the defaults if the file doesn't exist. A file that exists but
    /// is malformed is an error, never a silent fallback.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        return Self::parse(&content);
    }

    /// Parse config from TOML content, filling unset keys with defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the TOML is malformed or has unknown keys.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let raw: DiscrefTomlConfig = toml::from_str(content)?;
        let defaults = Self::default();
        return Ok(Self {
            program: raw.program.unwrap_or(defaults.program),
            document: raw.document.unwrap_or(defaults.document),
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests")]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.program, "dvdauthor");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = Config::parse("program = \"/opt/bin/dvdauthor\"\n").unwrap();
        assert_eq!(config.program, "/opt/bin/dvdauthor");
        assert_eq!(config.document, "dvdauthor.xml");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "program = [").unwrap();
        assert!(matches!(Config::load(dir.path()), Err(Error::TomlDe(_))));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::parse("programme = \"x\"").is_err());
    }
}
