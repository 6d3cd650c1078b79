// Configuration loading and parsing (raffle.toml).

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::participant::{IdentityRules, DEFAULT_MISSING_IDENTIFIER_MARKER};

/// File name looked up in the platform config directory.
pub const CONFIG_FILE_NAME: &str = "raffle.toml";

/// Upper bound for `parser.min_identifier_digits`. Identifiers longer than
/// this are still captured; the bound only limits the required prefix.
pub const MAX_IDENTIFIER_DIGITS: usize = 16;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// raffle.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RaffleConfig {
    pub parser: ParserConfig,
    pub draw: DrawConfig,
    pub identity: IdentityConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Shortest trailing digit run accepted as an identifier. Shorter
    /// numbers stay part of the name.
    pub min_identifier_digits: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            min_identifier_digits: crate::parser::MIN_IDENTIFIER_DIGITS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DrawConfig {
    /// Most winners a single round may request.
    pub max_winners: usize,
    /// Winner count preselected when a list is loaded.
    pub default_winners: usize,
}

impl Default for DrawConfig {
    fn default() -> Self {
        DrawConfig {
            max_winners: 50,
            default_winners: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Identifier values treated as "no identifier".
    pub missing_identifier_markers: Vec<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        IdentityConfig {
            missing_identifier_markers: vec![DEFAULT_MISSING_IDENTIFIER_MARKER.to_string()],
        }
    }
}

impl IdentityConfig {
    pub fn rules(&self) -> IdentityRules {
        IdentityRules::new(&self.missing_identifier_markers)
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

impl RaffleConfig {
    /// Parse and validate an inline TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: RaffleConfig = toml::from_str(text).map_err(|e| ConfigError::ParseError {
            path: PathBuf::from("<inline>"),
            source: e,
        })?;
        validate(&config)?;
        Ok(config)
    }
}

/// Load and validate the configuration file at `path`.
pub fn load_config_from(path: &Path) -> Result<RaffleConfig, ConfigError> {
    let text = read_file(path)?;
    let config: RaffleConfig = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    validate(&config)?;

    debug!("Loaded raffle config from {}", path.display());
    Ok(config)
}

/// Platform-specific location of `raffle.toml`, if a home directory exists.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "sorteo")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Load `raffle.toml` from the platform config directory. A missing file is
/// not an error: the built-in defaults are returned instead.
pub fn load_config() -> Result<RaffleConfig, ConfigError> {
    match default_config_path() {
        Some(path) if path.exists() => load_config_from(&path),
        Some(path) => {
            info!("No raffle config at {}, using defaults", path.display());
            Ok(RaffleConfig::default())
        }
        None => {
            info!("No config directory available, using defaults");
            Ok(RaffleConfig::default())
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &RaffleConfig) -> Result<(), ConfigError> {
    let digits = config.parser.min_identifier_digits;
    if !(1..=MAX_IDENTIFIER_DIGITS).contains(&digits) {
        return Err(ConfigError::ValidationError {
            field: "parser.min_identifier_digits".into(),
            message: format!("must be between 1 and {MAX_IDENTIFIER_DIGITS}, got {digits}"),
        });
    }

    if config.draw.max_winners == 0 {
        return Err(ConfigError::ValidationError {
            field: "draw.max_winners".into(),
            message: "must be greater than 0".into(),
        });
    }

    let default_winners = config.draw.default_winners;
    if default_winners == 0 || default_winners > config.draw.max_winners {
        return Err(ConfigError::ValidationError {
            field: "draw.default_winners".into(),
            message: format!(
                "must be between 1 and draw.max_winners ({}), got {default_winners}",
                config.draw.max_winners
            ),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Path to the checked-in default config of this crate.
    fn defaults_file() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("defaults").join(CONFIG_FILE_NAME)
    }

    #[test]
    fn defaults_file_matches_builtin_defaults() {
        let config = load_config_from(&defaults_file()).expect("defaults should load");
        assert_eq!(config, RaffleConfig::default());
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = RaffleConfig::from_toml_str("").unwrap();
        assert_eq!(config.parser.min_identifier_digits, 3);
        assert_eq!(config.draw.max_winners, 50);
        assert_eq!(config.draw.default_winners, 1);
        assert_eq!(config.identity.missing_identifier_markers, vec!["S/D"]);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = RaffleConfig::from_toml_str("[draw]\nmax_winners = 5\n").unwrap();
        assert_eq!(config.draw.max_winners, 5);
        assert_eq!(config.draw.default_winners, 1);
        assert_eq!(config.parser, ParserConfig::default());
    }

    #[test]
    fn rejects_zero_identifier_digits() {
        let err = RaffleConfig::from_toml_str("[parser]\nmin_identifier_digits = 0\n").unwrap_err();
        match &err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, "parser.min_identifier_digits");
            }
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn rejects_oversized_identifier_digits() {
        let err =
            RaffleConfig::from_toml_str("[parser]\nmin_identifier_digits = 40\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn rejects_zero_max_winners() {
        let err = RaffleConfig::from_toml_str("[draw]\nmax_winners = 0\n").unwrap_err();
        match &err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "draw.max_winners"),
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn rejects_default_winners_above_max() {
        let toml = "[draw]\nmax_winners = 3\ndefault_winners = 4\n";
        let err = RaffleConfig::from_toml_str(toml).unwrap_err();
        match &err {
            ConfigError::ValidationError { field, message } => {
                assert_eq!(field, "draw.default_winners");
                assert!(message.contains("got 4"));
            }
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn file_not_found_for_missing_file() {
        let path = std::env::temp_dir().join("sorteo_config_test_missing/raffle.toml");
        let _ = fs::remove_file(&path);
        let err = load_config_from(&path).unwrap_err();
        match &err {
            ConfigError::FileNotFound { path: p } => assert_eq!(p, &path),
            other => panic!("expected FileNotFound, got: {other}"),
        }
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = std::env::temp_dir().join("sorteo_config_test_invalid");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        let path = tmp.join(CONFIG_FILE_NAME);
        fs::write(&path, "[draw\nmax_winners = ").unwrap();

        let err = load_config_from(&path).unwrap_err();
        match &err {
            ConfigError::ParseError { path, .. } => assert!(path.ends_with(CONFIG_FILE_NAME)),
            other => panic!("expected ParseError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn loads_custom_markers_from_file() {
        let tmp = std::env::temp_dir().join("sorteo_config_test_markers");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        let path = tmp.join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "[identity]\nmissing_identifier_markers = [\"S/D\", \"N/A\"]\n",
        )
        .unwrap();

        let config = load_config_from(&path).expect("should load");
        assert_eq!(config.identity.missing_identifier_markers, vec!["S/D", "N/A"]);

        let _ = fs::remove_dir_all(&tmp);
    }
}
