//! Configuration loading for wordtrail.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. Project config (`.wordtrail/config.toml`)
//! 3. User config (`~/.wordtrail/config.toml`)
//! 4. Defaults (lowest priority)
//!
//! All configuration is optional. The system runs with sensible defaults
//! when no config exists.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use chrono::FixedOffset;

use crate::core::{SystemClock, DEFAULT_DAILY_NEW_WORDS, DEFAULT_DAILY_REVIEW_WORDS};
use crate::error::{Result, WordtrailError};
use crate::stats::{DEFAULT_MASTERED_THRESHOLD, DEFAULT_NEW_WORDS_BATCH};
use crate::util::read_to_string_limited;

/// Name of the per-user and per-project config directory.
pub const CONFIG_DIR_NAME: &str = ".wordtrail";

/// Main configuration struct for wordtrail.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Default daily goals for users who never set one.
    pub goals: GoalsConfig,
    /// Stats thresholds and batch sizes.
    pub stats: StatsConfig,
    /// Calendar-day boundaries.
    pub clock: ClockConfig,
    /// Where records are kept.
    pub storage: StorageConfig,
}

/// Default daily goals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GoalsConfig {
    pub daily_new_words: u32,
    pub daily_review_words: u32,
}

impl Default for GoalsConfig {
    fn default() -> Self {
        Self {
            daily_new_words: DEFAULT_DAILY_NEW_WORDS,
            daily_review_words: DEFAULT_DAILY_REVIEW_WORDS,
        }
    }
}

/// Stats configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StatsConfig {
    /// Proficiency at which a word counts as mastered, in `[0, 1]`.
    pub mastered_threshold: f64,
    /// Default batch size for `new-words`.
    pub new_words_batch: usize,
}

impl StatsConfig {
    /// Check if a mastered threshold is valid.
    pub fn is_valid_threshold(value: f64) -> bool {
        (0.0..=1.0).contains(&value)
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            mastered_threshold: DEFAULT_MASTERED_THRESHOLD,
            new_words_batch: DEFAULT_NEW_WORDS_BATCH,
        }
    }
}

/// Clock configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClockConfig {
    /// Offset from UTC in minutes that defines calendar days.
    /// The system's local offset is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_offset_minutes: Option<i32>,
}

impl ClockConfig {
    /// Check if an offset can be represented (strictly within one day).
    pub fn is_valid_offset(minutes: i32) -> bool {
        minutes.checked_mul(60).and_then(FixedOffset::east_opt).is_some()
    }

    /// The configured offset, if any.
    pub fn offset(&self) -> Option<FixedOffset> {
        self.utc_offset_minutes
            .and_then(|m| m.checked_mul(60))
            .and_then(FixedOffset::east_opt)
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Data directory. Defaults to `<wordtrail_home>/data`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration with full precedence chain.
    ///
    /// Precedence (highest to lowest):
    /// 1. Environment variables
    /// 2. Project config (`.wordtrail/config.toml` in cwd)
    /// 3. User config (`~/.wordtrail/config.toml`)
    /// 4. Defaults
    pub fn load() -> Self {
        match env::current_dir() {
            Ok(cwd) => Self::load_from_cwd(&cwd),
            Err(_) => {
                let mut config = Config::default();
                if let Some(user_config) = Self::load_user_config() {
                    config = config.merge(user_config);
                }
                config.apply_env_overrides();
                config
            }
        }
    }

    /// Load configuration with a specific working directory.
    pub fn load_from_cwd(cwd: &Path) -> Self {
        let mut config = Config::default();

        if let Some(user_config) = Self::load_user_config() {
            config = config.merge(user_config);
        }

        if let Some(project_config) = Self::load_project_config(cwd) {
            config = config.merge(project_config);
        }

        config.apply_env_overrides();

        config
    }

    /// Load user config from `~/.wordtrail/config.toml`.
    fn load_user_config() -> Option<Config> {
        let path = wordtrail_home()?.join("config.toml");
        Self::load_optional(&path)
    }

    /// Load project config from `.wordtrail/config.toml` in the given directory.
    fn load_project_config(cwd: &Path) -> Option<Config> {
        let path = cwd.join(CONFIG_DIR_NAME).join("config.toml");
        Self::load_optional(&path)
    }

    /// A missing file is silent; an unreadable or malformed one is skipped
    /// with a warning.
    fn load_optional(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        match Self::load_from_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring config file");
                None
            }
        }
    }

    /// Load config from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = read_to_string_limited(path)?;
        toml::from_str(&content).map_err(|e| WordtrailError::config(e.to_string()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("WORDTRAIL_DAILY_NEW_WORDS") {
            match val.parse::<u32>() {
                Ok(n) => self.goals.daily_new_words = n,
                Err(_) => tracing::warn!(
                    "Invalid WORDTRAIL_DAILY_NEW_WORDS value '{}'. \
                    Expected a non-negative integer. Using '{}'.",
                    val,
                    self.goals.daily_new_words
                ),
            }
        }

        if let Ok(val) = env::var("WORDTRAIL_DAILY_REVIEW_WORDS") {
            match val.parse::<u32>() {
                Ok(n) => self.goals.daily_review_words = n,
                Err(_) => tracing::warn!(
                    "Invalid WORDTRAIL_DAILY_REVIEW_WORDS value '{}'. \
                    Expected a non-negative integer. Using '{}'.",
                    val,
                    self.goals.daily_review_words
                ),
            }
        }

        if let Ok(val) = env::var("WORDTRAIL_MASTERED_THRESHOLD") {
            match val.parse::<f64>() {
                Ok(n) if StatsConfig::is_valid_threshold(n) => self.stats.mastered_threshold = n,
                Ok(n) => tracing::warn!(
                    "Invalid WORDTRAIL_MASTERED_THRESHOLD value '{}'. \
                    Must be in range [0.0, 1.0]. Using '{}'.",
                    n,
                    self.stats.mastered_threshold
                ),
                Err(_) => tracing::warn!(
                    "Invalid WORDTRAIL_MASTERED_THRESHOLD value '{}'. \
                    Expected a decimal number. Using '{}'.",
                    val,
                    self.stats.mastered_threshold
                ),
            }
        }

        if let Ok(val) = env::var("WORDTRAIL_NEW_WORDS_BATCH") {
            match val.parse::<usize>() {
                Ok(n) => self.stats.new_words_batch = n,
                Err(_) => tracing::warn!(
                    "Invalid WORDTRAIL_NEW_WORDS_BATCH value '{}'. \
                    Expected a non-negative integer. Using '{}'.",
                    val,
                    self.stats.new_words_batch
                ),
            }
        }

        if let Ok(val) = env::var("WORDTRAIL_UTC_OFFSET_MINUTES") {
            match val.parse::<i32>() {
                Ok(n) if ClockConfig::is_valid_offset(n) => {
                    self.clock.utc_offset_minutes = Some(n)
                }
                _ => tracing::warn!(
                    "Invalid WORDTRAIL_UTC_OFFSET_MINUTES value '{}'. \
                    Expected minutes strictly between -1440 and 1440.",
                    val
                ),
            }
        }

        if let Ok(val) = env::var("WORDTRAIL_DATA_DIR") {
            if val.is_empty() {
                tracing::warn!("WORDTRAIL_DATA_DIR is empty, ignoring");
            } else {
                self.storage.data_dir = Some(PathBuf::from(val));
            }
        }
    }

    /// Merge another config into this one.
    ///
    /// The `other` config takes precedence field by field. A value equal to
    /// the default does not override a lower layer, so a layer cannot reset
    /// a field back to its default.
    fn merge(mut self, other: Config) -> Self {
        let default_goals = GoalsConfig::default();
        if other.goals.daily_new_words != default_goals.daily_new_words {
            self.goals.daily_new_words = other.goals.daily_new_words;
        }
        if other.goals.daily_review_words != default_goals.daily_review_words {
            self.goals.daily_review_words = other.goals.daily_review_words;
        }

        let default_stats = StatsConfig::default();
        if other.stats.mastered_threshold != default_stats.mastered_threshold {
            if StatsConfig::is_valid_threshold(other.stats.mastered_threshold) {
                self.stats.mastered_threshold = other.stats.mastered_threshold;
            } else {
                tracing::warn!(
                    value = other.stats.mastered_threshold,
                    "ignoring out-of-range stats.mastered_threshold"
                );
            }
        }
        if other.stats.new_words_batch != default_stats.new_words_batch {
            self.stats.new_words_batch = other.stats.new_words_batch;
        }

        if let Some(minutes) = other.clock.utc_offset_minutes {
            if ClockConfig::is_valid_offset(minutes) {
                self.clock.utc_offset_minutes = Some(minutes);
            } else {
                tracing::warn!(minutes, "ignoring out-of-range clock.utc_offset_minutes");
            }
        }

        if other.storage.data_dir.is_some() {
            self.storage.data_dir = other.storage.data_dir;
        }

        self
    }

    /// Clock that turns instants into calendar days at the configured offset.
    pub fn system_clock(&self) -> SystemClock {
        match self.clock.offset() {
            Some(offset) => SystemClock::with_offset(offset),
            None => SystemClock::new(),
        }
    }

    /// Resolved data directory.
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.storage
            .data_dir
            .clone()
            .or_else(|| wordtrail_home().map(|h| h.join("data")))
    }

    /// Resolved wordbooks directory, `<data_dir>/wordbooks`.
    pub fn wordbooks_dir(&self) -> Option<PathBuf> {
        self.data_dir().map(|d| d.join("wordbooks"))
    }
}

/// Get the wordtrail home directory.
///
/// Uses `WORDTRAIL_HOME` if set, otherwise `~/.wordtrail`.
/// Invalid values are ignored and we fall back to the default.
pub fn wordtrail_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("WORDTRAIL_HOME") {
        if home.is_empty() {
            tracing::warn!("WORDTRAIL_HOME is empty, using default");
        } else {
            let path = PathBuf::from(&home);
            if path.is_absolute() {
                return Some(path);
            }
            if let Ok(canonical) = path.canonicalize() {
                return Some(canonical);
            }
            tracing::warn!("WORDTRAIL_HOME is relative and doesn't exist, using as-is");
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        return Some(home.join(CONFIG_DIR_NAME));
    }

    let fallback_path = fallback_wordtrail_home();
    tracing::warn!(
        "HOME not set, using fallback location: {}",
        fallback_path.display()
    );
    Some(fallback_path)
}

/// Fallback home when HOME is unavailable.
#[cfg(unix)]
fn fallback_wordtrail_home() -> PathBuf {
    use std::os::unix::fs::MetadataExt;
    let uid = std::fs::metadata("/").map(|m| m.uid()).unwrap_or(0);
    PathBuf::from(format!("/tmp/wordtrail-{}", uid))
}

/// Fallback home when HOME is unavailable.
#[cfg(not(unix))]
fn fallback_wordtrail_home() -> PathBuf {
    std::env::temp_dir().join("wordtrail")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Clock;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    const ENV_VARS: &[&str] = &[
        "WORDTRAIL_HOME",
        "WORDTRAIL_DATA_DIR",
        "WORDTRAIL_DAILY_NEW_WORDS",
        "WORDTRAIL_DAILY_REVIEW_WORDS",
        "WORDTRAIL_MASTERED_THRESHOLD",
        "WORDTRAIL_NEW_WORDS_BATCH",
        "WORDTRAIL_UTC_OFFSET_MINUTES",
    ];

    /// Point the user config at an empty temp home and clear overrides.
    fn isolated_env() -> TempDir {
        for var in ENV_VARS {
            env::remove_var(var);
        }
        let home = TempDir::new().unwrap();
        env::set_var("WORDTRAIL_HOME", home.path());
        home
    }

    fn clear_env() {
        for var in ENV_VARS {
            env::remove_var(var);
        }
    }

    fn write_project(dir: &Path, content: &str) {
        let config_dir = dir.join(CONFIG_DIR_NAME);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join("config.toml"), content).unwrap();
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.goals.daily_new_words, 10);
        assert_eq!(config.goals.daily_review_words, 30);
        assert_eq!(config.stats.mastered_threshold, 0.9);
        assert_eq!(config.stats.new_words_batch, 20);
        assert!(config.clock.utc_offset_minutes.is_none());
        assert!(config.storage.data_dir.is_none());
    }

    #[test]
    fn test_parse_partial_config() {
        let config: Config = toml::from_str(
            r#"
[goals]
daily_new_words = 5

[clock]
utc_offset_minutes = 480
"#,
        )
        .unwrap();
        assert_eq!(config.goals.daily_new_words, 5);
        assert_eq!(config.goals.daily_review_words, 30);
        assert_eq!(
            config.clock.offset(),
            Some(FixedOffset::east_opt(8 * 3600).unwrap())
        );
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is not valid toml [[[").unwrap();

        let err = Config::load_from_file(&path).unwrap_err();
        assert!(matches!(err, WordtrailError::Config { .. }));
    }

    #[test]
    fn test_offset_validation() {
        assert!(ClockConfig::is_valid_offset(0));
        assert!(ClockConfig::is_valid_offset(-300));
        assert!(ClockConfig::is_valid_offset(1439));
        assert!(!ClockConfig::is_valid_offset(1440));
        assert!(!ClockConfig::is_valid_offset(i32::MAX));
    }

    #[test]
    #[serial]
    fn test_user_then_project_precedence() {
        let home = isolated_env();
        fs::write(
            home.path().join("config.toml"),
            "[goals]\ndaily_new_words = 12\ndaily_review_words = 40\n",
        )
        .unwrap();

        let project = TempDir::new().unwrap();
        write_project(project.path(), "[goals]\ndaily_review_words = 50\n");

        let config = Config::load_from_cwd(project.path());
        assert_eq!(config.goals.daily_new_words, 12);
        assert_eq!(config.goals.daily_review_words, 50);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_var_precedence() {
        let _home = isolated_env();
        let project = TempDir::new().unwrap();
        write_project(project.path(), "[stats]\nmastered_threshold = 0.8\n");

        env::set_var("WORDTRAIL_MASTERED_THRESHOLD", "0.75");
        env::set_var("WORDTRAIL_NEW_WORDS_BATCH", "5");
        env::set_var("WORDTRAIL_DAILY_NEW_WORDS", "3");
        env::set_var("WORDTRAIL_UTC_OFFSET_MINUTES", "-300");

        let config = Config::load_from_cwd(project.path());
        assert_eq!(config.stats.mastered_threshold, 0.75);
        assert_eq!(config.stats.new_words_batch, 5);
        assert_eq!(config.goals.daily_new_words, 3);
        assert_eq!(config.clock.utc_offset_minutes, Some(-300));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_env_values_ignored() {
        let _home = isolated_env();
        env::set_var("WORDTRAIL_MASTERED_THRESHOLD", "1.5");
        env::set_var("WORDTRAIL_DAILY_NEW_WORDS", "-4");
        env::set_var("WORDTRAIL_UTC_OFFSET_MINUTES", "abc");

        let project = TempDir::new().unwrap();
        let config = Config::load_from_cwd(project.path());
        assert_eq!(config.stats.mastered_threshold, 0.9);
        assert_eq!(config.goals.daily_new_words, 10);
        assert!(config.clock.utc_offset_minutes.is_none());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_malformed_project_config_is_skipped() {
        let _home = isolated_env();
        let project = TempDir::new().unwrap();
        write_project(project.path(), "goals = [[[");

        let config = Config::load_from_cwd(project.path());
        assert_eq!(config, Config::default());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_data_dir_resolution() {
        let home = isolated_env();
        assert_eq!(
            Config::load_from_cwd(home.path()).data_dir(),
            Some(home.path().join("data"))
        );
        assert_eq!(
            Config::default().wordbooks_dir(),
            Some(home.path().join("data").join("wordbooks"))
        );

        write_project(home.path(), "[storage]\ndata_dir = \"/var/lib/wordtrail\"\n");
        assert_eq!(
            Config::load_from_cwd(home.path()).data_dir(),
            Some(PathBuf::from("/var/lib/wordtrail"))
        );

        env::set_var("WORDTRAIL_DATA_DIR", "/srv/wordtrail");
        let config = Config::load_from_cwd(home.path());
        assert_eq!(config.data_dir(), Some(PathBuf::from("/srv/wordtrail")));

        clear_env();
    }

    #[test]
    fn test_system_clock_uses_configured_offset() {
        let mut config = Config::default();
        config.clock.utc_offset_minutes = Some(-480);
        let clock = config.system_clock();
        assert_eq!(clock.offset(), FixedOffset::west_opt(8 * 3600).unwrap());
    }
}
