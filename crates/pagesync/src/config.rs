//! Synchronization settings and the `.properties` file reader.
//!
//! Sources are layered explicitly by the caller:
//!
//! ```rust
//! use pagesync::SyncConfig;
//!
//! let config = SyncConfig::from_yaml_str("implicit_wait_seconds: 5")
//!     .unwrap()
//!     .with_env_overrides()
//!     .unwrap();
//! assert!(config.implicit_wait_seconds > 0);
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::result::{SyncError, SyncResult};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default element wait, in seconds
pub const DEFAULT_IMPLICIT_WAIT_SECONDS: u64 = 15;

/// Default poll interval, in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Default page-load wait, in seconds
pub const DEFAULT_PAGE_TIMEOUT_SECONDS: u64 = 20;

/// Environment variable overriding `implicit_wait_seconds`
pub const ENV_IMPLICIT_WAIT: &str = "PAGESYNC_IMPLICIT_WAIT";

/// Environment variable overriding `poll_interval_ms`
pub const ENV_POLL_INTERVAL_MS: &str = "PAGESYNC_POLL_INTERVAL_MS";

/// Environment variable overriding `fail_on_timeout`
pub const ENV_FAIL_ON_TIMEOUT: &str = "PAGESYNC_FAIL_ON_TIMEOUT";

// =============================================================================
// SYNC CONFIG
// =============================================================================

/// Timeouts and reporting switches for one test run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Element wait, in seconds
    pub implicit_wait_seconds: u64,
    /// Delay between probes, in milliseconds
    pub poll_interval_ms: u64,
    /// Page ready-state wait, in seconds
    pub page_timeout_seconds: u64,
    /// Turn an expired wait into an error
    pub fail_on_timeout: bool,
    /// Echo reporter output to the console
    pub console_output: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            implicit_wait_seconds: DEFAULT_IMPLICIT_WAIT_SECONDS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            page_timeout_seconds: DEFAULT_PAGE_TIMEOUT_SECONDS,
            fail_on_timeout: true,
            console_output: false,
        }
    }
}

impl SyncConfig {
    /// Defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse YAML; missing keys keep their defaults
    pub fn from_yaml_str(yaml: &str) -> SyncResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()
    }

    /// Read a YAML file
    pub fn load(path: impl AsRef<Path>) -> SyncResult<Self> {
        let yaml = fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Read the known keys out of a properties file
    pub fn from_properties(props: &Properties) -> SyncResult<Self> {
        let mut config = Self::default();
        config.apply(|key| props.get(key).map(str::to_string), |field| field)?;
        config.validate()
    }

    /// Apply `PAGESYNC_*` environment variables
    pub fn with_env_overrides(self) -> SyncResult<Self> {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any variable lookup
    pub fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> SyncResult<Self> {
        self.apply(lookup, |field| match field {
            "implicit_wait_seconds" => ENV_IMPLICIT_WAIT,
            "poll_interval_ms" => ENV_POLL_INTERVAL_MS,
            "fail_on_timeout" => ENV_FAIL_ON_TIMEOUT,
            _ => "",
        })?;
        self.validate()
    }

    fn apply(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
        key_for: impl Fn(&'static str) -> &'static str,
    ) -> SyncResult<()> {
        let fetch = |field: &'static str| {
            let key = key_for(field);
            if key.is_empty() {
                None
            } else {
                lookup(key).map(|raw| (key, raw))
            }
        };
        if let Some((key, raw)) = fetch("implicit_wait_seconds") {
            self.implicit_wait_seconds = parse_value(key, &raw)?;
        }
        if let Some((key, raw)) = fetch("poll_interval_ms") {
            self.poll_interval_ms = parse_value(key, &raw)?;
        }
        if let Some((key, raw)) = fetch("page_timeout_seconds") {
            self.page_timeout_seconds = parse_value(key, &raw)?;
        }
        if let Some((key, raw)) = fetch("fail_on_timeout") {
            self.fail_on_timeout = parse_bool(key, &raw)?;
        }
        if let Some((key, raw)) = fetch("console_output") {
            self.console_output = parse_bool(key, &raw)?;
        }
        Ok(())
    }

    fn validate(self) -> SyncResult<Self> {
        if self.poll_interval_ms == 0 {
            return Err(SyncError::config("poll_interval_ms must be greater than zero"));
        }
        Ok(self)
    }

    /// Element wait as a duration
    #[must_use]
    pub const fn implicit_wait(&self) -> Duration {
        Duration::from_secs(self.implicit_wait_seconds)
    }

    /// Poll interval as a duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Page ready-state wait as a duration
    #[must_use]
    pub const fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_seconds)
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> SyncResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| SyncError::config(format!("[{key}] has an invalid value [{raw}]")))
}

fn parse_bool(key: &str, raw: &str) -> SyncResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(SyncError::config(format!(
            "[{key}] has an invalid boolean [{raw}]"
        ))),
    }
}

// =============================================================================
// PROPERTIES
// =============================================================================

/// Flat `key=value` file.
///
/// Blank lines and lines starting with `;`, `#` or `'` are skipped, as are
/// lines without `=`. A value wrapped in matching single or double quotes
/// is unwrapped. When a key repeats, the first definition wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    /// Empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a file; a missing file is an error
    pub fn load(path: impl AsRef<Path>) -> SyncResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SyncError::config(format!(
                "The file [{}] was not found to exist.",
                path.display()
            )));
        }
        Ok(Self::parse(&fs::read_to_string(path)?))
    }

    /// Parse file contents
    #[must_use]
    pub fn parse(contents: &str) -> Self {
        let mut entries = BTreeMap::new();
        for line in contents.lines() {
            if line.is_empty() || line.starts_with([';', '#', '\'']) {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            entries
                .entry(key.trim().to_string())
                .or_insert_with(|| unquote(value.trim()).to_string());
        }
        Self { entries }
    }

    /// Value for `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Value for `key`, or `default`
    #[must_use]
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Insert or replace
    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        self.entries.insert(key.into(), value.to_string());
    }

    /// Number of keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No keys
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write `key=value` lines, skipping blank values
    pub fn save(&self, path: impl AsRef<Path>) -> SyncResult<()> {
        let body: String = self
            .entries
            .iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .map(|(key, value)| format!("{key}={value}\n"))
            .collect();
        fs::write(path, body)?;
        Ok(())
    }
}

fn unquote(value: &str) -> &str {
    let quoted = value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')));
    if quoted {
        &value[1..value.len() - 1]
    } else {
        value
    }
}
