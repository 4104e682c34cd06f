//! Monitor settings and the location file.

use crate::error::{DictError, Result};
use crate::sources::{HttpAuth, Timeouts};
use config::{Environment, File};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default environment variable prefix for settings overrides.
pub const DEFAULT_ENV_PREFIX: &str = "DICT_MONITOR";

/// Tunables for a dictionary monitor.
///
/// Every field has a default, so an empty settings file (or none at all) is
/// valid as long as a location is eventually supplied.
///
/// # Examples
///
/// ```rust
/// use hotswap_dict::core::MonitorSettings;
/// use std::time::Duration;
///
/// let settings = MonitorSettings::default();
/// assert_eq!(settings.interval(), Duration::from_secs(20));
/// assert_eq!(settings.initial_delay(), Duration::from_millis(10));
/// ```
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MonitorSettings {
    /// Dictionary location (URL or path). Takes precedence over `location_file`.
    pub location: Option<String>,
    /// File whose first line holds the dictionary location.
    pub location_file: Option<PathBuf>,
    /// Delay between the end of one cycle and the start of the next.
    pub interval_ms: u64,
    /// Delay before the first cycle.
    pub initial_delay_ms: u64,
    /// Connection establishment timeout.
    pub connect_timeout_ms: u64,
    /// Overall request timeout.
    pub read_timeout_ms: u64,
    /// Accept reloads that produce an empty dictionary.
    pub allow_empty: bool,
    /// Bearer token sent to HTTP locations. Takes precedence over basic auth.
    pub auth_token: Option<String>,
    /// Basic auth user name for HTTP locations.
    pub auth_username: Option<String>,
    /// Basic auth password; empty if unset.
    pub auth_password: Option<String>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            location: None,
            location_file: None,
            interval_ms: 20_000,
            initial_delay_ms: 10,
            connect_timeout_ms: 10_000,
            read_timeout_ms: 15_000,
            allow_empty: false,
            auth_token: None,
            auth_username: None,
            auth_password: None,
        }
    }
}

impl fmt::Debug for MonitorSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorSettings")
            .field("location", &self.location)
            .field("location_file", &self.location_file)
            .field("interval_ms", &self.interval_ms)
            .field("initial_delay_ms", &self.initial_delay_ms)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("read_timeout_ms", &self.read_timeout_ms)
            .field("allow_empty", &self.allow_empty)
            .field("auth", &self.auth())
            .finish()
    }
}

impl MonitorSettings {
    /// Settings polling `location` with default tunables.
    pub fn with_location(location: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
            ..Self::default()
        }
    }

    /// Polling period.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Delay before the first cycle.
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// Network timeouts.
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            connect: Duration::from_millis(self.connect_timeout_ms),
            read: Duration::from_millis(self.read_timeout_ms),
        }
    }

    /// Authentication for HTTP locations.
    ///
    /// `auth_token` wins over `auth_username` / `auth_password`; with neither
    /// set, requests go out unauthenticated.
    pub fn auth(&self) -> HttpAuth {
        match (&self.auth_token, &self.auth_username) {
            (Some(token), _) => HttpAuth::Bearer(token.clone()),
            (None, Some(username)) => {
                let password = self.auth_password.clone().unwrap_or_default();
                HttpAuth::Basic(username.clone(), password)
            }
            (None, None) => HttpAuth::None,
        }
    }

    /// The dictionary location: `location` if set and not blank, else the
    /// first line of `location_file`.
    ///
    /// # Errors
    ///
    /// Returns [`DictError::Configuration`] if neither is set or the location
    /// file cannot be read.
    pub fn resolve_location(&self) -> Result<String> {
        if let Some(location) = self.location.as_deref().map(str::trim) {
            if !location.is_empty() {
                return Ok(location.to_string());
            }
        }

        match &self.location_file {
            Some(path) => read_location(path),
            None => Err(DictError::Configuration(
                "no dictionary location configured".to_string(),
            )),
        }
    }
}

/// Read the dictionary location from the first non-empty line of `path`.
///
/// # Errors
///
/// A missing, unreadable or blank file is a [`DictError::Configuration`]:
/// without a location the monitor cannot run.
pub fn read_location(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        DictError::Configuration(format!(
            "Failed to read location file {}: {}",
            path.display(),
            e
        ))
    })?;

    contents
        .lines()
        .map(|line| line.trim_start_matches('\u{feff}').trim())
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            DictError::Configuration(format!("Location file {} is empty", path.display()))
        })
}

/// Loads [`MonitorSettings`] from an optional file plus environment overrides.
///
/// Environment variables take precedence over the file, e.g.
/// `DICT_MONITOR_INTERVAL_MS=60000` or `DICT_MONITOR_LOCATION=https://...`.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_dict::core::SettingsLoader;
///
/// # fn example() -> hotswap_dict::error::Result<()> {
/// let settings = SettingsLoader::new()
///     .with_file("config/dictionary.yaml")
///     .with_env_overrides("DICT_MONITOR", "__")
///     .load()?;
/// # Ok(())
/// # }
/// ```
pub struct SettingsLoader {
    file: Option<PathBuf>,
    env_prefix: Option<String>,
    env_separator: String,
}

impl SettingsLoader {
    /// Create a loader with no file and the default environment prefix.
    pub fn new() -> Self {
        Self {
            file: None,
            env_prefix: Some(DEFAULT_ENV_PREFIX.to_string()),
            env_separator: "__".to_string(),
        }
    }

    /// Read settings from a YAML, TOML or JSON file (detected by extension).
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Use a custom environment prefix and nesting separator.
    pub fn with_env_overrides(mut self, prefix: &str, separator: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self.env_separator = separator.to_string();
        self
    }

    /// Ignore the environment entirely.
    pub fn without_env(mut self) -> Self {
        self.env_prefix = None;
        self
    }

    /// Merge the sources and deserialize.
    ///
    /// # Errors
    ///
    /// Returns [`DictError::Configuration`] if the file is missing, has an
    /// unsupported extension, or does not deserialize.
    pub fn load(&self) -> Result<MonitorSettings> {
        let mut builder = config::Config::builder();

        if let Some(path) = &self.file {
            validate_extension(path)?;
            builder = builder.add_source(File::from(path.clone()).required(true));
        }

        if let Some(prefix) = &self.env_prefix {
            builder = builder.add_source(
                Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator(&self.env_separator)
                    .try_parsing(true),
            );
        }

        let settings = builder.build()?.try_deserialize::<MonitorSettings>()?;
        tracing::debug!(?settings, "loaded monitor settings");
        Ok(settings)
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_extension(path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| {
            DictError::Configuration(format!(
                "Unable to determine settings format for: {}",
                path.display()
            ))
        })?;

    match extension {
        "yaml" | "yml" | "toml" | "json" => Ok(()),
        _ => Err(DictError::Configuration(format!(
            "Unsupported settings extension: {}. Supported: .yaml, .yml, .toml, .json",
            extension
        ))),
    }
}
