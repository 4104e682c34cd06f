//! Builder for constructing DictionaryMonitor instances.

use crate::core::{
    DictionarySnapshot, HotswapDictionary, MonitorSettings, NonEmpty, Validate, read_location,
};
use crate::error::{DictError, Result, ValidationError};
use crate::monitor::DictionaryMonitor;
use crate::sources::{DictionarySource, HttpAuth, Timeouts, load_local, source_for_location};
use std::path::PathBuf;

#[cfg(feature = "metrics")]
use crate::metrics::MonitorMetrics;

/// Where the dictionary location comes from.
enum LocationSpec {
    Inline(String),
    File(PathBuf),
    Settings(MonitorSettings),
}

/// What the shared dictionary starts out holding.
enum InitialSpec {
    Empty,
    Snapshot(DictionarySnapshot),
    File(PathBuf),
    Shared(HotswapDictionary),
}

/// Builder for constructing a [`DictionaryMonitor`].
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_dict::prelude::*;
///
/// # fn example() -> Result<()> {
/// let monitor = DictionaryMonitor::builder()
///     .with_location_file("config/location.txt")
///     .with_initial_file("config/polyphone.txt")
///     .with_validation(|snapshot: &DictionarySnapshot| {
///         if !snapshot.contains_key("行") {
///             return Err(ValidationError::invalid_entry("行", "missing"));
///         }
///         Ok(())
///     })
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct MonitorBuilder {
    location: Option<LocationSpec>,
    source: Option<Box<dyn DictionarySource>>,
    initial: InitialSpec,
    timeouts: Timeouts,
    auth: HttpAuth,
    allow_empty: bool,
    checks: Vec<Box<dyn Validate>>,
    #[cfg(feature = "metrics")]
    metrics: Option<MonitorMetrics>,
}

impl MonitorBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            location: None,
            source: None,
            initial: InitialSpec::Empty,
            timeouts: Timeouts::default(),
            auth: HttpAuth::None,
            allow_empty: false,
            checks: Vec::new(),
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Poll `location` (an `http(s)://` URL, `file://` URL or path).
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(LocationSpec::Inline(location.into()));
        self
    }

    /// Read the location from the first line of `path` at build time.
    pub fn with_location_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(LocationSpec::File(path.into()));
        self
    }

    /// Poll a custom source instead of resolving a location.
    pub fn with_source<S: DictionarySource + 'static>(mut self, source: S) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Apply location, timeouts, auth and `allow_empty` from loaded settings.
    ///
    /// The location is resolved at build time with
    /// [`MonitorSettings::resolve_location`].
    pub fn with_settings(mut self, settings: &MonitorSettings) -> Self {
        if settings.location.is_some() || settings.location_file.is_some() {
            self.location = Some(LocationSpec::Settings(settings.clone()));
        }
        self.timeouts = settings.timeouts();
        self.auth = settings.auth();
        self.allow_empty = settings.allow_empty;
        self
    }

    /// Start from an in-memory snapshot.
    pub fn with_initial_snapshot(mut self, snapshot: DictionarySnapshot) -> Self {
        self.initial = InitialSpec::Snapshot(snapshot);
        self
    }

    /// Start from a bundled dictionary file, parsed at build time.
    pub fn with_initial_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.initial = InitialSpec::File(path.into());
        self
    }

    /// Publish into an existing shared dictionary, keeping its current snapshot.
    pub fn with_dictionary(mut self, dictionary: HotswapDictionary) -> Self {
        self.initial = InitialSpec::Shared(dictionary);
        self
    }

    /// Network timeouts for HTTP locations.
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Authentication for HTTP locations.
    pub fn with_auth(mut self, auth: HttpAuth) -> Self {
        self.auth = auth;
        self
    }

    /// Accept reloads that produce an empty dictionary. Off by default.
    pub fn allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = allow;
        self
    }

    /// Add a validation closure run before every publish.
    pub fn with_validation<F>(mut self, validator: F) -> Self
    where
        F: Fn(&DictionarySnapshot) -> std::result::Result<(), ValidationError>
            + Send
            + Sync
            + 'static,
    {
        self.checks.push(Box::new(validator));
        self
    }

    /// Add a [`Validate`] implementation run before every publish.
    pub fn with_validator<V: Validate + 'static>(mut self, validator: V) -> Self {
        self.checks.push(Box::new(validator));
        self
    }

    /// Record cycle metrics with the given OpenTelemetry meter.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, meter: opentelemetry::metrics::Meter) -> Self {
        self.metrics = Some(MonitorMetrics::new(meter));
        self
    }

    /// Build the monitor.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Neither a source nor a location is configured, or the location
    ///   file is missing or blank ([`DictError::Configuration`])
    /// - The location has an unsupported scheme
    /// - The initial dictionary file cannot be read ([`DictError::Load`])
    pub fn build(self) -> Result<DictionaryMonitor> {
        let source = match self.source {
            Some(source) => source,
            None => {
                let location = match self.location {
                    Some(LocationSpec::Inline(location)) => location,
                    Some(LocationSpec::File(path)) => read_location(&path)?,
                    Some(LocationSpec::Settings(settings)) => settings.resolve_location()?,
                    None => {
                        return Err(DictError::Configuration(
                            "no dictionary location or source configured".to_string(),
                        ));
                    }
                };
                source_for_location(&location, self.timeouts, self.auth)?
            }
        };

        let dictionary = match self.initial {
            InitialSpec::Empty => HotswapDictionary::default(),
            InitialSpec::Snapshot(snapshot) => HotswapDictionary::new(snapshot),
            InitialSpec::File(path) => HotswapDictionary::new(load_local(&path)?),
            InitialSpec::Shared(dictionary) => dictionary,
        };

        let mut checks = self.checks;
        if !self.allow_empty {
            checks.insert(0, Box::new(NonEmpty));
        }

        tracing::info!(
            source = %source.name(),
            entries = dictionary.get().len(),
            "dictionary monitor ready"
        );

        let monitor = DictionaryMonitor::from_parts(source, dictionary, checks);

        #[cfg(feature = "metrics")]
        let monitor = match self.metrics {
            Some(metrics) => monitor.with_metrics(metrics),
            None => monitor,
        };

        Ok(monitor)
    }
}

impl Default for MonitorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
