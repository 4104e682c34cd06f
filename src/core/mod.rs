//! Core dictionary types.

mod dictionary;
mod settings;
mod snapshot;
mod validation;

pub use dictionary::HotswapDictionary;
pub use settings::{DEFAULT_ENV_PREFIX, MonitorSettings, SettingsLoader, read_location};
pub use snapshot::{DictionarySnapshot, MIN_MAX_KEY_LEN};
pub use validation::{NonEmpty, Validate};

pub(crate) use snapshot::SnapshotParser;
pub(crate) use validation::validate_all;
