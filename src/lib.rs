//! # hotswap-dict
//!
//! Remote dictionary hot-reload with lock-free reads and atomic snapshot swaps.
//!
//! ## Overview
//!
//! `hotswap-dict` keeps a key to variants dictionary (for example the
//! polyphone table of a tokenizer) in sync with a remote copy:
//! - Lock-free atomic reads using `arc-swap`
//! - Cheap change detection with `HEAD` and `Last-Modified`/`ETag` validators
//! - Full download, parse and validation before anything is published
//! - One background worker per process, however many times it is started
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hotswap_dict::prelude::*;
//!
//! # fn example() -> hotswap_dict::error::Result<()> {
//! let settings = MonitorSettings::with_location("https://dict.example.com/polyphone.txt");
//! let handle = init_global(&settings)?;
//!
//! // Zero-cost reads (no locks!)
//! let dictionary = handle.get();
//! if let Some(variants) = dictionary.variants("行") {
//!     println!("行 reads as {:?}", variants);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Lock-free reads**: readers clone an `Arc` to an immutable snapshot
//! - **Atomic updates**: readers never see a half-built dictionary
//! - **Failure containment**: network, parse and validation errors keep the old snapshot
//! - **Validation**: empty dictionaries are rejected unless explicitly allowed
//! - **Subscribers**: callbacks on every published snapshot
//! - **Local sources**: `file://` URLs and plain paths, polled by mtime
//!
//! ## Feature Flags
//!
//! ```toml
//! [dependencies]
//! hotswap-dict = { version = "0.1", features = ["metrics"] }
//! ```

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod monitor;
pub mod notify;
pub mod sources;

#[cfg(feature = "metrics")]
pub mod metrics;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{
        DictionarySnapshot, HotswapDictionary, MonitorSettings, SettingsLoader, Validate,
    };
    pub use crate::error::{DictError, Result, ValidationError};
    pub use crate::monitor::{
        CycleOutcome, DictionaryMonitor, MonitorBuilder, Scheduler, SchedulerHandle, init_global,
    };
}
