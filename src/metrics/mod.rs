//! Built-in metrics for monitor cycles.
//!
//! Provides OpenTelemetry metrics tracking:
//! - Cycles run, and how each ended (reload, no-op, failure)
//! - Cycle duration
//! - Entries in the published snapshot
//! - Snapshot age
//!
//! # Examples
//!
//! ```rust,no_run
//! use hotswap_dict::prelude::*;
//! use opentelemetry::global;
//!
//! # fn example() -> Result<()> {
//! let meter = global::meter("tokenizer");
//!
//! let monitor = DictionaryMonitor::builder()
//!     .with_location("https://dict.example.com/polyphone.txt")
//!     .with_metrics(meter)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

mod monitor_metrics;

pub use monitor_metrics::MonitorMetrics;
