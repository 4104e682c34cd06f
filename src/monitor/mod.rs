//! Change detection, reload cycles and background scheduling.

mod builder;
mod cycle;
mod scheduler;

pub use builder::MonitorBuilder;
pub use cycle::{CycleOutcome, DictionaryMonitor};
pub use scheduler::{Scheduler, SchedulerHandle, WORKER_THREAD_NAME, global, init_global};
