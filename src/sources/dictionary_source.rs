//! Dictionary source trait and change-detection types.

use crate::core::DictionarySnapshot;
use crate::error::{DictError, Result};
use async_trait::async_trait;

/// Cache validators last observed for a location.
///
/// Empty until the first successful reload. Sent back as
/// `If-Modified-Since` / `If-None-Match` on the next check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validators {
    /// Value of the `Last-Modified` response header
    pub last_modified: Option<String>,
    /// Value of the `ETag` response header
    pub etag: Option<String>,
}

impl Validators {
    /// Create validators from raw header values.
    pub fn new(last_modified: Option<String>, etag: Option<String>) -> Self {
        Self {
            last_modified,
            etag,
        }
    }

    /// Whether no validator has been observed yet.
    pub fn is_empty(&self) -> bool {
        self.last_modified.is_none() && self.etag.is_none()
    }

    /// Whether `self` (freshly observed) signals a change relative to `prior`.
    ///
    /// A validator only counts when the server actually sent it; values are
    /// compared case-insensitively.
    pub fn differs_from(&self, prior: &Validators) -> bool {
        fn changed(observed: &Option<String>, prior: &Option<String>) -> bool {
            match (observed, prior) {
                (Some(observed), Some(prior)) => !observed.eq_ignore_ascii_case(prior),
                (Some(_), None) => true,
                (None, _) => false,
            }
        }

        changed(&self.last_modified, &prior.last_modified) || changed(&self.etag, &prior.etag)
    }
}

/// Outcome of a change check.
#[derive(Debug)]
pub enum ChangeResult {
    /// The remote content is the one we already have.
    Unchanged,
    /// The remote content changed; carries the validators to commit once the
    /// new content has been loaded.
    Changed(Validators),
    /// The check failed. Never escalated past the cycle.
    Unreachable(DictError),
}

impl ChangeResult {
    /// Whether the check reported a change.
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed(_))
    }
}

/// A place a dictionary can be polled and loaded from.
///
/// Implement this trait to plug in other transports. `check` must never
/// fail outright: every error is reported as [`ChangeResult::Unreachable`].
#[async_trait]
pub trait DictionarySource: Send + Sync {
    /// Cheap metadata check: has the content changed since `prior`?
    async fn check(&self, prior: &Validators) -> ChangeResult;

    /// Fetch and parse the full dictionary.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be fetched completely. No
    /// partially parsed snapshot is ever returned.
    async fn load(&self) -> Result<DictionarySnapshot>;

    /// Get a human-readable name for this source (for logging/debugging).
    fn name(&self) -> String;
}
