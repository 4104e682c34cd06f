//! Snapshot validation support.

use crate::core::DictionarySnapshot;
use crate::error::ValidationError;

/// Check run against every freshly loaded snapshot before it is published.
///
/// A rejected snapshot is discarded and the active dictionary stays in
/// place. Closures of the form `Fn(&DictionarySnapshot) -> Result<(), ValidationError>`
/// implement this trait.
///
/// # Examples
///
/// ```rust
/// use hotswap_dict::core::{DictionarySnapshot, Validate};
/// use hotswap_dict::error::ValidationError;
///
/// struct RequiresKey(&'static str);
///
/// impl Validate for RequiresKey {
///     fn validate(&self, snapshot: &DictionarySnapshot) -> Result<(), ValidationError> {
///         if !snapshot.contains_key(self.0) {
///             return Err(ValidationError::invalid_entry(self.0, "missing from dictionary"));
///         }
///         Ok(())
///     }
/// }
///
/// let check = RequiresKey("行");
/// assert!(check.validate(&DictionarySnapshot::parse_str("行=xíng\n")).is_ok());
/// assert!(check.validate(&DictionarySnapshot::empty()).is_err());
/// ```
pub trait Validate: Send + Sync {
    /// Validate the snapshot.
    ///
    /// # Errors
    ///
    /// Should return a `ValidationError` describing what validation failed.
    fn validate(&self, snapshot: &DictionarySnapshot) -> Result<(), ValidationError>;
}

impl<F> Validate for F
where
    F: Fn(&DictionarySnapshot) -> Result<(), ValidationError> + Send + Sync,
{
    fn validate(&self, snapshot: &DictionarySnapshot) -> Result<(), ValidationError> {
        self(snapshot)
    }
}

/// Rejects snapshots without entries.
///
/// Installed by default on every monitor so that a truncated or blank remote
/// file never wipes the live dictionary.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonEmpty;

impl Validate for NonEmpty {
    fn validate(&self, snapshot: &DictionarySnapshot) -> Result<(), ValidationError> {
        if snapshot.is_empty() {
            return Err(ValidationError::Empty);
        }
        Ok(())
    }
}

/// Run every validator, collecting all failures.
pub(crate) fn validate_all(
    validators: &[Box<dyn Validate>],
    snapshot: &DictionarySnapshot,
) -> Result<(), ValidationError> {
    let mut errors: Vec<ValidationError> = validators
        .iter()
        .filter_map(|v| v.validate(snapshot).err())
        .collect();

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty() {
        assert!(NonEmpty.validate(&DictionarySnapshot::empty()).is_err());
        assert!(NonEmpty.validate(&DictionarySnapshot::parse_str("a=b\n")).is_ok());
    }

    #[test]
    fn test_closure_validator() {
        let max_three = |snapshot: &DictionarySnapshot| {
            if snapshot.len() > 3 {
                return Err(ValidationError::custom("too many entries"));
            }
            Ok(())
        };
        assert!(max_three.validate(&DictionarySnapshot::parse_str("a=b\n")).is_ok());
        assert!(
            max_three
                .validate(&DictionarySnapshot::parse_str("a=1\nb=2\nc=3\nd=4\n"))
                .is_err()
        );
    }

    #[test]
    fn test_validate_all_collects() {
        let validators: Vec<Box<dyn Validate>> = vec![
            Box::new(NonEmpty),
            Box::new(|_: &DictionarySnapshot| -> Result<(), ValidationError> {
                Err(ValidationError::custom("always"))
            }),
        ];

        let err = validate_all(&validators, &DictionarySnapshot::empty()).unwrap_err();
        assert!(matches!(err, ValidationError::Multiple(ref errs) if errs.len() == 2));

        let err = validate_all(&validators, &DictionarySnapshot::parse_str("a=b\n")).unwrap_err();
        assert!(matches!(err, ValidationError::Custom(_)));

        assert!(validate_all(&[], &DictionarySnapshot::empty()).is_ok());
    }
}
