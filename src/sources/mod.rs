//! Dictionary source implementations.

mod dictionary_source;
mod file;
mod remote;

pub use dictionary_source::{ChangeResult, DictionarySource, Validators};
pub use file::{FileSource, load_local};
pub use remote::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT, HttpAuth, HttpSource, HttpSourceBuilder,
    Timeouts,
};

use crate::error::{DictError, Result};
use reqwest::Url;

/// Pick a source implementation for `location`.
///
/// - `http://` and `https://` URLs poll over HTTP with `timeouts`, sending
///   `auth` on every request.
/// - `file://` URLs and plain paths read the local filesystem; `auth` is
///   ignored.
///
/// # Errors
///
/// Returns [`DictError::Configuration`] for an empty location, an
/// unsupported scheme, or a `file://` URL that is not a valid local path.
///
/// # Examples
///
/// ```rust
/// use hotswap_dict::sources::{HttpAuth, Timeouts, source_for_location};
///
/// let url = "https://dict.example.com/polyphone.txt";
/// let source = source_for_location(url, Timeouts::default(), HttpAuth::None)?;
/// assert_eq!(source.name(), "http:https://dict.example.com/polyphone.txt");
///
/// let path = "/var/lib/dict/polyphone.txt";
/// let source = source_for_location(path, Timeouts::default(), HttpAuth::None)?;
/// assert_eq!(source.name(), "file:/var/lib/dict/polyphone.txt");
/// # Ok::<(), hotswap_dict::error::DictError>(())
/// ```
pub fn source_for_location(
    location: &str,
    timeouts: Timeouts,
    auth: HttpAuth,
) -> Result<Box<dyn DictionarySource>> {
    let location = location.trim();
    if location.is_empty() {
        return Err(DictError::Configuration(
            "dictionary location is empty".to_string(),
        ));
    }

    match Url::parse(location) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            let source = HttpSource::builder()
                .with_url(location)
                .with_timeouts(timeouts)
                .with_auth(auth)
                .build()?;
            Ok(Box::new(source))
        }
        Ok(url) if url.scheme() == "file" => {
            let path = url.to_file_path().map_err(|_| {
                DictError::Configuration(format!("not a local file URL: {}", location))
            })?;
            Ok(Box::new(FileSource::new(path)))
        }
        // Single-letter schemes are Windows drive letters.
        Ok(url) if url.scheme().len() > 1 => Err(DictError::Configuration(format!(
            "unsupported location scheme '{}'",
            url.scheme()
        ))),
        _ => Ok(Box::new(FileSource::new(location))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(location: &str) -> Result<Box<dyn DictionarySource>> {
        source_for_location(location, Timeouts::default(), HttpAuth::None)
    }

    #[test]
    fn test_http_location() {
        let source = source("http://dict.local/a.txt").unwrap();
        assert_eq!(source.name(), "http:http://dict.local/a.txt");
    }

    #[test]
    fn test_file_url_location() {
        let source = source("file:///tmp/a.txt").unwrap();
        assert_eq!(source.name(), "file:/tmp/a.txt");
    }

    #[test]
    fn test_plain_path_location() {
        let source = source("  dicts/a.txt \n").unwrap();
        assert_eq!(source.name(), "file:dicts/a.txt");
    }

    #[test]
    fn test_file_location_ignores_auth() {
        let auth = HttpAuth::Bearer("token".to_string());
        let source = source_for_location("dicts/a.txt", Timeouts::default(), auth);
        assert_eq!(source.unwrap().name(), "file:dicts/a.txt");
    }

    #[test]
    fn test_empty_location() {
        assert!(matches!(source("   "), Err(DictError::Configuration(_))));
    }

    #[test]
    fn test_unsupported_scheme() {
        let result = source("ftp://dict.local/a.txt");
        assert!(matches!(result, Err(DictError::Configuration(_))));
    }
}
