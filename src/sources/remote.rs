//! Remote HTTP/HTTPS dictionary source.

use super::{ChangeResult, DictionarySource, Validators};
use crate::core::{DictionarySnapshot, SnapshotParser};
use crate::error::{DictError, Result};
use async_trait::async_trait;
use reqwest::header::{
    AUTHORIZATION, ETAG, HeaderMap, HeaderName, HeaderValue, IF_MODIFIED_SINCE, IF_NONE_MATCH,
    LAST_MODIFIED,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use std::fmt;
use std::time::Duration;

/// Default bound on establishing a connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default bound on a whole request, body included.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(15);

/// Network timeouts applied to every check and download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Connection establishment bound
    pub connect: Duration,
    /// Overall request bound, including reading the body
    pub read: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: DEFAULT_CONNECT_TIMEOUT,
            read: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// Authentication method for HTTP requests.
///
/// Sent on both the `HEAD` check and the `GET` download. `Debug` output
/// never contains the secret.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum HttpAuth {
    /// No authentication
    #[default]
    None,
    /// Bearer token authentication
    Bearer(String),
    /// Basic authentication (username, password)
    Basic(String, String),
}

impl fmt::Debug for HttpAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpAuth::None => f.write_str("None"),
            HttpAuth::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            HttpAuth::Basic(username, _) => write!(f, "Basic({}, <redacted>)", username),
        }
    }
}

/// HTTP-based dictionary source.
///
/// Change detection uses a `HEAD` request carrying `If-Modified-Since` and
/// `If-None-Match`; the body is only downloaded, with `GET`, once the check
/// reports a change. Both requests are bounded by [`Timeouts`] so a hung
/// server can only stall a single cycle.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_dict::sources::HttpSource;
/// use std::time::Duration;
///
/// # fn example() -> hotswap_dict::error::Result<()> {
/// let source = HttpSource::builder()
///     .with_url("https://dict.example.com/polyphone.txt")
///     .with_auth_token("secret-token")
///     .with_timeout(Duration::from_secs(15))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct HttpSource {
    url: String,
    client: Client,
    auth: HttpAuth,
}

impl HttpSource {
    /// Create a new builder for constructing an HTTP source.
    pub fn builder() -> HttpSourceBuilder {
        HttpSourceBuilder::new()
    }

    /// The polled URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        Ok(match &self.auth {
            HttpAuth::None => request,
            HttpAuth::Bearer(token) => {
                let header_value = HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| {
                        DictError::Configuration(format!("Invalid bearer token: {}", e))
                    })?;
                request.header(AUTHORIZATION, header_value)
            }
            HttpAuth::Basic(username, password) => request.basic_auth(username, Some(password)),
        })
    }

    fn protocol_error(&self, status: StatusCode) -> DictError {
        DictError::Protocol {
            status: status.as_u16(),
            location: self.url.clone(),
        }
    }

    async fn conditional_head(&self, prior: &Validators) -> Result<ChangeResult> {
        let mut request = self.client.head(&self.url);
        if let Some(last_modified) = &prior.last_modified {
            request = request.header(IF_MODIFIED_SINCE, last_modified.as_str());
        }
        if let Some(etag) = &prior.etag {
            request = request.header(IF_NONE_MATCH, etag.as_str());
        }

        let response = self.authorize(request)?.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_MODIFIED {
            return Ok(ChangeResult::Unchanged);
        }
        if !status.is_success() {
            return Err(self.protocol_error(status));
        }

        let headers = response.headers();
        let observed = Validators::new(
            last_header(headers, LAST_MODIFIED),
            last_header(headers, ETAG),
        );

        // Some servers never answer 304; compare validators ourselves.
        if observed.differs_from(prior) {
            Ok(ChangeResult::Changed(observed))
        } else {
            Ok(ChangeResult::Unchanged)
        }
    }
}

#[async_trait]
impl DictionarySource for HttpSource {
    async fn check(&self, prior: &Validators) -> ChangeResult {
        match self.conditional_head(prior).await {
            Ok(result) => result,
            Err(err) => ChangeResult::Unreachable(err),
        }
    }

    async fn load(&self) -> Result<DictionarySnapshot> {
        let mut response = self.authorize(self.client.get(&self.url))?.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.protocol_error(status));
        }

        let mut parser = SnapshotParser::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| DictError::Load(format!("Body of {} interrupted: {}", self.url, e)))?
        {
            parser.feed(&chunk);
        }

        Ok(parser.finish())
    }

    fn name(&self) -> String {
        format!("http:{}", self.url)
    }
}

fn last_header(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get_all(name)
        .iter()
        .last()
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Builder for constructing an `HttpSource`.
pub struct HttpSourceBuilder {
    url: Option<String>,
    auth: HttpAuth,
    timeouts: Timeouts,
}

impl HttpSourceBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            url: None,
            auth: HttpAuth::None,
            timeouts: Timeouts::default(),
        }
    }

    /// Set the URL of the dictionary resource.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set Bearer token authentication.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth = HttpAuth::Bearer(token.into());
        self
    }

    /// Set Basic authentication.
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.auth = HttpAuth::Basic(username.into(), password.into());
        self
    }

    /// Set the authentication method directly.
    pub fn with_auth(mut self, auth: HttpAuth) -> Self {
        self.auth = auth;
        self
    }

    /// Set the connection timeout.
    ///
    /// Default is 10 seconds.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.connect = timeout;
        self
    }

    /// Set the overall request timeout, body included.
    ///
    /// Default is 15 seconds.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.read = timeout;
        self
    }

    /// Set both timeouts at once.
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Build the HTTP source.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No URL is provided
    /// - The HTTP client cannot be constructed
    pub fn build(self) -> Result<HttpSource> {
        let url = self.url.ok_or_else(|| {
            DictError::Configuration("URL is required for HttpSource".to_string())
        })?;

        let client = Client::builder()
            .connect_timeout(self.timeouts.connect)
            .timeout(self.timeouts.read)
            .build()
            .map_err(|e| {
                DictError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(HttpSource {
            url,
            client,
            auth: self.auth,
        })
    }
}

impl Default for HttpSourceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
