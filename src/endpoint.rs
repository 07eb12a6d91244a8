//! Feed endpoint resolution.
//!
//! An explicitly configured `ws(s)://` URL always wins. Without one, the
//! feed address is derived from the application's `http(s)` origin: the
//! scheme maps to `ws`/`wss` (secure origins get the secure socket scheme),
//! the host is kept, and the port comes from the origin when it names one
//! or from a configurable default otherwise.

use url::Url;

use crate::error::{ComandaLinkError, Result};

/// Default feed port used when the origin does not name one.
pub const DEFAULT_FEED_PORT: u16 = 8080;

/// Where the order feed client should connect.
///
/// # Example
///
/// ```rust
/// use comanda_link::FeedEndpoint;
///
/// // Explicit URL takes precedence over everything else.
/// let endpoint = FeedEndpoint::url("wss://feed.example.com:9000");
/// assert_eq!(endpoint.resolve().unwrap(), "wss://feed.example.com:9000");
///
/// // Derived from a secure origin: wss + default port.
/// let endpoint = FeedEndpoint::from_origin("https://pos.example.com");
/// assert_eq!(endpoint.resolve().unwrap(), "wss://pos.example.com:8080");
/// ```
#[derive(Debug, Clone)]
pub struct FeedEndpoint {
    url: Option<String>,
    origin: Option<String>,
    default_port: u16,
}

impl Default for FeedEndpoint {
    fn default() -> Self {
        Self {
            url: None,
            origin: None,
            default_port: DEFAULT_FEED_PORT,
        }
    }
}

impl FeedEndpoint {
    /// Point at an explicit `ws://` or `wss://` URL.
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            origin: None,
            default_port: DEFAULT_FEED_PORT,
        }
    }

    /// Derive the feed address from an `http(s)` origin.
    pub fn from_origin(origin: impl Into<String>) -> Self {
        Self {
            url: None,
            origin: Some(origin.into()),
            default_port: DEFAULT_FEED_PORT,
        }
    }

    /// Set an explicit URL, keeping any origin as a downgrade guard.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the origin used for derivation and downgrade checks.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Override the port used when the origin does not name one.
    pub fn with_default_port(mut self, port: u16) -> Self {
        self.default_port = port;
        self
    }

    /// Resolve the final feed URL.
    pub fn resolve(&self) -> Result<String> {
        if let Some(raw) = &self.url {
            let parsed = Url::parse(raw.trim()).map_err(|e| {
                ComandaLinkError::ConfigurationError(format!(
                    "Invalid feed URL '{}': {}",
                    raw, e
                ))
            })?;
            validate_feed_url(&parsed, "feed URL")?;

            if let Some(origin) = &self.origin {
                if origin.trim_start().starts_with("https") && parsed.scheme() == "ws" {
                    return Err(ComandaLinkError::ConfigurationError(
                        "Refusing insecure ws:// feed URL when the origin uses https://"
                            .to_string(),
                    ));
                }
            }
            return Ok(parsed.to_string().trim_end_matches('/').to_string());
        }

        let origin = self.origin.as_deref().ok_or_else(|| {
            ComandaLinkError::ConfigurationError(
                "No feed endpoint configured: set a URL or an origin".to_string(),
            )
        })?;
        let parsed = Url::parse(origin.trim()).map_err(|e| {
            ComandaLinkError::ConfigurationError(format!("Invalid origin '{}': {}", origin, e))
        })?;

        let scheme = match parsed.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(ComandaLinkError::ConfigurationError(format!(
                    "Unsupported origin scheme '{}'; expected http(s) or ws(s)",
                    other
                )));
            },
        };
        let host = parsed.host_str().ok_or_else(|| {
            ComandaLinkError::ConfigurationError("Origin must include a host".to_string())
        })?;
        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(ComandaLinkError::ConfigurationError(
                "Origin must not include username/password credentials".to_string(),
            ));
        }
        let port = parsed.port().unwrap_or(self.default_port);

        Ok(format!("{}://{}:{}", scheme, host, port))
    }
}

fn validate_feed_url(url: &Url, context: &str) -> Result<()> {
    match url.scheme() {
        "ws" | "wss" => {},
        other => {
            return Err(ComandaLinkError::ConfigurationError(format!(
                "{} must use ws:// or wss:// (found '{}')",
                context, other
            )));
        },
    }
    if url.host_str().is_none() {
        return Err(ComandaLinkError::ConfigurationError(format!(
            "{} must include a host",
            context
        )));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(ComandaLinkError::ConfigurationError(format!(
            "{} must not include username/password credentials",
            context
        )));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ComandaLinkError::ConfigurationError(format!(
            "{} must not include query parameters or fragments",
            context
        )));
    }
    Ok(())
}
