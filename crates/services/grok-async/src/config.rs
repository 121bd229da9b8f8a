use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

/// Default xAI API base URL
pub const XAI_DEFAULT_BASE: &str = "https://api.x.ai/v1";
/// Default model used when neither the caller nor the environment picks one
pub const DEFAULT_MODEL: &str = "grok-4-fast";
/// Default number of posts/trends requested by the prompt builders
pub const DEFAULT_LIMIT: u32 = 20;

/// Environment variable holding the API key
pub const ENV_API_KEY: &str = "XAI_API_KEY";
/// Environment variable overriding the API base URL
pub const ENV_BASE_URL: &str = "XAI_BASE_URL";
/// Environment variable overriding the default model
pub const ENV_MODEL: &str = "GROK_MODEL";
/// Environment variable overriding the default result limit
pub const ENV_DEFAULT_LIMIT: &str = "GROK_DEFAULT_LIMIT";

/// Configuration for the Grok client
///
/// Debug output automatically redacts `api_key` via [`SecretString`].
#[derive(Clone, Debug)]
pub struct GrokConfig {
    api_base: String,
    api_key: Option<SecretString>,
    model: String,
    default_limit: u32,
}

fn env_trimmed(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Default for GrokConfig {
    fn default() -> Self {
        let api_key = env_trimmed(ENV_API_KEY).map(SecretString::from);
        let api_base = env_trimmed(ENV_BASE_URL).unwrap_or_else(|| XAI_DEFAULT_BASE.into());
        let model = env_trimmed(ENV_MODEL).unwrap_or_else(|| DEFAULT_MODEL.into());
        let default_limit = env_trimmed(ENV_DEFAULT_LIMIT)
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_LIMIT);

        Self {
            api_base,
            api_key,
            model,
            default_limit,
        }
    }
}

impl GrokConfig {
    /// Creates a new configuration with default settings
    ///
    /// Attempts to read from environment variables:
    /// - `XAI_API_KEY` for API key authentication
    /// - `XAI_BASE_URL` for custom API base URL (defaults to `https://api.x.ai/v1`)
    /// - `GROK_MODEL` for the default model
    /// - `GROK_DEFAULT_LIMIT` for the default result limit
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API base URL
    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Sets the API key
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(key.into()));
        self
    }

    /// Sets the default model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the default result limit (zero is ignored)
    #[must_use]
    pub fn with_default_limit(mut self, limit: u32) -> Self {
        if limit > 0 {
            self.default_limit = limit;
        }
        self
    }

    /// Returns the configured API base URL
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

/// Configuration trait for the Grok client
///
/// Implement this trait to provide custom authentication and API configuration.
pub trait Config: Send + Sync {
    /// Returns HTTP headers to include in requests
    ///
    /// # Errors
    ///
    /// Returns an error if header values contain invalid characters.
    fn headers(&self) -> Result<HeaderMap, crate::error::GrokError>;

    /// Constructs the full URL for an API endpoint
    fn url(&self, path: &str) -> String;

    /// Model used when a request does not name one
    fn model(&self) -> &str;

    /// Result limit used when a request does not name one
    fn default_limit(&self) -> u32;

    /// Validates that authentication credentials are present.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication is not properly configured.
    fn validate_auth(&self) -> Result<(), crate::error::GrokError>;
}

impl Config for GrokConfig {
    fn headers(&self) -> Result<HeaderMap, crate::error::GrokError> {
        use crate::error::GrokError;

        let mut h = HeaderMap::new();
        h.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(secret) = &self.api_key {
            let key = secret.expose_secret().trim();
            if !key.is_empty() {
                let mut value = HeaderValue::from_str(&format!("Bearer {key}"))
                    .map_err(|_| GrokError::Config("Invalid authorization value".into()))?;
                value.set_sensitive(true);
                h.insert(AUTHORIZATION, value);
            }
        }

        Ok(h)
    }

    fn url(&self, path: &str) -> String {
        let base = self.api_base.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn default_limit(&self) -> u32 {
        self.default_limit
    }

    fn validate_auth(&self) -> Result<(), crate::error::GrokError> {
        match &self.api_key {
            Some(secret) if !secret.expose_secret().trim().is_empty() => Ok(()),
            _ => Err(crate::error::GrokError::Config(
                "Missing xAI credentials: set XAI_API_KEY environment variable".into(),
            )),
        }
    }
}
