use std::time::Duration;

use crate::{
    config::{Config, GrokConfig},
    error::{GrokError, deserialize_api_error},
    normalize,
    retry::{self, RetryPolicy},
    types::{AgentRequest, ChatResponse},
    validation::Validate,
};

/// Path of the agent responses endpoint, relative to the API base
pub const RESPONSES_PATH: &str = "/responses";
/// Per-attempt timeout for plain requests
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Per-attempt timeout when the request enables live search
pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(120);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// xAI Grok API client
///
/// The client is generic over a [`Config`] implementation that provides authentication
/// and API configuration. It is cheap to clone and safe to share between tasks.
#[derive(Debug, Clone)]
pub struct Client<C: Config = GrokConfig> {
    http: reqwest::Client,
    config: C,
    retry: RetryPolicy,
}

impl Client<GrokConfig> {
    /// Creates a client configured from the environment
    ///
    /// Reads `XAI_API_KEY`, `XAI_BASE_URL`, `GROK_MODEL` and `GROK_DEFAULT_LIMIT`.
    ///
    /// # Errors
    ///
    /// Returns [`GrokError::Config`] when no API key is available.
    pub fn from_env() -> Result<Self, GrokError> {
        Self::new(GrokConfig::new())
    }
}

impl<C: Config> Client<C> {
    /// Creates a new client with the given configuration.
    ///
    /// Credentials are checked up front so a misconfigured client never
    /// reaches the network.
    ///
    /// # Errors
    ///
    /// Returns [`GrokError::Config`] if the API key is missing or blank, or if
    /// the HTTP client cannot be built.
    pub fn new(config: C) -> Result<Self, GrokError> {
        config.validate_auth()?;
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| GrokError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            config,
            retry: RetryPolicy::default(),
        })
    }

    /// Replaces the HTTP client with a custom one
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Replaces the retry policy
    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns a reference to the client's configuration
    #[must_use]
    pub const fn config(&self) -> &C {
        &self.config
    }

    /// Returns the active retry policy
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub(crate) async fn post_agent(&self, req: &AgentRequest) -> Result<ChatResponse, GrokError> {
        req.validate()?;

        let url = self.config.url(RESPONSES_PATH);
        let headers = self.config.headers()?;
        let timeout = if req.uses_search() {
            SEARCH_TIMEOUT
        } else {
            DEFAULT_TIMEOUT
        };

        tracing::debug!(
            model = %req.model,
            search = req.uses_search(),
            timeout_s = timeout.as_secs(),
            "POST {url}"
        );

        let bytes = retry::run_with_retry(self.retry, || {
            let request = self
                .http
                .post(&url)
                .headers(headers.clone())
                .timeout(timeout)
                .json(req);
            Self::send_once(request)
        })
        .await?;

        normalize::decode_upstream(&bytes)
    }

    async fn send_once(request: reqwest::RequestBuilder) -> Result<bytes::Bytes, GrokError> {
        let response = request.send().await.map_err(GrokError::Reqwest)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(GrokError::Reqwest)?;

        if status.is_success() {
            return Ok(bytes);
        }

        Err(deserialize_api_error(status, &bytes))
    }
}
