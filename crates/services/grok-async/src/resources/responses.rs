use crate::{
    client::Client,
    config::Config,
    error::GrokError,
    types::{AgentRequest, ChatResponse},
};

/// API resource for the `/responses` endpoint
pub struct Responses<'c, C: Config> {
    client: &'c Client<C>,
}

impl<'c, C: Config> Responses<'c, C> {
    /// Creates a new Responses resource
    #[must_use]
    pub const fn new(client: &'c Client<C>) -> Self {
        Self { client }
    }

    /// Sends an agent request and returns the normalized chat response
    ///
    /// The request is validated locally first; transient failures are retried
    /// according to the client's [`RetryPolicy`](crate::RetryPolicy).
    ///
    /// # Errors
    ///
    /// Returns an error if the request is invalid, the API returns an error,
    /// or the response cannot be normalized.
    pub async fn create(&self, req: AgentRequest) -> Result<ChatResponse, GrokError> {
        self.client.post_agent(&req).await
    }
}

impl<C: Config> crate::Client<C> {
    /// Returns the Responses API resource
    #[must_use]
    pub const fn responses(&self) -> Responses<'_, C> {
        Responses::new(self)
    }
}
