use crate::errors::{collaborator_error, DialError, ErrorKind};
use crate::locator::requests::Request;
use reqwest::Client as ReqwestClient;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct Client {
    client: ReqwestClient,
}

impl Client {
    pub fn new() -> Self {
        Client { client: ReqwestClient::new() }
    }

    /// Send `request` and decode its JSON body.
    ///
    /// The body is decoded whatever the status: error answers such as a
    /// rate limit still carry JSON, and one that does not decode is a
    /// [`ErrorKind::Decode`] failure.
    pub async fn send<R: Request>(
        &self,
        request: R,
    ) -> Result<R::Response, DialError> {
        let url = request.url();
        let context = format!("{} {}", R::METHOD, url);

        let response = self
            .client
            .request(R::METHOD, &*url)
            .headers(request.headers())
            .send()
            .await
            .map_err(|e| collaborator_error(Box::new(e), &context))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| collaborator_error(Box::new(e), &context))?;

        serde_json::from_str::<R::Response>(&text).map_err(|e| {
            DialError::new(
                ErrorKind::Decode,
                format!("{} ({}): {}", context, status, e),
            )
            .with_source(e)
        })
    }

    /// Time the round trip of `request`, discarding the body.
    pub async fn probe<R: Request>(
        &self,
        request: R,
    ) -> Result<Duration, DialError> {
        let url = request.url();
        let context = format!("{} {}", R::METHOD, url);
        let start = Instant::now();

        self.client
            .request(R::METHOD, &*url)
            .headers(request.headers())
            .send()
            .await
            .map_err(|e| collaborator_error(Box::new(e), &context))?;

        Ok(start.elapsed())
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}
