use crate::error::{ImageGenError, Result};
use async_trait::async_trait;
use reqwest::Client;

/// Status and raw body of an HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Outbound JSON POST. The seam between the clients and the network.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpResponse>;
}

/// [`Transport`] backed by `reqwest`. No timeout is configured.
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpResponse> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| ImageGenError::NetworkError(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    enum Outcome {
        Respond(HttpResponse),
        Fail(String),
    }

    /// Replays a fixed outcome and records what was sent.
    pub struct StubTransport {
        outcome: Outcome,
        calls: AtomicUsize,
        last_request: Mutex<Option<(String, serde_json::Value)>>,
    }

    impl StubTransport {
        pub fn responding(status: u16, body: &str) -> Self {
            Self::with_outcome(Outcome::Respond(HttpResponse {
                status,
                body: body.to_string(),
            }))
        }

        pub fn failing(message: &str) -> Self {
            Self::with_outcome(Outcome::Fail(message.to_string()))
        }

        fn with_outcome(outcome: Outcome) -> Self {
            Self {
                outcome,
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn last_request(&self) -> Option<(String, serde_json::Value)> {
            self.last_request.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some((url.to_string(), body.clone()));

            match &self.outcome {
                Outcome::Respond(response) => Ok(response.clone()),
                Outcome::Fail(message) => Err(ImageGenError::NetworkError(message.clone())),
            }
        }
    }
}
