use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::RemoteConfig;
use crate::domain::errors::RemoteCallError;
use crate::ports::RemoteCall;

/// Remote call client speaking to the peer's RPC gateway over HTTP.
///
/// Each call is `POST {base_url}/rpc/{service}/{method}` with the encoded
/// request as an octet-stream body; the response body is the encoded reply.
pub struct HttpRemoteCall {
    client: reqwest::Client,
    base_url: String,
    closed: AtomicBool,
}

impl HttpRemoteCall {
    pub fn new(config: &RemoteConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            closed: AtomicBool::new(false),
        }
    }

    fn endpoint(&self, service: &str, method: &str) -> String {
        format!("{}/rpc/{}/{}", self.base_url, service, method)
    }
}

fn classify(call: &str, error: reqwest::Error) -> RemoteCallError {
    if error.is_timeout() {
        RemoteCallError::Timeout {
            call: call.to_string(),
        }
    } else {
        RemoteCallError::Transport {
            call: call.to_string(),
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl RemoteCall for HttpRemoteCall {
    async fn query(
        &self,
        service: &str,
        method: &str,
        request: Vec<u8>,
    ) -> Result<Vec<u8>, RemoteCallError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(RemoteCallError::Disconnected);
        }

        let call = format!("{}.{}", service, method);
        let response = self
            .client
            .post(self.endpoint(service, method))
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(request)
            .send()
            .await
            .map_err(|e| classify(&call, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteCallError::Status {
                call,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| classify(&call, e))?;
        tracing::trace!(call = %call, bytes = body.len(), "Remote call completed");
        Ok(body.to_vec())
    }

    async fn disconnect(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::info!(base_url = %self.base_url, "Remote call client released");
        }
    }
}
