//! Compute Unit read client.

use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::error::{AoResult, TransportError};
use crate::message::{DryRunRequest, Message};
use crate::result::{decode_result, success_body, ComputeResult};

/// Reads results and runs dry runs against the CU.
#[derive(Clone, Debug)]
pub struct CuClient {
    http: Client,
    base: Url,
    timeout: Duration,
}

impl CuClient {
    pub fn new(http: Client, base: Url, timeout: Duration) -> Self {
        Self {
            http,
            base,
            timeout,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub(crate) fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self, segments: &[&str], process: &str) -> Result<Url, TransportError> {
        let mut endpoint = self.base.clone();
        endpoint
            .path_segments_mut()
            .map_err(|_| TransportError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        endpoint
            .query_pairs_mut()
            .append_pair("process-id", process);
        Ok(endpoint)
    }

    /// `<base>/result/<message>?process-id=<process>`
    pub fn result_url(&self, process: &str, message: &str) -> Result<Url, TransportError> {
        self.endpoint(&["result", message], process)
    }

    /// `<base>/dry-run?process-id=<target>`
    pub fn dry_run_url(&self, target: &str) -> Result<Url, TransportError> {
        self.endpoint(&["dry-run"], target)
    }

    /// Load the recorded result of `message` on `process`.
    pub async fn result(&self, process: &str, message: &str) -> AoResult<ComputeResult> {
        let url = self.result_url(process, message)?;
        tracing::debug!(url = %url, process, message, "Loading result from CU");

        let response = self.http.get(url).timeout(self.timeout).send().await?;
        let body = success_body(response).await?;
        decode_result(&body)
    }

    /// Evaluate `message` against its target's current state without persisting it.
    pub async fn dry_run(&self, message: &Message) -> AoResult<ComputeResult> {
        let url = self.dry_run_url(&message.target)?;
        tracing::debug!(url = %url, target = %message.target, "Dry run on CU");

        let response = self
            .http
            .post(url)
            .timeout(self.timeout)
            .json(&DryRunRequest::new(message))
            .send()
            .await?;
        let body = success_body(response).await?;
        decode_result(&body)
    }
}
