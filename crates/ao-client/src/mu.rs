//! Messenger Unit write client.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use url::Url;

use crate::data_item::DataItem;
use crate::error::AoResult;
use crate::result::{decode_write_id, success_body};

/// Submits signed items to the MU.
#[derive(Clone, Debug)]
pub struct MuClient {
    http: Client,
    base: Url,
    timeout: Duration,
}

impl MuClient {
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

    /// `POST /` with the binary item; returns the id the MU assigned.
    pub async fn submit(&self, item: &DataItem) -> AoResult<String> {
        let body = item.to_bytes();
        tracing::debug!(
            url = %self.base,
            item_id = %item.id(),
            bytes = body.len(),
            "Submitting data item to MU"
        );

        let response = self
            .http
            .post(self.base.clone())
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(ACCEPT, "application/json")
            .timeout(self.timeout)
            .body(body)
            .send()
            .await?;

        let body = success_body(response).await?;
        let id = decode_write_id(&body)?;
        tracing::debug!(id = %id, "MU accepted data item");
        Ok(id)
    }
}
