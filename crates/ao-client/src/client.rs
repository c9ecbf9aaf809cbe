//! AO client facade: the four top-level operations.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::AoConfig;
use crate::cu::CuClient;
use crate::data_item::{DataItem, UnsignedDataItem};
use crate::error::{AoError, AoResult, BuildError, SignerError, TransportError};
use crate::message::Message;
use crate::mu::MuClient;
use crate::result::ComputeResult;
use crate::signer::Signer;
use crate::tag::{self, Tag};

/// Client for the AO Messenger and Compute Units.
///
/// Cheap to clone; clones share the HTTP connection pool and signer.
#[derive(Clone)]
pub struct AoClient {
    mu: MuClient,
    cu: CuClient,
    signer: Option<Arc<dyn Signer>>,
    scheduler: String,
    sdk: String,
    cancel: Option<CancellationToken>,
}

impl std::fmt::Debug for AoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AoClient")
            .field("mu", self.mu.base_url())
            .field("cu", self.cu.base_url())
            .field("signer", &self.signer.is_some())
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

/// Builder for [`AoClient`].
#[derive(Default)]
pub struct AoClientBuilder {
    config: AoConfig,
    signer: Option<Arc<dyn Signer>>,
    http: Option<Client>,
}

impl AoClientBuilder {
    pub fn config(mut self, config: AoConfig) -> Self {
        self.config = config;
        self
    }

    pub fn mu_url(mut self, url: impl Into<String>) -> Self {
        self.config.mu_url = url.into();
        self
    }

    pub fn cu_url(mut self, url: impl Into<String>) -> Self {
        self.config.cu_url = url.into();
        self
    }

    pub fn signer(mut self, signer: impl Signer + 'static) -> Self {
        self.signer = Some(Arc::new(signer));
        self
    }

    pub fn shared_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Use an existing HTTP client instead of building one.
    pub fn http_client(mut self, http: Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn build(self) -> AoResult<AoClient> {
        let http = match self.http {
            Some(http) => http,
            None => Client::builder()
                .build()
                .map_err(|e| AoError::Config(format!("http client: {}", e)))?,
        };
        let timeout = self.config.request_timeout();
        let mu = MuClient::new(http.clone(), parse_base(&self.config.mu_url)?, timeout);
        let cu = CuClient::new(http, parse_base(&self.config.cu_url)?, timeout);

        Ok(AoClient {
            mu,
            cu,
            signer: self.signer,
            scheduler: self.config.scheduler,
            sdk: self.config.sdk,
            cancel: None,
        })
    }
}

fn parse_base(raw: &str) -> AoResult<Url> {
    let url = Url::parse(raw.trim_end_matches('/'))
        .map_err(|e| AoError::Config(format!("invalid base url {:?}: {}", raw, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AoError::Config(format!(
            "unsupported scheme in base url {:?}",
            raw
        )));
    }
    Ok(url)
}

impl AoClient {
    pub fn builder() -> AoClientBuilder {
        AoClientBuilder::default()
    }

    /// Client from configuration, with an optional signer.
    pub fn from_config(config: AoConfig, signer: Option<Arc<dyn Signer>>) -> AoResult<Self> {
        let mut builder = Self::builder().config(config);
        builder.signer = signer;
        builder.build()
    }

    pub fn mu(&self) -> &MuClient {
        &self.mu
    }

    pub fn cu(&self) -> &CuClient {
        &self.cu
    }

    pub fn has_signer(&self) -> bool {
        self.signer.is_some()
    }

    /// A copy whose requests give up after `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let mut client = self.clone();
        client.mu = client.mu.with_timeout(timeout);
        client.cu = client.cu.with_timeout(timeout);
        client
    }

    /// A copy whose in-flight requests abort when `token` is cancelled.
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        let mut client = self.clone();
        client.cancel = Some(token);
        client
    }

    /// Spawn a process running `module`. Returns the new process id.
    pub async fn spawn(
        &self,
        module: &str,
        data: Option<Vec<u8>>,
        tags: Option<Vec<Tag>>,
    ) -> AoResult<String> {
        if module.is_empty() {
            return Err(BuildError::MissingModule.into());
        }
        let tags = tag::spawn_tags(module, &self.scheduler, &self.sdk, tags);
        let unsigned = UnsignedDataItem::builder()
            .tags(tags)
            .data(data.unwrap_or_default())
            .build()?;
        let item = self.sign(unsigned).await?;

        tracing::debug!(module, item_id = %item.id(), "Spawning process");
        self.guarded(self.mu.submit(&item)).await
    }

    /// Send `data` to process `target`. Returns the message id.
    pub async fn send_message(
        &self,
        target: &str,
        data: &str,
        tags: Option<Vec<Tag>>,
        anchor: Option<&str>,
    ) -> AoResult<String> {
        if target.is_empty() {
            return Err(BuildError::MissingTarget.into());
        }
        let tags = tag::message_tags(&self.sdk, tags);
        let mut builder = UnsignedDataItem::builder()
            .target(target)
            .tags(tags)
            .data(data.as_bytes().to_vec());
        if let Some(anchor) = anchor {
            builder = builder.anchor(anchor);
        }
        let item = self.sign(builder.build()?).await?;

        tracing::debug!(process = target, item_id = %item.id(), "Sending message");
        self.guarded(self.mu.submit(&item)).await
    }

    /// Load the result of `message` evaluated by `process`.
    pub async fn load_result(&self, process: &str, message: &str) -> AoResult<ComputeResult> {
        self.guarded(self.cu.result(process, message)).await
    }

    /// Evaluate `message` without committing it.
    pub async fn dry_run(&self, message: &Message) -> AoResult<ComputeResult> {
        self.guarded(self.cu.dry_run(message)).await
    }

    async fn sign(&self, item: UnsignedDataItem) -> AoResult<DataItem> {
        let signer = self.signer.as_deref().ok_or(SignerError::Missing)?;
        item.sign(signer).await.map_err(|err| {
            tracing::debug!(error = %err, "Signing failed");
            AoError::from(err)
        })
    }

    async fn guarded<T>(&self, request: impl Future<Output = AoResult<T>>) -> AoResult<T> {
        match &self.cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(TransportError::Cancelled.into()),
                result = request => result,
            },
            None => request.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::Ed25519Signer;

    #[test]
    fn builder_trims_trailing_slash() {
        let client = AoClient::builder()
            .mu_url("http://localhost:8080/")
            .cu_url("http://localhost:6363")
            .build()
            .unwrap();
        assert_eq!(client.mu().base_url().as_str(), "http://localhost:8080/");
        assert_eq!(client.cu().base_url().as_str(), "http://localhost:6363/");
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        let err = AoClient::builder().mu_url("not a url").build().unwrap_err();
        assert!(matches!(err, AoError::Config(_)));
        let err = AoClient::builder().cu_url("ftp://cu").build().unwrap_err();
        assert!(matches!(err, AoError::Config(_)));
    }

    #[test]
    fn signer_is_optional_at_construction() {
        let client = AoClient::builder().build().unwrap();
        assert!(!client.has_signer());
        let client = AoClient::builder()
            .signer(Ed25519Signer::generate())
            .build()
            .unwrap();
        assert!(client.has_signer());
    }

    #[tokio::test]
    async fn spawn_without_module_is_build_error() {
        let client = AoClient::builder()
            .signer(Ed25519Signer::generate())
            .build()
            .unwrap();
        let err = client.spawn("", None, None).await.unwrap_err();
        assert!(matches!(err, AoError::Build(BuildError::MissingModule)));
    }
}
