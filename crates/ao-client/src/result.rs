//! Response interpretation.
//!
//! The CU reports evaluation failures in the `Error` field of a 200 body, so
//! a result goes through three gates in order: HTTP status, JSON decoding,
//! then the embedded error string.

use reqwest::{Response, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{AoError, AoResult, ParseError, TransportError};

/// Outcome of evaluating a message on the CU.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ComputeResult {
    #[serde(deserialize_with = "null_as_default")]
    pub messages: Vec<Value>,
    #[serde(deserialize_with = "null_as_default")]
    pub spawns: Vec<Value>,
    #[serde(deserialize_with = "null_as_default")]
    pub outputs: Vec<Value>,
    /// Empty means the evaluation succeeded.
    #[serde(deserialize_with = "null_as_default")]
    pub error: String,
    #[serde(deserialize_with = "null_as_default")]
    pub gas_used: u64,
}

impl ComputeResult {
    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
struct WriteResponse {
    id: Option<String>,
}

/// Fail with the status code on anything but 2xx.
pub fn ensure_success(status: StatusCode) -> Result<(), TransportError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(TransportError::Status {
            status: status.as_u16(),
        })
    }
}

/// Decode a CU body and apply the embedded-error rule.
pub fn decode_result(body: &[u8]) -> AoResult<ComputeResult> {
    let result: ComputeResult = serde_json::from_slice(body).map_err(ParseError::from)?;
    if result.is_error() {
        tracing::warn!(error = %result.error, gas_used = result.gas_used, "CU reported computation error");
        return Err(AoError::computation(result));
    }
    Ok(result)
}

/// Decode the MU `{"id": ...}` acknowledgement.
pub fn decode_write_id(body: &[u8]) -> AoResult<String> {
    let response: WriteResponse = serde_json::from_slice(body).map_err(ParseError::from)?;
    match response.id {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(ParseError::MissingField("id").into()),
    }
}

/// Body of a successful response. Non-2xx bodies are never read.
pub(crate) async fn success_body(response: Response) -> AoResult<Vec<u8>> {
    let status = response.status();
    if let Err(err) = ensure_success(status) {
        tracing::warn!(status = status.as_u16(), url = %response.url(), "request failed");
        return Err(err.into());
    }
    Ok(response.bytes().await?.to_vec())
}
