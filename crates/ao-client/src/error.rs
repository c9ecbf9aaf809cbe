//! Error taxonomy for AO operations.
//!
//! Callers need to tell apart three situations, each with its own remedy:
//!
//! - the request was never attempted ([`SignerError`], [`BuildError`]),
//! - the service was unreachable or misbehaved ([`TransportError`], [`ParseError`]),
//! - the request was evaluated and rejected ([`AoError::Computation`]).

use thiserror::Error;

use crate::result::ComputeResult;

/// Top-level error returned by every [`AoClient`](crate::AoClient) operation.
#[derive(Debug, Error)]
pub enum AoError {
    #[error("signer error: {0}")]
    Signer(#[from] SignerError),

    #[error("build error: {0}")]
    Build(#[from] BuildError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The CU answered with a success status but reported an evaluation error
    /// in the body. The decoded result is kept for diagnostics.
    #[error("computation error: {message}")]
    Computation {
        message: String,
        result: Box<ComputeResult>,
    },

    /// Client construction failed (bad base URL, unreadable key file, ...).
    #[error("configuration error: {0}")]
    Config(String),
}

/// Coarse classification of an [`AoError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Signer,
    Build,
    Transport,
    Parse,
    Computation,
    Config,
}

impl AoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AoError::Signer(_) => ErrorKind::Signer,
            AoError::Build(_) => ErrorKind::Build,
            AoError::Transport(_) => ErrorKind::Transport,
            AoError::Parse(_) => ErrorKind::Parse,
            AoError::Computation { .. } => ErrorKind::Computation,
            AoError::Config(_) => ErrorKind::Config,
        }
    }

    /// Whether the request left the client at all.
    pub fn was_attempted(&self) -> bool {
        !matches!(
            self.kind(),
            ErrorKind::Signer | ErrorKind::Build | ErrorKind::Config
        )
    }

    /// Transport failures are the only kind a caller may reasonably retry.
    /// Retrying a write is the caller's decision: it creates a new item.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    /// The evaluation error reported by the CU, if any.
    pub fn computation_message(&self) -> Option<&str> {
        match self {
            AoError::Computation { message, .. } => Some(message),
            _ => None,
        }
    }

    pub(crate) fn computation(result: ComputeResult) -> Self {
        AoError::Computation {
            message: result.error.clone(),
            result: Box::new(result),
        }
    }
}

/// Signing capability missing or refusing the payload.
#[derive(Debug, Error)]
pub enum SignerError {
    #[error("no signer configured")]
    Missing,

    #[error("signer rejected payload: {0}")]
    Rejected(String),

    #[error("signer returned {actual} {field} bytes, expected {expected}")]
    BadLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid key material: {0}")]
    Key(String),
}

/// A field required by the requested operation is missing or malformed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("target process id is required")]
    MissingTarget,

    #[error("module id is required")]
    MissingModule,

    #[error("anchor must be exactly 32 bytes, got {0}")]
    InvalidAnchor(usize),

    #[error("too many tags: {0} (max {max})", max = crate::tag::MAX_TAGS)]
    TooManyTags(usize),

    #[error("tag at position {0} has an empty name")]
    EmptyTagName(usize),

    #[error("tag at position {0} has an empty value")]
    EmptyTagValue(usize),

    #[error("tag name at position {0} exceeds {max} bytes", max = crate::tag::MAX_TAG_NAME_BYTES)]
    TagNameTooLong(usize),

    #[error("tag value at position {0} exceeds {max} bytes", max = crate::tag::MAX_TAG_VALUE_BYTES)]
    TagValueTooLong(usize),
}

/// Network failure or non-success HTTP status.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("unexpected HTTP status {status}")]
    Status { status: u16 },

    #[error("request timed out")]
    Timeout,

    #[error("request cancelled")]
    Cancelled,

    #[error("network error: {0}")]
    Network(reqwest::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Network(err)
        }
    }
}

impl From<reqwest::Error> for AoError {
    fn from(err: reqwest::Error) -> Self {
        AoError::Transport(err.into())
    }
}

/// Success body that is not the expected JSON.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing field `{0}`")]
    MissingField(&'static str),
}

/// Result type for AO operations.
pub type AoResult<T> = Result<T, AoError>;
