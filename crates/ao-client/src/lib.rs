//! AO client: protocol layer for the AO compute network.
//!
//! Two services sit behind this crate:
//!
//! - the **Messenger Unit (MU)** accepts signed ANS-104 data items: spawning a
//!   process ([`AoClient::spawn`]) and sending it messages
//!   ([`AoClient::send_message`]);
//! - the **Compute Unit (CU)** serves recorded results
//!   ([`AoClient::load_result`]) and dry-run evaluation ([`AoClient::dry_run`]).
//!
//! The CU reports evaluation failures inside a 200 response. Those surface
//! as [`AoError::Computation`], never as a transport error, so callers can
//! tell "unreachable" from "rejected".
//!
//! Signing is delegated to a [`Signer`] injected at construction.
//!
//! ```no_run
//! # async fn demo() -> ao_client::AoResult<()> {
//! use ao_client::{AoClient, Ed25519Signer, Tag};
//!
//! let client = AoClient::builder()
//!     .signer(Ed25519Signer::generate())
//!     .build()?;
//! let process = client.spawn("module-id", None, None).await?;
//! let message = client
//!     .send_message(&process, "ping", Some(vec![Tag::new("Action", "Ping")]), None)
//!     .await?;
//! let result = client.load_result(&process, &message).await?;
//! println!("gas used: {}", result.gas_used);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod cu;
pub mod data_item;
pub mod deep_hash;
pub mod encoding;
pub mod error;
pub mod message;
pub mod mu;
pub mod result;
pub mod signer;
pub mod tag;

pub use client::{AoClient, AoClientBuilder};
pub use config::AoConfig;
pub use data_item::{DataItem, DataItemBuilder, UnsignedDataItem};
pub use error::{AoError, AoResult, BuildError, ErrorKind, ParseError, SignerError, TransportError};
pub use message::Message;
pub use result::ComputeResult;
pub use signer::{Ed25519Signer, SignatureType, SignedPayload, Signer};
pub use tag::{ItemType, Tag, TagSet};

/// Re-exported so callers can build cancellation tokens without a direct dependency.
pub use tokio_util::sync::CancellationToken;
