//! ANS-104 data items: build unsigned, sign once, encode for the MU.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};

use crate::deep_hash::{deep_hash, Chunk, DeepHash};
use crate::encoding::{b64url, b64url_decode, decode_tags, encode_tags, DecodeError, Reader};
use crate::error::{BuildError, SignerError};
use crate::signer::{SignatureType, Signer};
use crate::tag::{self, Tag};

/// An item that has passed validation but not been signed.
///
/// There is no way to encode this for the MU; it must go through
/// [`UnsignedDataItem::sign`] first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnsignedDataItem {
    target: Option<[u8; 32]>,
    anchor: Option<[u8; 32]>,
    tags: Vec<Tag>,
    data: Vec<u8>,
}

impl UnsignedDataItem {
    pub fn builder() -> DataItemBuilder {
        DataItemBuilder::default()
    }

    pub fn target(&self) -> Option<String> {
        display_target(self.target.as_ref(), &self.tags)
    }

    pub fn anchor(&self) -> Option<&[u8; 32]> {
        self.anchor.as_ref()
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The deep hash a signer with the given scheme and owner key signs.
    pub fn signing_hash(&self, signature_type: SignatureType, owner: &[u8]) -> DeepHash {
        signing_hash(
            signature_type,
            owner,
            self.target.as_ref(),
            self.anchor.as_ref(),
            &encode_tags(&self.tags),
            &self.data,
        )
    }

    /// Sign with `signer`, consuming the unsigned item.
    pub async fn sign(self, signer: &dyn Signer) -> Result<DataItem, SignerError> {
        let payload = signer.sign(&self).await?;
        payload.check_lengths()?;
        Ok(DataItem {
            id: item_id(&payload.signature),
            signature_type: payload.signature_type,
            signature: payload.signature,
            owner: payload.owner,
            target: self.target,
            anchor: self.anchor,
            tags: self.tags,
            data: self.data,
        })
    }
}

fn signing_hash(
    signature_type: SignatureType,
    owner: &[u8],
    target: Option<&[u8; 32]>,
    anchor: Option<&[u8; 32]>,
    tag_bytes: &[u8],
    data: &[u8],
) -> DeepHash {
    let sig_type = signature_type.code().to_string();
    deep_hash(&Chunk::List(vec![
        Chunk::Blob(b"dataitem"),
        Chunk::Blob(b"1"),
        Chunk::Blob(sig_type.as_bytes()),
        Chunk::Blob(owner),
        Chunk::Blob(target.map(|t| &t[..]).unwrap_or(&[])),
        Chunk::Blob(anchor.map(|a| &a[..]).unwrap_or(&[])),
        Chunk::Blob(tag_bytes),
        Chunk::Blob(data),
    ]))
}

/// The binary target when set, else the value of a `Target` tag.
fn display_target(target: Option<&[u8; 32]>, tags: &[Tag]) -> Option<String> {
    match target {
        Some(bytes) => Some(b64url(bytes)),
        None => tags
            .iter()
            .find(|t| t.name == tag::TARGET_TAG)
            .map(|t| t.value.clone()),
    }
}

/// Item id: base64url SHA-256 of the signature.
fn item_id(signature: &[u8]) -> String {
    b64url(&Sha256::digest(signature))
}

/// Validating builder for [`UnsignedDataItem`].
#[derive(Clone, Debug, Default)]
pub struct DataItemBuilder {
    target: Option<String>,
    anchor: Option<String>,
    tags: Vec<Tag>,
    data: Vec<u8>,
}

impl DataItemBuilder {
    /// Destination process id. An empty string is a missing target.
    ///
    /// A base64url id of 32 bytes fills the binary target field; any other
    /// identifier is appended as a `Target` tag after the given tags.
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Dedup/nonce token. An empty string means no anchor.
    pub fn anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }

    pub fn tags(mut self, tags: impl Into<Vec<Tag>>) -> Self {
        self.tags = tags.into();
        self
    }

    pub fn data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = data.into();
        self
    }

    pub fn build(self) -> Result<UnsignedDataItem, BuildError> {
        let mut tags = self.tags;
        let target = match self.target {
            None => None,
            Some(t) if t.is_empty() => return Err(BuildError::MissingTarget),
            Some(t) => match b64url_decode(&t).ok().and_then(|b| <[u8; 32]>::try_from(b).ok()) {
                Some(bytes) => Some(bytes),
                None => {
                    tags.push(Tag::new(tag::TARGET_TAG, t));
                    None
                }
            },
        };

        let anchor = match self.anchor {
            Some(a) if !a.is_empty() => {
                let len = a.len();
                let bytes: [u8; 32] = a
                    .into_bytes()
                    .try_into()
                    .map_err(|_| BuildError::InvalidAnchor(len))?;
                Some(bytes)
            }
            _ => None,
        };

        tag::validate(&tags)?;

        Ok(UnsignedDataItem {
            target,
            anchor,
            tags,
            data: self.data,
        })
    }
}

/// A signed item, ready for submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataItem {
    id: String,
    signature_type: SignatureType,
    signature: Vec<u8>,
    owner: Vec<u8>,
    target: Option<[u8; 32]>,
    anchor: Option<[u8; 32]>,
    tags: Vec<Tag>,
    data: Vec<u8>,
}

impl DataItem {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn signature_type(&self) -> SignatureType {
        self.signature_type
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// base64url owner public key.
    pub fn owner(&self) -> String {
        b64url(&self.owner)
    }

    pub fn target(&self) -> Option<String> {
        display_target(self.target.as_ref(), &self.tags)
    }

    pub fn anchor(&self) -> Option<&[u8; 32]> {
        self.anchor.as_ref()
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Value of the first tag named `name`.
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.value.as_str())
    }

    /// ANS-104 binary encoding.
    pub fn to_bytes(&self) -> Vec<u8> {
        let tag_bytes = encode_tags(&self.tags);
        let mut out = Vec::with_capacity(
            2 + self.signature.len()
                + self.owner.len()
                + 66
                + 16
                + tag_bytes.len()
                + self.data.len(),
        );
        out.extend_from_slice(&self.signature_type.code().to_le_bytes());
        out.extend_from_slice(&self.signature);
        out.extend_from_slice(&self.owner);
        for field in [&self.target, &self.anchor] {
            match field {
                Some(bytes) => {
                    out.push(1);
                    out.extend_from_slice(bytes);
                }
                None => out.push(0),
            }
        }
        out.extend_from_slice(&(self.tags.len() as u64).to_le_bytes());
        out.extend_from_slice(&(tag_bytes.len() as u64).to_le_bytes());
        out.extend_from_slice(&tag_bytes);
        out.extend_from_slice(&self.data);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = Reader::new(bytes);
        let code = reader.u16_le()?;
        let signature_type =
            SignatureType::from_code(code).ok_or(DecodeError::UnknownSignatureType(code))?;
        let signature = reader.take(signature_type.signature_len())?.to_vec();
        let owner = reader.take(signature_type.owner_len())?.to_vec();
        let target = read_optional_32(&mut reader)?;
        let anchor = read_optional_32(&mut reader)?;
        let tag_count = reader.u64_le()?;
        let tag_len = reader.u64_le()?;
        let tag_len = usize::try_from(tag_len).map_err(|_| DecodeError::VarintOverflow)?;
        let tags = decode_tags(reader.take(tag_len)?, tag_count)?;
        let data = reader.rest().to_vec();

        Ok(DataItem {
            id: item_id(&signature),
            signature_type,
            signature,
            owner,
            target,
            anchor,
            tags,
            data,
        })
    }

    /// Check the id and, for Ed25519 items, the signature over the deep hash.
    /// Other schemes can't be checked locally and report `false`.
    pub fn verify(&self) -> bool {
        if self.id != item_id(&self.signature) {
            return false;
        }
        if self.signature_type != SignatureType::Ed25519 {
            return false;
        }
        let Ok(owner) = <[u8; 32]>::try_from(self.owner.as_slice()) else {
            return false;
        };
        let Ok(key) = VerifyingKey::from_bytes(&owner) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(&self.signature) else {
            return false;
        };
        let message = signing_hash(
            self.signature_type,
            &self.owner,
            self.target.as_ref(),
            self.anchor.as_ref(),
            &encode_tags(&self.tags),
            &self.data,
        );
        key.verify(&message, &signature).is_ok()
    }
}

fn read_optional_32(reader: &mut Reader<'_>) -> Result<Option<[u8; 32]>, DecodeError> {
    match reader.u8()? {
        0 => Ok(None),
        1 => {
            let mut out = [0u8; 32];
            out.copy_from_slice(reader.take(32)?);
            Ok(Some(out))
        }
        flag => Err(DecodeError::InvalidFlag(flag)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::{Ed25519Signer, SignedPayload};
    use async_trait::async_trait;

    const PROCESS: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

    fn signer() -> Ed25519Signer {
        Ed25519Signer::from_secret_bytes([7u8; 32])
    }

    #[test]
    fn empty_target_is_missing() {
        let err = UnsignedDataItem::builder().target("").build().unwrap_err();
        assert_eq!(err, BuildError::MissingTarget);
    }

    #[test]
    fn id_target_fills_binary_field() {
        let item = UnsignedDataItem::builder().target(PROCESS).build().unwrap();
        assert_eq!(item.target().as_deref(), Some(PROCESS));
        assert!(item.tags().is_empty());
    }

    #[test]
    fn other_targets_travel_as_trailing_tag() {
        let item = UnsignedDataItem::builder()
            .target("testProcess")
            .tags(vec![Tag::new("Action", "Eval")])
            .build()
            .unwrap();
        assert_eq!(item.target().as_deref(), Some("testProcess"));
        assert_eq!(
            item.tags(),
            &[Tag::new("Action", "Eval"), Tag::new("Target", "testProcess")]
        );
    }

    #[tokio::test]
    async fn tagged_target_survives_encoding() {
        let item = UnsignedDataItem::builder()
            .target("testProcess")
            .build()
            .unwrap()
            .sign(&signer())
            .await
            .unwrap();

        let bytes = item.to_bytes();
        // signature type, signature, owner, then the target flag
        assert_eq!(bytes[2 + 64 + 32], 0);
        let decoded = DataItem::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.target().as_deref(), Some("testProcess"));
        assert!(decoded.verify());
    }

    #[test]
    fn anchor_must_be_32_bytes_when_present() {
        let err = UnsignedDataItem::builder()
            .anchor("short")
            .build()
            .unwrap_err();
        assert_eq!(err, BuildError::InvalidAnchor(5));

        let item = UnsignedDataItem::builder().anchor("").build().unwrap();
        assert!(item.anchor().is_none());

        let anchor = "a".repeat(32);
        let item = UnsignedDataItem::builder().anchor(anchor).build().unwrap();
        assert_eq!(item.anchor(), Some(&[b'a'; 32]));
    }

    #[test]
    fn data_defaults_to_empty() {
        let item = UnsignedDataItem::builder().build().unwrap();
        assert!(item.data().is_empty());
        assert!(item.tags().is_empty());
    }

    #[tokio::test]
    async fn signed_item_has_owner_and_id_from_signature() {
        let s = signer();
        let item = UnsignedDataItem::builder()
            .target(PROCESS)
            .tags(vec![Tag::new("Action", "Eval")])
            .data(b"1 + 1".to_vec())
            .build()
            .unwrap()
            .sign(&s)
            .await
            .unwrap();

        assert_eq!(item.owner(), b64url(s.public_key().as_bytes()));
        assert_eq!(item.id(), item_id(item.signature()));
        assert_eq!(item.id().len(), 43);
        assert!(item.verify());
    }

    #[tokio::test]
    async fn binary_layout_decodes_to_same_item() {
        let item = UnsignedDataItem::builder()
            .target(PROCESS)
            .anchor("b".repeat(32))
            .tags(vec![Tag::new("Action", "Eval"), Tag::new("Action", "Again")])
            .data(b"payload".to_vec())
            .build()
            .unwrap()
            .sign(&signer())
            .await
            .unwrap();

        let bytes = item.to_bytes();
        assert_eq!(&bytes[..2], &[2, 0]);
        let decoded = DataItem::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, item);
        assert!(decoded.verify());
    }

    #[tokio::test]
    async fn tampering_breaks_verification() {
        let item = UnsignedDataItem::builder()
            .data(b"original".to_vec())
            .build()
            .unwrap()
            .sign(&signer())
            .await
            .unwrap();
        let mut bytes = item.to_bytes();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        let tampered = DataItem::from_bytes(&bytes).unwrap();
        assert!(!tampered.verify());
    }

    #[test]
    fn truncated_bytes_fail_to_decode() {
        assert!(matches!(
            DataItem::from_bytes(&[2, 0, 1]),
            Err(DecodeError::UnexpectedEof(_))
        ));
        assert_eq!(
            DataItem::from_bytes(&[9, 0]),
            Err(DecodeError::UnknownSignatureType(9))
        );
    }

    struct ShortSigner;

    #[async_trait]
    impl Signer for ShortSigner {
        async fn sign(&self, _item: &UnsignedDataItem) -> Result<SignedPayload, SignerError> {
            Ok(SignedPayload {
                signature_type: SignatureType::Ed25519,
                signature: vec![1; 10],
                owner: vec![2; 32],
            })
        }
    }

    #[tokio::test]
    async fn signer_output_with_wrong_length_is_rejected() {
        let err = UnsignedDataItem::builder()
            .build()
            .unwrap()
            .sign(&ShortSigner)
            .await
            .unwrap_err();
        assert!(matches!(err, SignerError::BadLength { field: "signature", .. }));
    }
}
