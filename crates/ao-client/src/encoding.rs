//! Avro tag encoding and base64url helpers used by the ANS-104 item layout.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use thiserror::Error;

use crate::tag::Tag;

/// Malformed binary data item or tag block.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unexpected end of input at offset {0}")]
    UnexpectedEof(usize),

    #[error("unknown signature type {0}")]
    UnknownSignatureType(u16),

    #[error("invalid presence flag {0}")]
    InvalidFlag(u8),

    #[error("varint overflow")]
    VarintOverflow,

    #[error("negative length {0}")]
    NegativeLength(i64),

    #[error("tag block declares {declared} tags, found {found}")]
    TagCountMismatch { declared: u64, found: u64 },

    #[error("tag is not valid UTF-8")]
    InvalidUtf8,

    #[error("invalid base64url: {0}")]
    Base64(String),
}

pub fn b64url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn b64url_decode(s: &str) -> Result<Vec<u8>, DecodeError> {
    URL_SAFE_NO_PAD
        .decode(s.trim_end_matches('='))
        .map_err(|e| DecodeError::Base64(e.to_string()))
}

fn write_long(out: &mut Vec<u8>, n: i64) {
    let mut zz = ((n << 1) ^ (n >> 63)) as u64;
    while zz & !0x7f != 0 {
        out.push(((zz & 0x7f) | 0x80) as u8);
        zz >>= 7;
    }
    out.push(zz as u8);
}

fn write_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    write_long(out, bytes.len() as i64);
    out.extend_from_slice(bytes);
}

/// Avro encoding of the tag array. An empty tag list encodes to no bytes.
pub fn encode_tags(tags: &[Tag]) -> Vec<u8> {
    if tags.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();
    write_long(&mut out, tags.len() as i64);
    for tag in tags {
        write_bytes(&mut out, tag.name.as_bytes());
        write_bytes(&mut out, tag.value.as_bytes());
    }
    write_long(&mut out, 0);
    out
}

/// Cursor over a byte slice with the reads the item layout needs.
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.buf.len())
            .ok_or(DecodeError::UnexpectedEof(self.pos))?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub(crate) fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u16_le(&mut self) -> Result<u16, DecodeError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub(crate) fn u64_le(&mut self) -> Result<u64, DecodeError> {
        let mut b = [0u8; 8];
        b.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(b))
    }

    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let slice = &self.buf[self.pos..];
        self.pos = self.buf.len();
        slice
    }

    fn long(&mut self) -> Result<i64, DecodeError> {
        let mut zz: u64 = 0;
        let mut shift = 0;
        loop {
            if shift >= 64 {
                return Err(DecodeError::VarintOverflow);
            }
            let byte = self.u8()?;
            zz |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
        }
        Ok(((zz >> 1) as i64) ^ -((zz & 1) as i64))
    }

    fn string(&mut self) -> Result<String, DecodeError> {
        let len = self.long()?;
        if len < 0 {
            return Err(DecodeError::NegativeLength(len));
        }
        let bytes = self.take(len as usize)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8)
    }
}

/// Decode an Avro tag block. `expected` is the count from the item header.
pub fn decode_tags(bytes: &[u8], expected: u64) -> Result<Vec<Tag>, DecodeError> {
    let mut tags = Vec::new();
    if bytes.is_empty() {
        if expected != 0 {
            return Err(DecodeError::TagCountMismatch {
                declared: expected,
                found: 0,
            });
        }
        return Ok(tags);
    }
    let mut reader = Reader::new(bytes);
    loop {
        let mut count = reader.long()?;
        if count == 0 {
            break;
        }
        // A negative block count is followed by the block's byte size.
        if count < 0 {
            count = count.checked_neg().ok_or(DecodeError::VarintOverflow)?;
            reader.long()?;
        }
        for _ in 0..count {
            let name = reader.string()?;
            let value = reader.string()?;
            tags.push(Tag { name, value });
        }
    }
    if tags.len() as u64 != expected {
        return Err(DecodeError::TagCountMismatch {
            declared: expected,
            found: tags.len() as u64,
        });
    }
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zigzag_matches_avro() {
        let mut out = Vec::new();
        write_long(&mut out, 1);
        write_long(&mut out, -1);
        write_long(&mut out, 64);
        assert_eq!(out, vec![0x02, 0x01, 0x80, 0x01]);
    }

    #[test]
    fn single_tag_layout() {
        let bytes = encode_tags(&[Tag::new("a", "bc")]);
        // count=1, len=1 "a", len=2 "bc", terminator
        assert_eq!(bytes, vec![0x02, 0x02, b'a', 0x04, b'b', b'c', 0x00]);
        assert_eq!(decode_tags(&bytes, 1).unwrap(), vec![Tag::new("a", "bc")]);
    }

    #[test]
    fn empty_tags_encode_to_nothing() {
        assert!(encode_tags(&[]).is_empty());
        assert!(decode_tags(&[], 0).unwrap().is_empty());
    }

    #[test]
    fn decode_rejects_count_mismatch_and_truncation() {
        let bytes = encode_tags(&[Tag::new("a", "b"), Tag::new("c", "d")]);
        assert_eq!(
            decode_tags(&bytes, 3),
            Err(DecodeError::TagCountMismatch {
                declared: 3,
                found: 2
            })
        );
        assert!(matches!(
            decode_tags(&bytes[..4], 2),
            Err(DecodeError::UnexpectedEof(_))
        ));
    }

    #[test]
    fn most_negative_block_count_is_rejected() {
        // zig-zag of i64::MIN is u64::MAX: nine continuation bytes, then 0x01
        let mut bytes = vec![0xff; 9];
        bytes.push(0x01);
        assert_eq!(decode_tags(&bytes, 1), Err(DecodeError::VarintOverflow));
    }

    #[test]
    fn b64url_is_unpadded() {
        assert_eq!(b64url(&[0xfb, 0xff]), "-_8");
        assert_eq!(b64url_decode("-_8").unwrap(), vec![0xfb, 0xff]);
        assert_eq!(b64url_decode("-_8=").unwrap(), vec![0xfb, 0xff]);
    }
}
