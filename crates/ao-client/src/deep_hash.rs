//! ANS-104 deep hash (SHA-384).

use sha2::{Digest, Sha384};

pub type DeepHash = [u8; 48];

/// Input to [`deep_hash`]: a byte blob or a nested list.
#[derive(Clone, Debug)]
pub enum Chunk<'a> {
    Blob(&'a [u8]),
    List(Vec<Chunk<'a>>),
}

fn sha384(parts: &[&[u8]]) -> DeepHash {
    let mut hasher = Sha384::new();
    for part in parts {
        hasher.update(part);
    }
    let mut out = [0u8; 48];
    out.copy_from_slice(&hasher.finalize());
    out
}

pub fn deep_hash(chunk: &Chunk<'_>) -> DeepHash {
    match chunk {
        Chunk::Blob(bytes) => {
            let bytes: &[u8] = bytes;
            let tag = format!("blob{}", bytes.len());
            let tag_hash = sha384(&[tag.as_bytes()]);
            let data_hash = sha384(&[bytes]);
            sha384(&[&tag_hash, &data_hash])
        }
        Chunk::List(items) => {
            let tag = format!("list{}", items.len());
            items.iter().fold(sha384(&[tag.as_bytes()]), |acc, item| {
                sha384(&[&acc, &deep_hash(item)])
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_hash_is_tagged_with_length() {
        let expected = {
            let tag = sha384(&[b"blob3"]);
            let data = sha384(&[b"abc"]);
            sha384(&[&tag, &data])
        };
        assert_eq!(deep_hash(&Chunk::Blob(b"abc")), expected);
    }

    #[test]
    fn list_folds_over_items_in_order() {
        let a = Chunk::Blob(b"a");
        let b = Chunk::Blob(b"b");
        let forward = deep_hash(&Chunk::List(vec![a.clone(), b.clone()]));
        let reversed = deep_hash(&Chunk::List(vec![b, a]));
        assert_ne!(forward, reversed);
    }

    #[test]
    fn empty_list_differs_from_empty_blob() {
        assert_ne!(
            deep_hash(&Chunk::List(vec![])),
            deep_hash(&Chunk::Blob(&[]))
        );
    }
}
