//! The content-addressed block store collaborator: a `put`/`get` pair keyed by
//! the `blake3` digest of the stored bytes, plus an in-memory reference
//! implementation good enough to back the fetcher and the test suite.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::TryFrom;
use std::fmt;
use std::sync::Mutex;

pub const HASH_LEN: usize = 32;

/// A 32-byte content address. `Display`/`FromStr` render it as lowercase hex,
/// the same textual form entries use when embedding `next` references in JSON.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hash([u8; HASH_LEN]);

impl Hash {
    pub fn of(bytes: &[u8]) -> Hash {
        Hash(*blake3::hash(bytes).as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", hex::encode(self.0))
    }
}

impl std::str::FromStr for Hash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        Hash::try_from(bytes.as_slice()).map_err(|_| hex::FromHexError::InvalidStringLength)
    }
}

impl TryFrom<&[u8]> for Hash {
    type Error = std::array::TryFromSliceError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Ok(Hash(<[u8; HASH_LEN]>::try_from(bytes)?))
    }
}

/// Content-addressed byte storage. Implementations must guarantee that the
/// same bytes always `put` to the same [`Hash`] (content addressing) and that
/// a `get` of a hash never returned by `put` fails rather than returning
/// garbage.
pub trait BlockStore {
    type Error: std::error::Error + 'static;

    fn put(&self, bytes: &[u8]) -> Result<Hash, Self::Error>;
    fn get(&self, hash: &Hash) -> Result<Vec<u8>, Self::Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum MemoryStoreError {
    #[error("block {0} not found")]
    NotFound(Hash),
}

/// Reference [`BlockStore`] backed by a mutex-guarded hash map. Interior
/// mutability lets a single store be shared (typically via `Arc`) between a
/// log and the fetcher it feeds, without requiring `&mut` plumbing through
/// either.
#[derive(Default)]
pub struct MemoryBlockStore {
    blocks: Mutex<HashMap<Hash, Vec<u8>>>,
}

impl MemoryBlockStore {
    pub fn new() -> MemoryBlockStore {
        MemoryBlockStore {
            blocks: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlockStore for MemoryBlockStore {
    type Error = MemoryStoreError;

    fn put(&self, bytes: &[u8]) -> Result<Hash, MemoryStoreError> {
        let hash = Hash::of(bytes);
        self.blocks
            .lock()
            .unwrap()
            .entry(hash)
            .or_insert_with(|| bytes.to_vec());
        Ok(hash)
    }

    fn get(&self, hash: &Hash) -> Result<Vec<u8>, MemoryStoreError> {
        self.blocks
            .lock()
            .unwrap()
            .get(hash)
            .cloned()
            .ok_or(MemoryStoreError::NotFound(*hash))
    }
}
