//! `Entry`: an immutable, signed, content-addressed DAG node. Once hashed an
//! entry never changes; `next` pins its predecessors by hash so the entry set
//! forms a DAG by construction.

use crate::block_store::{BlockStore, Hash};
use crate::error::LogError;
use crate::identity::{Identity, IdentityProvider};
use crate::lamport_clock::LamportClock;
use serde::{Deserialize, Serialize};

pub const FORMAT_VERSION: u8 = 1;

/// The fields that are signed over and hashed. `sig` and `hash` are
/// deliberately excluded from their own preimages (§3/§4.16).
#[derive(Serialize)]
struct EntryPreimage<'a> {
    id: &'a str,
    payload: &'a [u8],
    next: &'a [Hash],
    v: u8,
    clock: &'a LamportClock,
    key: &'a [u8],
    identity: &'a Identity,
}

/// The canonical on-wire form written to the block store: the preimage plus
/// `sig`, in the fixed field order §6 specifies. `hash` is the store key, not
/// a field of the encoded bytes.
#[derive(Serialize, Deserialize)]
struct EntryWire {
    id: String,
    payload: Vec<u8>,
    next: Vec<Hash>,
    v: u8,
    clock: LamportClock,
    key: Vec<u8>,
    identity: Identity,
    sig: Vec<u8>,
}

/// An immutable signed DAG node.
#[derive(Clone, Debug)]
pub struct Entry {
    log_id: String,
    payload: Vec<u8>,
    next: Vec<Hash>,
    v: u8,
    clock: LamportClock,
    key: Vec<u8>,
    identity: Identity,
    sig: Vec<u8>,
    hash: Hash,
}

impl Entry {
    /// Signs and hashes a new entry without touching any block store.
    ///
    /// Hashing is a pure local computation (it is the same `blake3` digest a
    /// [`BlockStore::put`] of the encoded bytes would produce), so a caller
    /// can run an access check against the fully-formed, addressable entry
    /// before deciding whether [`Entry::store_into`] should ever write a
    /// block for it — this is what lets append avoid orphaning a block on an
    /// access denial (see [`crate::log::Log::append`]).
    pub fn create_unstored<I>(
        identity: &I,
        log_id: &str,
        payload: Vec<u8>,
        next: Vec<Hash>,
        clock: LamportClock,
    ) -> Result<Entry, LogError>
    where
        I: IdentityProvider,
    {
        let key = identity.identity().public_key.clone();
        let preimage = EntryPreimage {
            id: log_id,
            payload: &payload,
            next: &next,
            v: FORMAT_VERSION,
            clock: &clock,
            key: &key,
            identity: identity.identity(),
        };
        let preimage_bytes =
            serde_cbor::to_vec(&preimage).map_err(|e| LogError::InvalidEntry(e.to_string()))?;
        let sig = identity.sign(&preimage_bytes).map_err(LogError::signature)?;

        let wire = EntryWire {
            id: log_id.to_owned(),
            payload: payload.clone(),
            next: next.clone(),
            v: FORMAT_VERSION,
            clock: clock.clone(),
            key: key.clone(),
            identity: identity.identity().clone(),
            sig: sig.clone(),
        };
        let wire_bytes =
            serde_cbor::to_vec(&wire).map_err(|e| LogError::InvalidEntry(e.to_string()))?;
        let hash = Hash::of(&wire_bytes);

        Ok(Entry {
            log_id: log_id.to_owned(),
            payload,
            next,
            v: FORMAT_VERSION,
            clock,
            key,
            identity: identity.identity().clone(),
            sig,
            hash,
        })
    }

    /// Signs, hashes, and immediately writes the entry's canonical encoding
    /// to `store`. Convenience for callers (tests, the fetcher's
    /// reconstruction path) that don't need the access-check-before-write
    /// staging `create_unstored` + `store_into` gives [`crate::log::Log`].
    pub fn create<S, I>(
        store: &S,
        identity: &I,
        log_id: &str,
        payload: Vec<u8>,
        next: Vec<Hash>,
        clock: LamportClock,
    ) -> Result<Entry, LogError>
    where
        S: BlockStore,
        I: IdentityProvider,
    {
        let entry = Entry::create_unstored(identity, log_id, payload, next, clock)?;
        entry.store_into(store)?;
        Ok(entry)
    }

    /// Writes this entry's canonical encoding to `store`, keyed by its hash.
    fn wire_bytes(&self) -> Result<Vec<u8>, LogError> {
        let wire = EntryWire {
            id: self.log_id.clone(),
            payload: self.payload.clone(),
            next: self.next.clone(),
            v: self.v,
            clock: self.clock.clone(),
            key: self.key.clone(),
            identity: self.identity.clone(),
            sig: self.sig.clone(),
        };
        serde_cbor::to_vec(&wire).map_err(|e| LogError::InvalidEntry(e.to_string()))
    }

    pub fn store_into<S: BlockStore>(&self, store: &S) -> Result<(), LogError> {
        let bytes = self.wire_bytes()?;
        store.put(&bytes).map_err(LogError::store)?;
        Ok(())
    }

    /// Reconstructs an entry from bytes read out of a block store at `hash`.
    /// Recomputes the content hash of `bytes` and rejects a mismatch before
    /// even attempting to decode — a corrupt or substituted block is caught
    /// here rather than surfacing as a confusing signature failure later.
    pub fn decode(hash: Hash, bytes: &[u8]) -> Result<Entry, LogError> {
        let computed = Hash::of(bytes);
        if computed != hash {
            return Err(LogError::InvalidEntry(format!(
                "content hash mismatch: expected {}, got {}",
                hash, computed
            )));
        }
        let wire: EntryWire =
            serde_cbor::from_slice(bytes).map_err(|e| LogError::InvalidEntry(e.to_string()))?;
        Ok(Entry {
            log_id: wire.id,
            payload: wire.payload,
            next: wire.next,
            v: wire.v,
            clock: wire.clock,
            key: wire.key,
            identity: wire.identity,
            sig: wire.sig,
            hash,
        })
    }

    /// Recomputes the canonical preimage and checks `sig` against `key` under
    /// identity provider `I`.
    pub fn verify<I: IdentityProvider>(&self) -> Result<(), LogError> {
        let preimage = EntryPreimage {
            id: &self.log_id,
            payload: &self.payload,
            next: &self.next,
            v: self.v,
            clock: &self.clock,
            key: &self.key,
            identity: &self.identity,
        };
        let bytes =
            serde_cbor::to_vec(&preimage).map_err(|e| LogError::InvalidEntry(e.to_string()))?;
        I::verify(&self.key, &bytes, &self.sig).map_err(LogError::signature)
    }

    pub fn log_id(&self) -> &str {
        &self.log_id
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn next(&self) -> &[Hash] {
        &self.next
    }

    pub fn v(&self) -> u8 {
        self.v
    }

    pub fn clock(&self) -> &LamportClock {
        &self.clock
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn sig(&self) -> &[u8] {
        &self.sig
    }

    pub fn hash(&self) -> Hash {
        self.hash
    }

    /// `true` iff `self.hash` appears in `other.next`, i.e. `self` is a
    /// direct predecessor of `other`.
    pub fn is_parent(&self, other: &Entry) -> bool {
        other.next.contains(&self.hash)
    }

    /// Entries in `universe` that list `self.hash` in their `next`.
    pub fn find_children<'a>(&self, universe: &'a [Entry]) -> Vec<&'a Entry> {
        universe.iter().filter(|e| self.is_parent(e)).collect()
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Entry {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_store::MemoryBlockStore;
    use crate::identity::Ed25519Identity;

    fn store_and_identity() -> (MemoryBlockStore, Ed25519Identity) {
        (MemoryBlockStore::new(), Ed25519Identity::generate("a"))
    }

    #[test]
    fn create_then_verify_succeeds() {
        let (store, identity) = store_and_identity();
        let clock = LamportClock::new(&identity.identity().public_key);
        let entry =
            Entry::create(&store, &identity, "log", b"payload".to_vec(), vec![], clock).unwrap();
        entry.verify::<Ed25519Identity>().unwrap();
    }

    #[test]
    fn tampered_payload_fails_verification() {
        let (store, identity) = store_and_identity();
        let clock = LamportClock::new(&identity.identity().public_key);
        let mut entry =
            Entry::create(&store, &identity, "log", b"payload".to_vec(), vec![], clock).unwrap();
        entry.payload = b"tampered".to_vec();
        assert!(entry.verify::<Ed25519Identity>().is_err());
    }

    #[test]
    fn is_parent_and_find_children() {
        let (store, identity) = store_and_identity();
        let clock = LamportClock::new(&identity.identity().public_key);
        let parent =
            Entry::create(&store, &identity, "log", b"p".to_vec(), vec![], clock.clone())
                .unwrap();
        let child = Entry::create(
            &store,
            &identity,
            "log",
            b"c".to_vec(),
            vec![parent.hash()],
            clock,
        )
        .unwrap();

        assert!(parent.is_parent(&child));
        assert!(!child.is_parent(&parent));

        let universe = vec![parent.clone(), child.clone()];
        assert_eq!(parent.find_children(&universe), vec![&child]);
    }

    #[test]
    fn same_bytes_produce_same_hash() {
        let (store, identity) = store_and_identity();
        let clock = LamportClock::new(&identity.identity().public_key);
        let a = Entry::create(
            &store,
            &identity,
            "log",
            b"p".to_vec(),
            vec![],
            clock.clone(),
        )
        .unwrap();
        // Re-signing identical fields with a fresh clock tick changes the hash.
        let mut clock2 = clock;
        clock2.tick();
        let b = Entry::create(&store, &identity, "log", b"p".to_vec(), vec![], clock2).unwrap();
        assert_ne!(a.hash(), b.hash());
    }
}
