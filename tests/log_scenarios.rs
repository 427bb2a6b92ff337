//! End-to-end scenarios covering the log's external contract: single-replica
//! append, cross-replica merge, pointer-count references, size-bounded join,
//! iterator windows, signature rejection, access denial, and fetch timeouts.

use signed_dag_log::access_controller::{DenyList, PermitAll};
use signed_dag_log::block_store::{BlockStore, MemoryBlockStore};
use signed_dag_log::entry::Entry;
use signed_dag_log::fetcher::FetchOptions;
use signed_dag_log::identity::{Ed25519Identity, IdentityProvider};
use signed_dag_log::lamport_clock::LamportClock;
use signed_dag_log::log::{IteratorOptions, Log};
use signed_dag_log::log_options::LogOptions;
use std::sync::Arc;
use std::time::Duration;

fn fresh_log(id: &str) -> (Arc<MemoryBlockStore>, Log<MemoryBlockStore, Ed25519Identity, PermitAll>) {
    let store = Arc::new(MemoryBlockStore::new());
    let identity = Ed25519Identity::generate(id);
    let log = Log::new(store.clone(), identity, PermitAll, LogOptions::new().set_id("scenario"));
    (store, log)
}

#[test]
fn single_appender_builds_a_linear_chain() {
    let (_, mut log) = fresh_log("alice");
    let a = log.append(b"one".to_vec(), None).unwrap();
    let b = log.append(b"two".to_vec(), None).unwrap();
    let c = log.append(b"three".to_vec(), None).unwrap();

    assert_eq!(log.len(), 3);
    assert_eq!(log.heads(), vec![c.clone()]);

    let values = log.values();
    let hashes: Vec<_> = values.iter().map(|e| e.hash()).collect();
    assert_eq!(hashes, vec![a.hash(), b.hash(), c.hash()]);
}

#[test]
fn two_replicas_merge_to_a_consistent_dag() {
    let store = Arc::new(MemoryBlockStore::new());
    let seed1 = Ed25519Identity::from_secret_bytes("replica-1", &[1u8; 32]);
    let seed2 = Ed25519Identity::from_secret_bytes("replica-2", &[2u8; 32]);

    // The clock tie between the two replicas' second entries breaks on
    // identity byte order, so pick whichever seed actually sorts first
    // instead of assuming it.
    let (identity_a, identity_b) = if seed1.identity().public_key < seed2.identity().public_key {
        (seed1, seed2)
    } else {
        (seed2, seed1)
    };

    let mut log_a = Log::new(store.clone(), identity_a, PermitAll, LogOptions::new().set_id("shared"));
    let mut log_b = Log::new(store.clone(), identity_b, PermitAll, LogOptions::new().set_id("shared"));

    log_a.append(b"one".to_vec(), None).unwrap();
    log_b.append(b"hello".to_vec(), None).unwrap();
    log_a.append(b"two".to_vec(), None).unwrap();
    log_b.append(b"world".to_vec(), None).unwrap();

    log_a.join(&log_b, None).unwrap();

    assert_eq!(log_a.heads().len(), 2);
    let payloads: Vec<Vec<u8>> = log_a.values().iter().map(|e| e.payload().to_vec()).collect();
    assert_eq!(
        payloads,
        vec![
            b"one".to_vec(),
            b"hello".to_vec(),
            b"two".to_vec(),
            b"world".to_vec(),
        ]
    );
}

#[test]
fn append_pointer_count_references_more_ancestors() {
    let (_, mut log) = fresh_log("alice");
    let a = log.append(b"a".to_vec(), None).unwrap();
    let b = log.append(b"b".to_vec(), None).unwrap();
    let c = log.append(b"c".to_vec(), Some(4)).unwrap();

    assert!(c.next().contains(&b.hash()));
    assert!(c.next().contains(&a.hash()));
    assert_eq!(c.next().len(), 2);
}

#[test]
fn join_with_a_size_bound_keeps_only_the_most_recent_entries() {
    let store = Arc::new(MemoryBlockStore::new());
    let alice = Ed25519Identity::generate("alice");
    let bob = Ed25519Identity::generate("bob");

    let mut log_a = Log::new(store.clone(), alice, PermitAll, LogOptions::new().set_id("shared"));
    let mut log_b = Log::new(store.clone(), bob, PermitAll, LogOptions::new().set_id("shared"));

    for i in 0..6 {
        log_a.append(format!("a{}", i).into_bytes(), None).unwrap();
    }
    for i in 0..6 {
        log_b.append(format!("b{}", i).into_bytes(), None).unwrap();
    }

    log_a.join(&log_b, Some(5)).unwrap();
    assert_eq!(log_a.len(), 5);
}

#[test]
fn iterator_with_gte_and_amount_includes_the_boundary() {
    let (_, mut log) = fresh_log("alice");
    let mut entries = Vec::new();
    for i in 0..8 {
        entries.push(log.append(format!("e{}", i).into_bytes(), None).unwrap());
    }

    let window = log.iterator(IteratorOptions {
        gte: Some(entries[4].hash()),
        amount: Some(3),
        ..Default::default()
    });

    let expected = vec![entries[6].hash(), entries[5].hash(), entries[4].hash()];
    let got: Vec<_> = window.iter().map(|e| e.hash()).collect();
    assert_eq!(got, expected);
}

#[test]
fn corrupted_block_fails_decode_before_it_ever_reaches_signature_checking() {
    let store = MemoryBlockStore::new();
    let identity = Ed25519Identity::generate("alice");
    let clock = LamportClock::new(&identity.identity().public_key);
    let entry = Entry::create(&store, &identity, "log", b"payload".to_vec(), vec![], clock).unwrap();

    let bytes = store.get(&entry.hash()).unwrap();
    let mut corrupted = bytes.clone();
    corrupted.push(0xFF);

    // `entry.hash()` no longer matches `Hash::of(&corrupted)`, so decode
    // rejects it on the content-hash check rather than a confusing signature
    // failure further down.
    assert!(Entry::decode(entry.hash(), &corrupted).is_err());
}

#[test]
fn join_verifies_every_incoming_entrys_signature() {
    let store = Arc::new(MemoryBlockStore::new());
    let alice = Ed25519Identity::generate("alice");
    let mallory = Ed25519Identity::generate("mallory");

    let mut log_a = Log::new(store.clone(), alice, PermitAll, LogOptions::new().set_id("shared"));
    let mut log_b = Log::new(store.clone(), mallory, PermitAll, LogOptions::new().set_id("shared"));

    log_a.append(b"a1".to_vec(), None).unwrap();
    log_b.append(b"m1".to_vec(), None).unwrap();

    // A legitimately signed foreign entry verifies and joins in; the unit
    // test `tampered_payload_fails_verification` in `entry.rs` covers the
    // rejection path directly, since forging a signature requires access to
    // `Entry`'s private fields that only an in-crate test has.
    assert!(log_a.join(&log_b, None).is_ok());
    assert_eq!(log_a.len(), 2);
}

#[test]
fn access_denial_keeps_the_log_and_store_unchanged() {
    let store = Arc::new(MemoryBlockStore::new());
    let identity = Ed25519Identity::generate("blocked");
    let acl = DenyList::new().deny(identity.identity().public_key.clone());
    let mut log = Log::new(store.clone(), identity, acl, LogOptions::new().set_id("scenario"));

    let blocks_before = store.len();
    let result = log.append(b"should not land".to_vec(), None);

    assert!(result.is_err());
    assert_eq!(store.len(), blocks_before);
    assert!(log.is_empty());
}

#[test]
fn fetch_timeout_yields_a_partial_result_not_an_error() {
    let store = MemoryBlockStore::new();
    let identity = Ed25519Identity::generate("alice");

    let mut next = vec![];
    let mut last_hash = None;
    for i in 0..500 {
        let clock = LamportClock::new(&identity.identity().public_key).set_time(i + 1);
        let e = Entry::create(&store, &identity, "log", format!("e{}", i).into_bytes(), next.clone(), clock)
            .unwrap();
        next = vec![e.hash()];
        last_hash = Some(e.hash());
    }

    let fetch_options = FetchOptions {
        timeout: Some(Duration::from_nanos(1)),
        ..Default::default()
    };
    let fetched = signed_dag_log::fetcher::Fetcher::new(&store).fetch(&[last_hash.unwrap()], fetch_options);
    assert!(fetched.len() < 500);
}
