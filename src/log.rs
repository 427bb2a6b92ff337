//! `Log<S, I, A>`: the append-only, signed, content-addressed DAG. Owns the
//! locally known entry set and heads, and is generic over its three
//! collaborators — block store, identity provider, access controller — so a
//! caller picks the concrete storage, signing, and authorization behavior.

use crate::access_controller::AccessController;
use crate::block_store::{BlockStore, Hash};
use crate::comparator::{last_write_wins, no_zeroes, Comparator};
use crate::entry::Entry;
use crate::entry_map::OrderedMap;
use crate::error::{LogError, Result};
use crate::fetcher::{FetchOptions, Fetcher};
use crate::identity::IdentityProvider;
use crate::lamport_clock::LamportClock;
use crate::log_options::LogOptions;
use crate::traversal::{find_heads, traverse};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use tracing::debug;

static LOG_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Bounds for [`Log::iterator`]. Boundaries are identified by entry hash, not
/// by wall-clock position, so results are stable regardless of when a replica
/// learned about an entry.
#[derive(Default, Clone)]
pub struct IteratorOptions {
    pub gt: Option<Hash>,
    pub gte: Option<Hash>,
    pub lt: Option<Hash>,
    pub lte: Option<Hash>,
    pub amount: Option<usize>,
}

/// The minimal serializable header: identity plus current heads, sorted
/// descending under the log's comparator. This, not the full entry set, is
/// what [`Log::to_json`] returns and what [`Log::from_json`] resolves from.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogHeader {
    pub id: String,
    pub heads: Vec<String>,
}

/// A `(hash, payload, next, clock_time)` view of an entry, suitable for
/// rendering a snapshot without exposing signature/identity bytes.
#[derive(Clone, Debug, Serialize)]
pub struct EntrySnapshot {
    pub hash: String,
    pub payload: Vec<u8>,
    pub next: Vec<String>,
    pub clock_time: u64,
}

impl From<&Entry> for EntrySnapshot {
    fn from(e: &Entry) -> EntrySnapshot {
        EntrySnapshot {
            hash: e.hash().to_string(),
            payload: e.payload().to_vec(),
            next: e.next().iter().map(|h| h.to_string()).collect(),
            clock_time: e.clock().time(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct LogSnapshot {
    pub id: String,
    pub heads: Vec<String>,
    pub values: Vec<EntrySnapshot>,
}

/// Generates a default log id that does not depend on wall-clock time: the
/// blake3 hash of the local identity's public key, salted with a process-local
/// monotonic counter so that two logs created back-to-back by the same
/// identity still get distinct ids.
fn default_log_id(public_key: &[u8]) -> String {
    let counter = LOG_ID_COUNTER.fetch_add(1, AtomicOrdering::Relaxed);
    let mut seed = public_key.to_vec();
    seed.extend_from_slice(&counter.to_be_bytes());
    Hash::of(&seed).to_string()
}

pub struct Log<S, I, A> {
    id: String,
    store: Arc<S>,
    identity: I,
    access_controller: A,
    sort_fn: Comparator,
    clock: LamportClock,
    entries: OrderedMap<Entry>,
    heads: OrderedMap<Entry>,
    /// predecessor hash -> hash of one entry that lists it in `next`. Only one
    /// successor needs recording: its presence is what disqualifies a
    /// candidate head, not which successor specifically.
    next_index: HashMap<Hash, Hash>,
}

impl<S, I, A> Log<S, I, A>
where
    S: BlockStore,
    I: IdentityProvider,
    A: AccessController,
{
    pub fn new(store: Arc<S>, identity: I, access_controller: A, options: LogOptions) -> Log<S, I, A> {
        let id = options
            .id
            .clone()
            .unwrap_or_else(|| default_log_id(&identity.identity().public_key));

        let entries = OrderedMap::from_entries(options.entries.clone());

        let heads = if !options.heads.is_empty() {
            OrderedMap::from_entries(options.heads.clone())
        } else {
            OrderedMap::from_entries(find_heads(&entries))
        };

        let mut next_index = HashMap::new();
        for e in entries.slice() {
            for n in e.next() {
                next_index.entry(*n).or_insert_with(|| e.hash());
            }
        }

        let mut clock = options
            .clock
            .unwrap_or_else(|| LamportClock::new(&identity.identity().public_key));
        for h in heads.slice() {
            clock.merge(h.clock());
        }

        let sort_fn = options
            .sort_fn
            .unwrap_or_else(|| no_zeroes(last_write_wins));

        Log {
            id,
            store,
            identity,
            access_controller,
            sort_fn,
            clock,
            entries,
            heads,
            next_index,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn clock(&self) -> &LamportClock {
        &self.clock
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, hash: &Hash) -> Option<&Entry> {
        self.entries.get(hash)
    }

    pub fn has(&self, hash: &Hash) -> bool {
        self.entries.has(hash)
    }

    pub fn heads(&self) -> Vec<Entry> {
        self.heads.slice().into_iter().cloned().collect()
    }

    /// Signs, access-checks, and appends `payload` as a new entry whose
    /// predecessors are the current heads plus up to `pointer_count`
    /// additional ancestors reachable from them.
    ///
    /// The entry is signed and hashed (and thus fully addressable) before the
    /// access controller ever sees it, and is written to the block store only
    /// after the access controller admits it — an access denial never leaves
    /// a block behind.
    pub fn append(&mut self, payload: Vec<u8>, pointer_count: Option<usize>) -> Result<Entry> {
        let pointer_count = pointer_count.unwrap_or(1);

        let heads_snapshot: Vec<Entry> = self.heads.slice().into_iter().cloned().collect();

        let mut new_time = self.clock.time();
        for h in &heads_snapshot {
            new_time = new_time.max(h.clock().time());
        }
        new_time += 1;

        let amount = pointer_count.max(heads_snapshot.len());
        let refs = traverse(&heads_snapshot, Some(amount), None, &self.entries, &self.sort_fn);

        let mut next = Vec::with_capacity(heads_snapshot.len() + refs.len());
        let mut seen = HashSet::new();
        for h in heads_snapshot.iter().chain(refs.iter()) {
            if seen.insert(h.hash()) {
                next.push(h.hash());
            }
        }

        let new_clock = LamportClock::new(&self.identity.identity().public_key).set_time(new_time);

        let entry = Entry::create_unstored(&self.identity, &self.id, payload, next, new_clock.clone())?;

        self.access_controller
            .can_append(&entry, self.identity.identity())?;

        entry.store_into(&*self.store)?;

        for h in &heads_snapshot {
            self.next_index.entry(h.hash()).or_insert_with(|| entry.hash());
        }

        self.clock = new_clock;
        self.entries.set(entry.hash(), entry.clone());
        self.heads = OrderedMap::new();
        self.heads.set(entry.hash(), entry.clone());

        debug!(log_id = %self.id, hash = %entry.hash(), "appended entry");
        Ok(entry)
    }

    /// Merges `other`'s entries into `self`, up to `size` entries retained.
    /// A no-op (not an error) when the two logs have different ids. Every
    /// incoming entry is re-verified and re-checked against this log's access
    /// controller before it's admitted: a join trusts nothing about the
    /// remote replica's own bookkeeping.
    pub fn join(&mut self, other: &Log<S, I, A>, size: Option<usize>) -> Result<()> {
        if other.id != self.id {
            return Ok(());
        }

        let new_items = difference(other, &self.entries, &self.id);

        for e in &new_items {
            e.verify::<I>()?;
            self.access_controller
                .can_append(e, self.identity.identity())?;
        }

        for e in &new_items {
            for n in e.next() {
                self.next_index.entry(*n).or_insert_with(|| e.hash());
            }
            self.entries.set(e.hash(), e.clone());
        }

        let mut merged_heads = self.heads.copy();
        merged_heads.merge(&other.heads);
        let candidates = find_heads(&merged_heads);

        self.heads = OrderedMap::new();
        for h in candidates {
            if !self.next_index.contains_key(&h.hash()) {
                self.heads.set(h.hash(), h);
            }
        }

        if let Some(size) = size {
            let mut values = self.values();
            if values.len() > size {
                values = values.split_off(values.len() - size);
            }
            self.entries = OrderedMap::from_entries(values);
            self.heads = OrderedMap::from_entries(find_heads(&self.entries));
        }

        let mut new_time = self.clock.time();
        for h in self.heads.slice() {
            new_time = new_time.max(h.clock().time());
        }
        self.clock = LamportClock::new(&self.identity.identity().public_key).set_time(new_time);

        debug!(log_id = %self.id, merged = new_items.len(), "joined log");
        Ok(())
    }

    /// All entries reachable from the current heads, ordered tails-first.
    pub fn values(&self) -> Vec<Entry> {
        let heads: Vec<Entry> = self.heads.slice().into_iter().cloned().collect();
        let mut result = traverse(&heads, None, None, &self.entries, &self.sort_fn);
        result.reverse();
        result
    }

    /// A bounded, head-anchored slice of the log's total order.
    pub fn iterator(&self, options: IteratorOptions) -> Vec<Entry> {
        if options.amount == Some(0) {
            return Vec::new();
        }

        let start: Vec<Entry> = if let Some(h) = options.lte.or(options.lt) {
            self.entries.get(&h).cloned().into_iter().collect()
        } else {
            self.heads.slice().into_iter().cloned().collect()
        };

        let end_hash = options.gte.or(options.gt);
        let traversal_amount = if end_hash.is_none() { options.amount } else { None };

        let mut result = traverse(&start, traversal_amount, end_hash, &self.entries, &self.sort_fn);

        if options.gt.is_some() {
            result.pop();
        }

        if options.gt.is_some() || options.gte.is_some() {
            if let Some(amount) = options.amount {
                if result.len() > amount {
                    result = result.split_off(result.len() - amount);
                }
            }
        }

        result
    }

    /// Renders `values()` descending, indenting each entry by its number of
    /// children within the currently-known entry set.
    pub fn to_string_with<F: Fn(&Entry) -> String>(&self, mapper: F) -> String {
        let mut descending = self.values();
        descending.reverse();

        let universe: Vec<Entry> = self.entries.slice().into_iter().cloned().collect();
        let mut out = String::new();
        for e in &descending {
            let children = e.find_children(&universe);
            if !children.is_empty() {
                for _ in 0..children.len().saturating_sub(1) {
                    out.push_str("  ");
                }
                out.push_str("└─");
            }
            out.push_str(&mapper(e));
            out.push('\n');
        }
        out
    }

    pub fn to_json(&self) -> LogHeader {
        let mut heads: Vec<Entry> = self.heads.slice().into_iter().cloned().collect();
        heads.sort_by(|a, b| (self.sort_fn)(b, a));
        LogHeader {
            id: self.id.clone(),
            heads: heads.iter().map(|e| e.hash().to_string()).collect(),
        }
    }

    /// Human-readable rendering of [`Log::to_json`], e.g. for CLI tooling or
    /// log inspection. The canonical, hash-stable encoding entries use on the
    /// wire is CBOR (see `entry::EntryWire`); this is for humans, not storage.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(&self.to_json()).map_err(|e| LogError::InvalidEntry(e.to_string()))
    }

    pub fn snapshot(&self) -> LogSnapshot {
        LogSnapshot {
            id: self.id.clone(),
            heads: self.heads.slice().iter().map(|e| e.hash().to_string()).collect(),
            values: self.values().iter().map(EntrySnapshot::from).collect(),
        }
    }

    /// Builds a log by fetching the DAG reachable from `seeds` through `store`.
    pub fn from_entry_seeds(
        store: Arc<S>,
        identity: I,
        access_controller: A,
        options: LogOptions,
        seeds: &[Hash],
        fetch_options: FetchOptions,
    ) -> Log<S, I, A> {
        let fetched = Fetcher::new(&*store).fetch(seeds, fetch_options);
        let options = options.set_entries(fetched);
        Log::new(store, identity, access_controller, options)
    }

    pub fn from_multihash(
        store: Arc<S>,
        identity: I,
        access_controller: A,
        options: LogOptions,
        hash: Hash,
        fetch_options: FetchOptions,
    ) -> Log<S, I, A> {
        Log::from_entry_seeds(store, identity, access_controller, options, &[hash], fetch_options)
    }

    pub fn from_entry_hash(
        store: Arc<S>,
        identity: I,
        access_controller: A,
        options: LogOptions,
        hash: Hash,
        fetch_options: FetchOptions,
    ) -> Log<S, I, A> {
        Log::from_multihash(store, identity, access_controller, options, hash, fetch_options)
    }

    pub fn from_json(
        store: Arc<S>,
        identity: I,
        access_controller: A,
        options: LogOptions,
        header: &LogHeader,
        fetch_options: FetchOptions,
    ) -> Result<Log<S, I, A>> {
        let seeds: Vec<Hash> = header
            .heads
            .iter()
            .map(|h| Hash::from_str(h).map_err(|e| LogError::InvalidEntry(e.to_string())))
            .collect::<Result<_>>()?;
        let options = options.set_id(&header.id);
        Ok(Log::from_entry_seeds(
            store,
            identity,
            access_controller,
            options,
            &seeds,
            fetch_options,
        ))
    }
}

/// Breadth-first expansion of `other`'s heads, collecting entries absent from
/// `known` that belong to log `known_id`. `next` is followed only out of
/// entries that were themselves included — an entry already known, or from a
/// foreign log, is a discovery boundary, not a pass-through.
fn difference<S, I, A>(other: &Log<S, I, A>, known: &OrderedMap<Entry>, known_id: &str) -> Vec<Entry> {
    let mut queue: VecDeque<Hash> = other.heads.slice().iter().map(|e| e.hash()).collect();
    let mut visited = HashSet::new();
    let mut result = Vec::new();

    while let Some(hash) = queue.pop_front() {
        if !visited.insert(hash) {
            continue;
        }
        let entry = match other.entries.get(&hash) {
            Some(e) => e,
            None => continue,
        };
        if known.has(&hash) || entry.log_id() != known_id {
            continue;
        }
        for n in entry.next() {
            if !visited.contains(n) {
                queue.push_back(*n);
            }
        }
        result.push(entry.clone());
    }

    result
}
