//! The fetcher: breadth-first expansion of the DAG from seed hashes via the
//! block store. Purely a block-store consumer — it knows nothing about
//! `Log`, which is what lets [`crate::log::Log::from_entry_seeds`] and
//! friends build a log purely from what the fetcher returns.

use crate::block_store::{BlockStore, Hash};
use crate::entry::Entry;
use std::collections::{HashSet, VecDeque};
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};
use tracing::warn;

/// Options controlling a single [`Fetcher::fetch`] call.
#[derive(Default)]
pub struct FetchOptions {
    /// Stop once this many entries have been fetched.
    pub length: Option<usize>,
    /// Hashes never to fetch or expand into, even if reachable from a seed.
    pub exclude: HashSet<Hash>,
    /// Wall-clock budget. On expiry the partial result gathered so far is
    /// returned rather than an error.
    pub timeout: Option<Duration>,
    /// Notified once per successfully fetched entry.
    pub progress: Option<Sender<Hash>>,
}

pub struct Fetcher<'s, S: BlockStore> {
    store: &'s S,
}

impl<'s, S: BlockStore> Fetcher<'s, S> {
    pub fn new(store: &'s S) -> Fetcher<'s, S> {
        Fetcher { store }
    }

    /// Expands `seeds` breadth-first, following each fetched entry's `next`
    /// hashes. Returns a deduplicated list; callers that need total order
    /// should sort the result via the comparator.
    pub fn fetch(&self, seeds: &[Hash], options: FetchOptions) -> Vec<Entry> {
        let deadline = options.timeout.map(|d| Instant::now() + d);
        let mut queue: VecDeque<Hash> = seeds
            .iter()
            .copied()
            .filter(|h| !options.exclude.contains(h))
            .collect();
        let mut seen: HashSet<Hash> = HashSet::new();
        let mut result = Vec::new();

        while let Some(hash) = queue.pop_front() {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    break;
                }
            }
            if !seen.insert(hash) {
                continue;
            }

            let bytes = match self.store.get(&hash) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(%hash, error = %e, "fetcher: block unavailable, skipping");
                    continue;
                }
            };
            let entry = match Entry::decode(hash, &bytes) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(%hash, error = %e, "fetcher: malformed block, skipping");
                    continue;
                }
            };

            if let Some(tx) = &options.progress {
                let _ = tx.send(hash);
            }

            for n in entry.next() {
                if !seen.contains(n) && !options.exclude.contains(n) {
                    queue.push_back(*n);
                }
            }

            result.push(entry);

            if options.length.map_or(false, |length| result.len() >= length) {
                break;
            }
        }

        result
    }
}
