//! Pure, deterministic graph algorithms over an entry set: head/tail
//! discovery (C5) and the sort-stable descending walk (C6) that append,
//! `values()`, and the iterator all build on.

use crate::block_store::Hash;
use crate::comparator::Comparator;
use crate::entry::Entry;
use crate::entry_map::OrderedMap;
use std::collections::HashSet;

/// Entries in `entries` that no other entry in `entries` lists in its `next`
/// — the current tips of the DAG. Sorted by clock id (author public key)
/// ascending for a stable, deterministic result.
pub fn find_heads(entries: &OrderedMap<Entry>) -> Vec<Entry> {
    let referenced: HashSet<Hash> = entries
        .slice()
        .iter()
        .flat_map(|e| e.next().iter().copied())
        .collect();

    let mut heads: Vec<Entry> = entries
        .slice()
        .into_iter()
        .filter(|e| !referenced.contains(&e.hash()))
        .cloned()
        .collect();
    heads.sort_by(|a, b| a.clock().id().cmp(b.clock().id()));
    heads
}

/// Entries with no predecessors, or with a predecessor this log hasn't seen
/// yet — the boundary where the locally known DAG is incomplete. Deduplicated
/// preserving first occurrence.
pub fn find_tails(entries: &OrderedMap<Entry>) -> Vec<Entry> {
    let mut seen = HashSet::new();
    let mut tails = Vec::new();
    for e in entries.slice() {
        let is_tail = e.next().is_empty() || e.next().iter().any(|n| !entries.has(n));
        if is_tail && seen.insert(e.hash()) {
            tails.push(e.clone());
        }
    }
    tails
}

/// The hash of each entry having at least one `next` hash absent from
/// `entries`, in reverse discovery order. Deliberately does not replicate the
/// historical out-of-bounds `next[len - i]` indexing bug some implementations
/// carry (see DESIGN.md) — this walks `next` forward and reverses the result.
pub fn find_tail_hashes(entries: &OrderedMap<Entry>) -> Vec<Hash> {
    let mut hashes = Vec::new();
    for e in entries.slice() {
        if e.next().iter().any(|n| !entries.has(n)) {
            hashes.push(e.hash());
        }
    }
    hashes.reverse();
    hashes
}

/// Deterministic descending walk of `entries` reachable from `roots`.
///
/// The stack is re-sorted (descending under `cmp`) on every push, so the next
/// entry popped is always the comparator-maximum among the currently
/// reachable frontier. `amount = None` walks exhaustively; `end_hash = None`
/// never stops early.
pub fn traverse(
    roots: &[Entry],
    amount: Option<usize>,
    end_hash: Option<Hash>,
    entries: &OrderedMap<Entry>,
    cmp: &Comparator,
) -> Vec<Entry> {
    let mut stack: Vec<Entry> = roots.to_vec();
    stack.sort_by(|a, b| cmp(b, a));

    let mut traversed: HashSet<Hash> = HashSet::new();
    let mut result = Vec::new();
    let mut count = 0usize;

    while !stack.is_empty() && amount.map_or(true, |a| count < a) {
        let e = stack.remove(0);
        count += 1;
        let hash = e.hash();

        for n in e.next() {
            if let Some(predecessor) = entries.get(n) {
                if !traversed.contains(n) {
                    stack.insert(0, predecessor.clone());
                    stack.sort_by(|a, b| cmp(b, a));
                    traversed.insert(*n);
                }
            }
        }

        result.push(e);

        if end_hash == Some(hash) {
            break;
        }
    }

    result
}
