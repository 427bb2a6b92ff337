//! The total order over entries: a user-pluggable comparator (defaulting to
//! last-write-wins on the Lamport clock) decorated with a deterministic
//! fallback chain so two distinct entries never compare equal.

use crate::entry::Entry;
use crate::error::LogError;
use std::cmp::Ordering;

/// `sort_fn` as stored on a [`crate::log::Log`]: takes two entries, returns
/// their relative order.
pub type Comparator = Box<dyn Fn(&Entry, &Entry) -> Ordering>;

/// The default comparator: clock time, then clock id (author public key)
/// lexicographically.
pub fn last_write_wins(a: &Entry, b: &Entry) -> Ordering {
    match a.clock().time().cmp(&b.clock().time()) {
        Ordering::Equal => a.clock().id().cmp(b.clock().id()),
        ord => ord,
    }
}

/// Decorates `inner` with a deterministic fallback: if `inner` calls it a
/// tie, compare `payload` bytes, then `hash` bytes. Since two distinct,
/// content-addressed entries always differ in `hash`, this chain always
/// terminates in a definite order.
pub fn no_zeroes<F>(inner: F) -> Comparator
where
    F: Fn(&Entry, &Entry) -> Ordering + 'static,
{
    Box::new(move |a, b| {
        let primary = inner(a, b);
        if primary != Ordering::Equal {
            return primary;
        }
        let by_payload = a.payload().cmp(b.payload());
        if by_payload != Ordering::Equal {
            return by_payload;
        }
        a.hash().cmp(&b.hash())
    })
}

/// Runs `cmp` and reports [`LogError::AmbiguousOrder`] if it returns `Equal`
/// for two entries that are not in fact the same entry. Unreachable in
/// practice once a comparator has passed through [`no_zeroes`] — kept as a
/// defensive check at the handful of call sites where ambiguity would
/// silently corrupt ordering rather than just being a cosmetic tie.
pub fn checked_compare(
    cmp: &dyn Fn(&Entry, &Entry) -> Ordering,
    a: &Entry,
    b: &Entry,
) -> Result<Ordering, LogError> {
    let ord = cmp(a, b);
    if ord == Ordering::Equal && a.hash() != b.hash() {
        Err(LogError::AmbiguousOrder(a.hash().to_string(), b.hash().to_string()))
    } else {
        Ok(ord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityProvider;
    use crate::block_store::MemoryBlockStore;
    use crate::identity::Ed25519Identity;
    use crate::lamport_clock::LamportClock;

    fn entry_at(store: &MemoryBlockStore, identity: &Ed25519Identity, time: u64, payload: &str) -> Entry {
        let clock = LamportClock::new(&identity.identity().public_key).set_time(time);
        Entry::create(store, identity, "log", payload.as_bytes().to_vec(), vec![], clock).unwrap()
    }

    #[test]
    fn orders_by_clock_time_first() {
        let store = MemoryBlockStore::new();
        let identity = Ed25519Identity::generate("a");
        let a = entry_at(&store, &identity, 1, "a");
        let b = entry_at(&store, &identity, 2, "b");
        assert_eq!(last_write_wins(&a, &b), Ordering::Less);
    }

    #[test]
    fn no_zeroes_breaks_ties_deterministically() {
        let store = MemoryBlockStore::new();
        let a = Ed25519Identity::generate("a");
        let b = Ed25519Identity::generate("b");
        let ea = entry_at(&store, &a, 5, "same-time-a");
        let eb = entry_at(&store, &b, 5, "same-time-b");
        let wrapped = no_zeroes(|_, _| Ordering::Equal);
        let ord = wrapped(&ea, &eb);
        assert_ne!(ord, Ordering::Equal);
        // And it is antisymmetric.
        assert_eq!(wrapped(&eb, &ea), ord.reverse());
    }

    #[test]
    fn checked_compare_accepts_a_real_tie_as_equal() {
        let store = MemoryBlockStore::new();
        let identity = Ed25519Identity::generate("a");
        let e = entry_at(&store, &identity, 1, "x");
        assert_eq!(
            checked_compare(&last_write_wins, &e, &e).unwrap(),
            Ordering::Equal
        );
    }
}
