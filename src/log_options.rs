//! Options for constructing a [`crate::log::Log`].

use crate::comparator::Comparator;
use crate::entry::Entry;
use crate::lamport_clock::LamportClock;

/// Constructing `LogOptions::new()` creates default options: no identifier
/// (one is generated), no seed entries or heads, no starting clock, and the
/// default `last_write_wins` comparator.
///
/// Use method chaining to set additional parameters:
///
/// ```ignore
/// let opts = LogOptions::new().set_id("some_id");
/// let log = Log::new(store, identity, access_controller, opts);
/// ```
#[derive(Default)]
pub struct LogOptions {
    pub(crate) id: Option<String>,
    pub(crate) entries: Vec<Entry>,
    pub(crate) heads: Vec<Entry>,
    pub(crate) clock: Option<LamportClock>,
    pub(crate) sort_fn: Option<Comparator>,
}

impl LogOptions {
    pub fn new() -> LogOptions {
        LogOptions::default()
    }

    pub fn set_id(mut self, id: &str) -> LogOptions {
        self.id = Some(id.to_owned());
        self
    }

    /// Seeds the log with pre-existing entries (e.g. reconstructed from a
    /// fetch). Heads are recomputed from these unless `set_heads` is also
    /// given.
    pub fn set_entries(mut self, entries: Vec<Entry>) -> LogOptions {
        self.entries = entries;
        self
    }

    pub fn set_heads(mut self, heads: Vec<Entry>) -> LogOptions {
        self.heads = heads;
        self
    }

    pub fn set_clock(mut self, clock: LamportClock) -> LogOptions {
        self.clock = Some(clock);
        self
    }

    pub fn set_sort_fn<F>(mut self, sort_fn: F) -> LogOptions
    where
        F: Fn(&Entry, &Entry) -> std::cmp::Ordering + 'static,
    {
        self.sort_fn = Some(Box::new(sort_fn));
        self
    }
}
