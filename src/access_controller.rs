//! The append authorization policy: `can_append(entry, identity) -> ok | error`.

use crate::entry::Entry;
use crate::error::AccessError;
use crate::identity::Identity;
use std::collections::HashSet;

/// Predicate deciding whether `entry`, authored by `identity`, may be admitted
/// into a log. Implementations are consulted both on local `append` and on
/// every foreign entry a `join` proposes to insert.
pub trait AccessController {
    fn can_append(&self, entry: &Entry, identity: &Identity) -> Result<(), AccessError>;
}

/// Default policy: admits everyone.
#[derive(Debug, Default, Clone, Copy)]
pub struct PermitAll;

impl AccessController for PermitAll {
    fn can_append(&self, _entry: &Entry, _identity: &Identity) -> Result<(), AccessError> {
        Ok(())
    }
}

/// Rejects entries authored by a configured set of public keys. Exercises the
/// non-trivial branch of the contract: a policy that actually refuses someone.
#[derive(Debug, Default, Clone)]
pub struct DenyList {
    denied: HashSet<Vec<u8>>,
}

impl DenyList {
    pub fn new() -> DenyList {
        DenyList {
            denied: HashSet::new(),
        }
    }

    pub fn deny(mut self, public_key: Vec<u8>) -> DenyList {
        self.denied.insert(public_key);
        self
    }
}

impl AccessController for DenyList {
    fn can_append(&self, entry: &Entry, _identity: &Identity) -> Result<(), AccessError> {
        if self.denied.contains(entry.key()) {
            Err(AccessError::Denied(entry.identity().id.clone()))
        } else {
            Ok(())
        }
    }
}
