//! Interning of states by structural equivalence.
//!
//! The registry lives only while a build is running. Candidates are probed
//! by content hash; a hash match is confirmed with a deep equality check, so
//! a colliding hash costs time but never correctness.

use hashbrown::HashTable;

use super::pool::{StateId, StatePool};

/// Hash table of canonical states. Entries keep the hash they were inserted
/// under so the table can rehash without consulting the pool.
pub(crate) struct Registry {
    table: HashTable<(StateId, u64)>,
    collisions: u64,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Registry {
            table: HashTable::new(),
            collisions: 0,
        }
    }

    /// Looks `id` up by structural equivalence. Returns the canonical state
    /// when an equivalent one is already interned; otherwise interns `id`
    /// itself and returns `None`.
    pub(crate) fn find_or_insert(
        &mut self,
        id: StateId,
        pool: &mut StatePool,
        words: &[Vec<u8>],
    ) -> Option<StateId> {
        let hash = pool[id].content_hash(words);
        let pool = &*pool;
        let mut collisions = 0;
        let found = self
            .table
            .find(hash, |&(candidate, stored)| {
                if stored != hash {
                    return false;
                }
                if pool[candidate].equivalent(&pool[id], words) {
                    true
                } else {
                    collisions += 1;
                    false
                }
            })
            .map(|&(candidate, _)| candidate);
        self.collisions += collisions;

        if found.is_none() {
            self.table.insert_unique(hash, (id, hash), |&(_, stored)| stored);
        }
        found
    }

    /// Hash-equal probes that failed the deep equality check.
    pub(crate) fn collisions(&self) -> u64 {
        self.collisions
    }
}
