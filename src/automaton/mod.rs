//! Minimal acyclic word automaton with prefix completion.
//!
//! [`Automaton`] recognizes a fixed lexicon of byte strings and answers,
//! for any prefix, the set of completions present in the lexicon. It is
//! built in one pass over the sorted word list with the incremental
//! construction of Daciuk, Mihov, Watson, and Watson: consecutive words
//! share a maximal common prefix, so the part of the previous word that the
//! current word does not share is already complete and can be merged with
//! structurally equivalent subgraphs straight away.
//!
//! On top of the classic construction, every state carries its right
//! language as `(word, offset)` pairs into the word list. A completion
//! query walks the prefix and materializes the landing state's annotation,
//! so its cost is the prefix length plus the output size, never a scan of
//! the lexicon.

pub mod dump;
pub(crate) mod pool;
pub(crate) mod registry;
pub(crate) mod state;

pub use dump::{DotWriter, GraphDump};

use std::collections::BTreeSet;
use std::fmt;

use hashbrown::HashSet;

use pool::{StateId, StatePool};
use registry::Registry;
use state::derived_suffixes;

/// A frozen prefix-completion automaton over a byte-string lexicon.
///
/// Build it once with [`build_from_word_list`](Automaton::build_from_word_list)
/// (or the copying [`build_from_words`](Automaton::build_from_words)), then
/// query it from as many readers as you like; queries take `&self` and touch
/// no hidden state.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeSet;
/// use autocomplete::automaton::Automaton;
///
/// let mut automaton = Automaton::new();
/// automaton.build_from_words(["tap", "taps", "top"]);
///
/// let mut completions = BTreeSet::new();
/// assert!(automaton.suffixes_for_prefix(b"ta", &mut completions));
/// assert_eq!(completions.len(), 2); // "p" and "ps"
/// assert!(!automaton.suffixes_for_prefix(b"z", &mut BTreeSet::new()));
/// ```
pub struct Automaton {
    words: Vec<Vec<u8>>,
    pool: StatePool,
    root: StateId,
    total_symbols: usize,
    collisions: u64,
}

impl Automaton {
    /// An empty automaton: one non-final root, no transitions, no words.
    pub fn new() -> Self {
        let mut pool = StatePool::new();
        let root = pool.allocate();
        Automaton {
            words: Vec::new(),
            pool,
            root,
            total_symbols: 0,
            collisions: 0,
        }
    }

    /// Resets to the empty automaton, ready for another build.
    pub fn clear(&mut self) {
        *self = Automaton::new();
    }

    /// Builds the automaton from `words`, taking ownership of the list.
    ///
    /// The list is sorted and deduplicated first; any previous contents of
    /// the automaton are discarded. An empty word is accepted and marks the
    /// root final, so `""` completes to itself.
    pub fn build_from_word_list(&mut self, mut words: Vec<Vec<u8>>) {
        self.clear();
        words.sort_unstable();
        words.dedup();
        self.words = words;
        self.build();
    }

    /// Builds the automaton from anything that yields byte strings,
    /// copying each word.
    pub fn build_from_words<W, I>(&mut self, words: I)
    where
        W: AsRef<[u8]>,
        I: IntoIterator<Item = W>,
    {
        self.build_from_word_list(words.into_iter().map(|w| w.as_ref().to_vec()).collect());
    }

    fn build(&mut self) {
        let root = self.root;
        let Self {
            words,
            pool,
            total_symbols,
            collisions,
            ..
        } = self;
        let words: &[Vec<u8>] = words;

        let mut registry = Registry::new();
        let mut last_tail: Option<(StateId, usize, usize)> = None;

        for index in 0..words.len() {
            *total_symbols += words[index].len();
            if words[index].is_empty() {
                pool[root].mark_final();
                continue;
            }

            let (divergence, consumed) = walk_prefix(pool, words, root, index);
            if consumed == words[index].len() {
                pool[divergence].mark_final();
            }

            // The previous word's path below the divergence point will never
            // be extended again, so it can be merged now.
            if index > 0 {
                minimize_tail(pool, words, &mut registry, divergence, index - 1, consumed);
            }

            if consumed < words[index].len() {
                create_suffix_chain(pool, words, divergence, index, consumed);
            }
            last_tail = Some((divergence, index, consumed));
        }

        if let Some((divergence, index, consumed)) = last_tail {
            minimize_tail(pool, words, &mut registry, divergence, index, consumed);
        }

        *collisions = registry.collisions();
    }

    /// The `index`-th word of the retained (sorted, deduplicated) lexicon.
    pub fn word(&self, index: usize) -> &[u8] {
        debug_assert!(index < self.words.len());
        &self.words[index]
    }

    /// Inserts into `out` every completion of `prefix` found in the lexicon,
    /// including the empty completion when `prefix` is itself a word.
    ///
    /// Returns `false`, leaving `out` untouched, when no word starts with
    /// `prefix`.
    pub fn suffixes_for_prefix(&self, prefix: &[u8], out: &mut BTreeSet<Vec<u8>>) -> bool {
        let Some(id) = self.find_state(prefix) else {
            return false;
        };
        let state = &self.pool[id];
        if !state.is_final() && state.suffixes().is_empty() {
            // Only the root of an empty automaton ever lands here.
            return false;
        }
        if state.is_final() {
            out.insert(Vec::new());
        }
        for suffix in state.suffixes() {
            out.insert(self.words[suffix.word as usize][suffix.offset as usize..].to_vec());
        }
        true
    }

    /// Number of live states, the retired ones excluded.
    pub fn number_of_states(&self) -> usize {
        self.pool.live_states()
    }

    /// Number of retained words.
    pub fn number_of_words(&self) -> usize {
        self.words.len()
    }

    /// Total byte count across the retained words.
    pub fn number_of_total_symbols(&self) -> usize {
        self.total_symbols
    }

    /// Registry probes during the last build where the hash matched but the
    /// deep equality check did not.
    pub fn build_collisions(&self) -> u64 {
        self.collisions
    }

    /// Deep audit of the built automaton: every prefix of every word must
    /// produce exactly the completions the word list says, the graph must be
    /// acyclic, and no retired state may be reachable.
    ///
    /// The audit only runs under `debug_assertions`; release builds return
    /// `true` unconditionally.
    pub fn verify(&self) -> bool {
        if cfg!(debug_assertions) {
            self.deep_audit()
        } else {
            true
        }
    }

    /// Reports every transition to `dump`, once, in depth-first order from
    /// the root. Node labels combine the state's content hash with its
    /// finality; sink failures are the sink's problem.
    pub fn dump_graph(&self, dump: &mut dyn GraphDump) {
        dump.start();
        let mut visited = HashSet::new();
        self.dump_state(self.root, dump, &mut visited);
        dump.done();
    }

    fn find_state(&self, prefix: &[u8]) -> Option<StateId> {
        prefix
            .iter()
            .try_fold(self.root, |state, &byte| self.pool[state].find_child(byte))
    }

    fn dump_state(&self, id: StateId, dump: &mut dyn GraphDump, visited: &mut HashSet<StateId>) {
        if !visited.insert(id) {
            return;
        }
        let from = self.state_label(id);
        for (byte, child) in self.pool[id].transitions() {
            dump.add_edge(&from, &self.state_label(child), &edge_label(byte));
            self.dump_state(child, dump, visited);
        }
    }

    fn state_label(&self, id: StateId) -> String {
        let state = &self.pool[id];
        format!(
            "{:016x}-{}",
            state.fingerprint(&self.words),
            u8::from(state.is_final())
        )
    }

    fn deep_audit(&self) -> bool {
        let mut tested: HashSet<&[u8]> = HashSet::new();
        for word in &self.words {
            for cut in 1..=word.len() {
                let prefix = &word[..cut];
                if !tested.insert(prefix) {
                    continue;
                }
                if !self.audit_prefix(prefix) {
                    return false;
                }
            }
        }

        let mut on_path = HashSet::new();
        if !self.acyclic_from(self.root, &mut on_path) {
            return false;
        }

        let mut reachable = HashSet::new();
        self.collect_reachable(self.root, &mut reachable);
        self.pool.retired().all(|id| !reachable.contains(&id))
    }

    fn audit_prefix(&self, prefix: &[u8]) -> bool {
        // The word list is sorted, so all words sharing the prefix form one
        // contiguous run.
        let mut expected = BTreeSet::new();
        let run = self.words.partition_point(|w| w.as_slice() < prefix);
        for word in self.words[run..].iter().take_while(|w| w.starts_with(prefix)) {
            expected.insert(word[prefix.len()..].to_vec());
        }

        let mut actual = BTreeSet::new();
        self.suffixes_for_prefix(prefix, &mut actual) && actual == expected
    }

    fn acyclic_from(&self, id: StateId, on_path: &mut HashSet<StateId>) -> bool {
        if !on_path.insert(id) {
            return false;
        }
        for (_, child) in self.pool[id].transitions() {
            if !self.acyclic_from(child, on_path) {
                return false;
            }
        }
        on_path.remove(&id);
        true
    }

    fn collect_reachable(&self, id: StateId, reachable: &mut HashSet<StateId>) {
        if !reachable.insert(id) {
            return;
        }
        for (_, child) in self.pool[id].transitions() {
            self.collect_reachable(child, reachable);
        }
    }
}

impl Default for Automaton {
    fn default() -> Self {
        Automaton::new()
    }
}

impl fmt::Debug for Automaton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Automaton")
            .field("words", &self.number_of_words())
            .field("states", &self.number_of_states())
            .field("symbols", &self.number_of_total_symbols())
            .finish()
    }
}

/// Follows `words[index]` from the root as far as existing transitions
/// allow, annotating every visited state with the word's continuation.
/// Returns the last state reached and the number of bytes consumed.
fn walk_prefix(
    pool: &mut StatePool,
    words: &[Vec<u8>],
    root: StateId,
    index: usize,
) -> (StateId, usize) {
    let word = &words[index];
    let mut current = root;
    let mut consumed = 0;
    while consumed < word.len() {
        pool[current].append_suffix(index as u32, consumed as u32);
        match pool[current].find_child(word[consumed]) {
            Some(child) => {
                current = child;
                consumed += 1;
            }
            None => break,
        }
    }
    (current, consumed)
}

/// Allocates a state per remaining byte of `words[index]`, deriving each
/// right language from its parent, and marks the last state final.
fn create_suffix_chain(
    pool: &mut StatePool,
    words: &[Vec<u8>],
    start: StateId,
    index: usize,
    offset: usize,
) {
    let mut current = start;
    for position in offset..words[index].len() {
        let byte = words[index][position];
        let child = pool.allocate();
        let inherited = derived_suffixes(&pool[current], byte, words);
        pool[child].set_suffixes(inherited);
        pool[current].add_child(byte, child);
        current = child;
    }
    pool[current].mark_final();
}

/// Interns the chain of states spelling `words[index][offset..]` below
/// `start`, bottom-up. A state whose structural twin is already interned is
/// replaced in its parent and retired; children are processed first because
/// a state's identity depends on its children already being canonical.
fn minimize_tail(
    pool: &mut StatePool,
    words: &[Vec<u8>],
    registry: &mut Registry,
    start: StateId,
    index: usize,
    offset: usize,
) {
    let Some(&byte) = words[index].get(offset) else {
        return;
    };
    let Some(child) = pool[start].find_child(byte) else {
        return;
    };
    minimize_tail(pool, words, registry, child, index, offset + 1);

    if let Some(canonical) = registry.find_or_insert(child, pool, words) {
        debug_assert_eq!(pool[child].is_final(), pool[canonical].is_final());
        pool[start].replace_child(byte, canonical);
        pool.retire(child);
    }
}

fn edge_label(byte: u8) -> String {
    if byte.is_ascii_graphic() {
        (byte as char).to_string()
    } else {
        format!("0x{byte:02x}")
    }
}
