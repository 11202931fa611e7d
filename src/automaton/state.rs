//! A single automaton state: outgoing transitions, the final flag, and the
//! right-language annotation that backs the completion query.
//!
//! The right language is not stored as strings. Each entry is a
//! `(word, offset)` pair into the automaton's word list, so many states can
//! share one alphabet of annotations and a state stays small no matter how
//! long its completions are.

use std::hash::Hasher;

use rustc_hash::FxHasher;
use smallvec::SmallVec;

use super::pool::StateId;

/// One right-language entry: the completion is `words[word][offset..]`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct Suffix {
    pub(crate) word: u32,
    pub(crate) offset: u32,
}

/// A node of the automaton DAG.
///
/// Transitions are kept sorted by byte, which gives deterministic lookup
/// and a content hash that does not depend on insertion order. The two
/// hash fields memoize the expensive parts of the content hash; `None`
/// means the value is stale and must be recomputed.
#[derive(Default)]
pub(crate) struct State {
    transitions: SmallVec<[(u8, StateId); 4]>,
    suffixes: SmallVec<[Suffix; 4]>,
    is_final: bool,
    hash_transitions: Option<u64>,
    hash_suffixes: Option<u64>,
}

impl State {
    /// Returns the child reached by `byte`, if any.
    #[inline]
    pub(crate) fn find_child(&self, byte: u8) -> Option<StateId> {
        self.transitions
            .binary_search_by_key(&byte, |&(b, _)| b)
            .ok()
            .map(|at| self.transitions[at].1)
    }

    /// Adds a transition. The byte must not already have one.
    pub(crate) fn add_child(&mut self, byte: u8, child: StateId) {
        let at = self.transitions.partition_point(|&(b, _)| b < byte);
        debug_assert!(
            self.transitions.get(at).map_or(true, |&(b, _)| b != byte),
            "transition already exists"
        );
        self.transitions.insert(at, (byte, child));
        self.hash_transitions = None;
    }

    /// Redirects an existing transition to `child`.
    pub(crate) fn replace_child(&mut self, byte: u8, child: StateId) {
        let at = self
            .transitions
            .binary_search_by_key(&byte, |&(b, _)| b)
            .expect("no transition to replace");
        self.transitions[at].1 = child;
        self.hash_transitions = None;
    }

    /// Outgoing transitions in byte order.
    #[inline]
    pub(crate) fn transitions(&self) -> impl Iterator<Item = (u8, StateId)> + '_ {
        self.transitions.iter().copied()
    }

    pub(crate) fn mark_final(&mut self) {
        self.is_final = true;
    }

    #[inline]
    pub(crate) fn is_final(&self) -> bool {
        self.is_final
    }

    /// Records that `words[word][offset..]` is a completion of every prefix
    /// landing here. At most one entry per word may exist on a state.
    pub(crate) fn append_suffix(&mut self, word: u32, offset: u32) {
        debug_assert!(
            self.suffixes.iter().all(|s| s.word != word),
            "duplicate suffix entry for one word"
        );
        self.suffixes.push(Suffix { word, offset });
        self.hash_suffixes = None;
    }

    /// Replaces the annotation wholesale; used when a fresh child derives
    /// its right language from its parent.
    pub(crate) fn set_suffixes(&mut self, suffixes: SmallVec<[Suffix; 4]>) {
        self.suffixes = suffixes;
        self.hash_suffixes = None;
    }

    #[inline]
    pub(crate) fn suffixes(&self) -> &[Suffix] {
        &self.suffixes
    }

    /// Resets the state to its freshly-allocated shape.
    pub(crate) fn clear(&mut self) {
        self.transitions.clear();
        self.suffixes.clear();
        self.is_final = false;
        self.hash_transitions = None;
        self.hash_suffixes = None;
    }

    /// The annotation materialized as byte strings, sorted and deduplicated.
    /// Two entries of distinct words may spell the same completion; the
    /// right language is the resulting set, not the multiset.
    pub(crate) fn materialized_suffixes<'w>(&self, words: &'w [Vec<u8>]) -> Vec<&'w [u8]> {
        let mut strings: Vec<&[u8]> = self
            .suffixes
            .iter()
            .map(|s| &words[s.word as usize][s.offset as usize..])
            .collect();
        strings.sort_unstable();
        strings.dedup();
        strings
    }

    /// Deep structural equality: same finality, same transitions with
    /// children compared by identity (children are already interned when
    /// this runs, so identity equals structure), and the same materialized
    /// right language.
    pub(crate) fn equivalent(&self, other: &State, words: &[Vec<u8>]) -> bool {
        self.is_final == other.is_final
            && self.transitions == other.transitions
            && self.materialized_suffixes(words) == other.materialized_suffixes(words)
    }

    /// Content hash with memoization, recomputing whichever half is stale.
    pub(crate) fn content_hash(&mut self, words: &[Vec<u8>]) -> u64 {
        let transitions = match self.hash_transitions {
            Some(hash) => hash,
            None => {
                let hash = self.transition_hash();
                self.hash_transitions = Some(hash);
                hash
            }
        };
        let suffixes = match self.hash_suffixes {
            Some(hash) => hash,
            None => {
                let hash = self.suffix_hash(words);
                self.hash_suffixes = Some(hash);
                hash
            }
        };
        combine(transitions, suffixes, self.is_final)
    }

    /// Content hash without touching the memo; for read-only callers such
    /// as the graph dump, which run after the automaton is frozen.
    pub(crate) fn fingerprint(&self, words: &[Vec<u8>]) -> u64 {
        let transitions = self.hash_transitions.unwrap_or_else(|| self.transition_hash());
        let suffixes = self.hash_suffixes.unwrap_or_else(|| self.suffix_hash(words));
        combine(transitions, suffixes, self.is_final)
    }

    fn transition_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        for &(byte, child) in &self.transitions {
            hasher.write_u8(byte);
            hasher.write_u32(child.raw());
        }
        hasher.finish()
    }

    fn suffix_hash(&self, words: &[Vec<u8>]) -> u64 {
        let mut hasher = FxHasher::default();
        for string in self.materialized_suffixes(words) {
            hasher.write_usize(string.len());
            hasher.write(string);
        }
        hasher.finish()
    }
}

fn combine(transitions: u64, suffixes: u64, is_final: bool) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write_u64(transitions);
    hasher.write_u64(suffixes);
    hasher.write_u8(u8::from(is_final));
    hasher.finish()
}

/// Right language of a fresh child reached from `parent` via `byte`: every
/// parent entry whose word continues with `byte` advances by one, except
/// entries whose word ends right after `byte` (finality covers those).
pub(crate) fn derived_suffixes(
    parent: &State,
    byte: u8,
    words: &[Vec<u8>],
) -> SmallVec<[Suffix; 4]> {
    parent
        .suffixes()
        .iter()
        .filter(|s| {
            let word = &words[s.word as usize];
            word[s.offset as usize] == byte && (s.offset as usize) + 1 < word.len()
        })
        .map(|s| Suffix {
            word: s.word,
            offset: s.offset + 1,
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::automaton::pool::StatePool;

    fn words(list: &[&str]) -> Vec<Vec<u8>> {
        list.iter().map(|w| w.as_bytes().to_vec()).collect()
    }

    #[test]
    fn children_stay_in_byte_order() {
        let mut pool = StatePool::new();
        let a = pool.allocate();
        let b = pool.allocate();
        let c = pool.allocate();

        let mut state = State::default();
        state.add_child(b'm', a);
        state.add_child(b'a', b);
        state.add_child(b'z', c);

        let order: Vec<u8> = state.transitions().map(|(byte, _)| byte).collect();
        assert_eq!(order, vec![b'a', b'm', b'z']);
        assert_eq!(state.find_child(b'm'), Some(a));
        assert_eq!(state.find_child(b'q'), None);
    }

    #[test]
    fn replace_child_rewires_one_edge() {
        let mut pool = StatePool::new();
        let a = pool.allocate();
        let b = pool.allocate();

        let mut state = State::default();
        state.add_child(b'x', a);
        state.replace_child(b'x', b);
        assert_eq!(state.find_child(b'x'), Some(b));
    }

    #[test]
    fn hash_ignores_insertion_order() {
        let lexicon = words(&[]);
        let mut pool = StatePool::new();
        let a = pool.allocate();
        let b = pool.allocate();

        let mut first = State::default();
        first.add_child(b'a', a);
        first.add_child(b'b', b);

        let mut second = State::default();
        second.add_child(b'b', b);
        second.add_child(b'a', a);

        assert_eq!(first.content_hash(&lexicon), second.content_hash(&lexicon));
        assert!(first.equivalent(&second, &lexicon));
    }

    #[test]
    fn hash_tracks_mutation() {
        let lexicon = words(&["ab"]);
        let mut pool = StatePool::new();
        let child = pool.allocate();

        let mut state = State::default();
        let before = state.content_hash(&lexicon);
        state.add_child(b'a', child);
        let with_child = state.content_hash(&lexicon);
        assert_ne!(before, with_child);

        state.append_suffix(0, 0);
        assert_ne!(with_child, state.content_hash(&lexicon));
    }

    #[test]
    fn right_language_compares_as_a_set() {
        // "x" is reachable as a completion through two different words; a
        // state annotated with both must equal a state annotated with one.
        let lexicon = words(&["ax", "bx"]);

        let mut doubled = State::default();
        doubled.append_suffix(0, 1);
        doubled.append_suffix(1, 1);

        let mut single = State::default();
        single.append_suffix(0, 1);

        assert_eq!(
            doubled.materialized_suffixes(&lexicon),
            vec![b"x".as_slice()]
        );
        assert!(doubled.equivalent(&single, &lexicon));

        let mut hashed_doubled = doubled;
        let mut hashed_single = single;
        assert_eq!(
            hashed_doubled.content_hash(&lexicon),
            hashed_single.content_hash(&lexicon)
        );
    }

    #[test]
    fn finality_breaks_equivalence() {
        let lexicon = words(&[]);
        let plain = State::default();
        let mut terminal = State::default();
        terminal.mark_final();
        assert!(!plain.equivalent(&terminal, &lexicon));
    }

    #[test]
    fn derived_suffixes_follow_one_byte() {
        let lexicon = words(&["tap", "taps", "top"]);
        let mut parent = State::default();
        parent.append_suffix(0, 1); // "ap"
        parent.append_suffix(1, 1); // "aps"
        parent.append_suffix(2, 1); // "op"

        let via_a = derived_suffixes(&parent, b'a', &lexicon);
        // Both "tap" and "taps" still have bytes left after the 'a'.
        assert_eq!(via_a.len(), 2);
        assert!(via_a.contains(&Suffix { word: 0, offset: 2 }));
        assert!(via_a.contains(&Suffix { word: 1, offset: 2 }));

        let via_o = derived_suffixes(&parent, b'o', &lexicon);
        assert_eq!(via_o.to_vec(), vec![Suffix { word: 2, offset: 2 }]);

        let via_z = derived_suffixes(&parent, b'z', &lexicon);
        assert!(via_z.is_empty());
    }

    #[test]
    fn clear_resets_everything() {
        let lexicon = words(&["ab"]);
        let mut pool = StatePool::new();
        let child = pool.allocate();

        let mut state = State::default();
        state.add_child(b'a', child);
        state.append_suffix(0, 0);
        state.mark_final();
        state.clear();

        assert!(!state.is_final());
        assert!(state.transitions().next().is_none());
        assert!(state.suffixes().is_empty());
        assert_eq!(
            state.content_hash(&lexicon),
            State::default().content_hash(&lexicon)
        );
    }
}
