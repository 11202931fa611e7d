//! # autocomplete
//!
//! Prefix completion over a minimal acyclic
//! [DAFSA](https://en.wikipedia.org/wiki/Deterministic_acyclic_finite_state_automaton)
//! (deterministic acyclic finite-state automaton), built incrementally from a
//! word list with the algorithm of
//! [Daciuk et al. (2000)](https://arxiv.org/abs/cs/0007009v1).
//!
//! Beyond plain word recognition, every state carries its right language —
//! the set of strings that complete any prefix landing there — as indices
//! into the word list. Asking for the completions of a prefix is therefore
//! one walk plus one materialization, with no traversal of the sub-graph.
//!
//! ## Quick Start
//!
//! ```
//! use std::collections::BTreeSet;
//! use autocomplete::automaton::Automaton;
//!
//! let mut automaton = Automaton::new();
//! automaton.build_from_words(["BAKE", "CAKE", "FAKE", "LAKE", "MAKE"]);
//!
//! let mut completions = BTreeSet::new();
//! assert!(automaton.suffixes_for_prefix(b"BA", &mut completions));
//! assert_eq!(completions, BTreeSet::from([b"KE".to_vec()]));
//!
//! // Unknown prefixes are reported, not errored.
//! assert!(!automaton.suffixes_for_prefix(b"AKE", &mut BTreeSet::new()));
//! ```
//!
//! Words are opaque byte strings: any single-byte encoding (or UTF-8 treated
//! as raw bytes) works, and sort order is plain byte order. The input list
//! does not have to be sorted or unique; the build normalizes it.

#![warn(missing_docs)]

/// Core automaton: states, builder, completion queries, and graph dumping.
pub mod automaton;
