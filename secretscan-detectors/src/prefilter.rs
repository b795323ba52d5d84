//! Aho-Corasick pre-filtering: skip a detector's regex scan entirely when
//! none of its cheap literal prefixes appear in the chunk.
//!
//! Concrete credential regexes nearly always start with a fixed literal
//! (`"AKIA"`, `"ghp_"`, `"sk-"`, ...); testing for those substrings with a
//! single multi-pattern automaton is far cheaper than running every
//! detector's regex over every chunk, and is the filtering strategy the
//! wider secret-scanning ecosystem uses ahead of the expensive match.

use aho_corasick::AhoCorasick;

use secretscan_core::detect::Detector;
use secretscan_core::secret::Secret;

/// Wraps a [`Detector`] with a set of literal prefixes; `detect` short-
/// circuits to an empty result unless at least one prefix occurs in the
/// input, avoiding the regex engine entirely for chunks that can't match.
pub struct PrefilteredDetector {
    prefixes: AhoCorasick,
    inner: Box<dyn Detector>,
}

impl PrefilteredDetector {
    pub fn new(prefixes: &[&str], inner: Box<dyn Detector>) -> Self {
        let prefixes = AhoCorasick::new(prefixes).expect("prefix literals must compile");
        Self { prefixes, inner }
    }
}

impl Detector for PrefilteredDetector {
    fn detect(&self, data: &[u8]) -> Vec<(Box<dyn Secret>, usize)> {
        if self.prefixes.is_match(data) {
            self.inner.detect(data)
        } else {
            Vec::new()
        }
    }

    fn max_secret_len(&self) -> usize {
        self.inner.max_secret_len()
    }
}
