//! C3: the composite matcher that forms higher-level secrets (e.g.
//! `client_id` + `client_secret` + `workspace_url`) from k independent
//! finders, under distance constraints and overlap-free best-subset
//! selection via weighted-interval scheduling.

use std::marker::PhantomData;

use crate::secret::Secret;

use super::{Detector, RawMatch};

/// `bytes -> [byte ranges]`; one element of an n-tuple detector.
pub type Finder = Box<dyn Fn(&[u8]) -> Vec<std::ops::Range<usize>> + Send + Sync>;

/// An ordered set of k matches, one per finder, satisfying the overlap and
/// distance invariants.
#[derive(Debug, Clone)]
pub struct Tuple {
    /// One match per finder, in finder-index order (position 0 came from
    /// `Finders[0]`, etc.) regardless of byte order in the input.
    pub matches: Vec<RawMatch>,
    pub start: usize,
    pub end: usize,
    pub total_gap: usize,
}

impl Tuple {
    fn overlaps(&self, other: &Tuple) -> bool {
        self.matches
            .iter()
            .any(|m| other.matches.iter().any(|o| m.overlaps(o)))
    }
}

/// Build a candidate tuple from one match per finder, in whatever order the
/// cartesian product produced them. Returns `None` if the candidate violates
/// the overlap or distance invariants.
fn build_tuple(mut candidate: Vec<RawMatch>, max_distance: usize) -> Option<Tuple> {
    let original_order = candidate.clone();
    candidate.sort_by_key(|m| m.start);

    for pair in candidate.windows(2) {
        if pair[0].overlaps(&pair[1]) {
            return None;
        }
        let gap = pair[1].start.saturating_sub(pair[0].end);
        if gap > max_distance {
            return None;
        }
    }

    let start = candidate.first()?.start;
    let end = candidate.last()?.end;
    let total_gap: usize = candidate
        .windows(2)
        .map(|pair| pair[1].start.saturating_sub(pair[0].end))
        .sum();

    // Restore finder-index order so FromTuple sees a fixed positional layout.
    let mut by_finder = original_order;
    by_finder.sort_by_key(|m| m.finder_index);

    Some(Tuple {
        matches: by_finder,
        start,
        end,
        total_gap,
    })
}

/// Cartesian product of one match per finder's bucket.
fn cartesian_product(buckets: &[Vec<RawMatch>]) -> Vec<Vec<RawMatch>> {
    let mut products: Vec<Vec<RawMatch>> = vec![Vec::new()];
    for bucket in buckets {
        let mut next = Vec::with_capacity(products.len() * bucket.len());
        for prefix in &products {
            for m in bucket {
                let mut combo = prefix.clone();
                combo.push(m.clone());
                next.push(combo);
            }
        }
        products = next;
    }
    products
}

/// Weighted-interval scheduling: pick the maximum-cardinality subset of
/// pairwise non-overlapping tuples, tie-breaking on minimum total gap.
/// Runs in O(n log n) via binary search for the rightmost compatible
/// predecessor once sorted by end.
fn select_best_subset(mut candidates: Vec<Tuple>) -> Vec<Tuple> {
    if candidates.is_empty() {
        return candidates;
    }
    candidates.sort_by_key(|t| t.end);
    let starts: Vec<usize> = candidates.iter().map(|t| t.start).collect();

    // dp[i] = (count, total_gap, predecessor) for the best selection ending
    // at or before candidate i that includes candidate i.
    let n = candidates.len();
    let mut dp: Vec<(usize, usize, Option<usize>)> = Vec::with_capacity(n);

    for i in 0..n {
        // Rightmost j < i with candidates[j].end <= candidates[i].start.
        let pred = candidates[..i]
            .partition_point(|probe| probe.end <= starts[i])
            .checked_sub(1);

        let (count, gap) = match pred {
            Some(p) => (dp[p].0 + 1, dp[p].1 + candidates[i].total_gap),
            None => (1, candidates[i].total_gap),
        };
        dp.push((count, gap, pred));
    }

    // Pick the best terminal state: most tuples, tie-break fewest total gap.
    let mut best_idx = 0;
    for i in 1..n {
        let (count, gap, _) = dp[i];
        let (best_count, best_gap, _) = dp[best_idx];
        if count > best_count || (count == best_count && gap < best_gap) {
            best_idx = i;
        }
    }

    let mut selected = Vec::new();
    let mut cursor = Some(best_idx);
    while let Some(i) = cursor {
        selected.push(candidates[i].clone());
        cursor = dp[i].2;
    }
    selected.reverse();
    selected
}

/// Cascading cross-finder overlap filter (step 2 of §4.2): a match from a
/// later finder that overlaps any match already accepted from an earlier
/// finder is dropped.
fn filter_cross_finder_overlaps(buckets: Vec<Vec<RawMatch>>) -> Vec<Vec<RawMatch>> {
    let mut accepted: Vec<RawMatch> = Vec::new();
    let mut filtered = Vec::with_capacity(buckets.len());
    for bucket in buckets {
        let kept: Vec<RawMatch> = bucket
            .into_iter()
            .filter(|m| !accepted.iter().any(|a| a.overlaps(m)))
            .collect();
        accepted.extend(kept.iter().cloned());
        filtered.push(kept);
    }
    filtered
}

/// Composite n-tuple detector: `k` finders, a distance rule, and semantic
/// acceptance callbacks.
pub struct NTupleDetector<S> {
    max_element_len: usize,
    max_distance: usize,
    finders: Vec<Finder>,
    from_tuple: Box<dyn Fn(&[RawMatch]) -> Option<S> + Send + Sync>,
    from_partial: Option<Box<dyn Fn(&RawMatch) -> Option<S> + Send + Sync>>,
    _secret: PhantomData<fn() -> S>,
}

impl<S: Secret> NTupleDetector<S> {
    pub fn new(
        max_element_len: usize,
        max_distance: usize,
        finders: Vec<Finder>,
        from_tuple: impl Fn(&[RawMatch]) -> Option<S> + Send + Sync + 'static,
    ) -> Self {
        Self {
            max_element_len,
            max_distance,
            finders,
            from_tuple: Box::new(from_tuple),
            from_partial: None,
            _secret: PhantomData,
        }
    }

    pub fn with_partial_fallback(
        mut self,
        from_partial: impl Fn(&RawMatch) -> Option<S> + Send + Sync + 'static,
    ) -> Self {
        self.from_partial = Some(Box::new(from_partial));
        self
    }

    fn collect_buckets(&self, data: &[u8]) -> Option<Vec<Vec<RawMatch>>> {
        let mut any_empty = false;
        let buckets: Vec<Vec<RawMatch>> = self
            .finders
            .iter()
            .enumerate()
            .map(|(idx, finder)| {
                let matches: Vec<RawMatch> = finder(data)
                    .into_iter()
                    .map(|range| RawMatch {
                        start: range.start,
                        end: range.end,
                        bytes: data[range.clone()].to_vec(),
                        finder_index: idx,
                    })
                    .collect();
                if matches.is_empty() {
                    any_empty = true;
                }
                matches
            })
            .collect();

        if any_empty && self.from_partial.is_none() {
            return None;
        }
        Some(buckets)
    }
}

impl<S: Secret> Detector for NTupleDetector<S> {
    fn detect(&self, data: &[u8]) -> Vec<(Box<dyn Secret>, usize)> {
        let buckets = match self.collect_buckets(data) {
            Some(b) => b,
            None => return Vec::new(),
        };
        let buckets = filter_cross_finder_overlaps(buckets);

        let candidates: Vec<Tuple> = cartesian_product(&buckets)
            .into_iter()
            .filter_map(|combo| build_tuple(combo, self.max_distance))
            .filter(|tuple| (self.from_tuple)(&tuple.matches).is_some())
            .collect();

        if candidates.is_empty() {
            if let Some(from_partial) = &self.from_partial {
                let mut partials: Vec<(Box<dyn Secret>, usize)> = buckets
                    .into_iter()
                    .flatten()
                    .filter_map(|m| from_partial(&m).map(|s| (Box::new(s) as Box<dyn Secret>, m.start)))
                    .collect();
                partials.sort_by_key(|(_, pos)| *pos);
                return partials;
            }
            return Vec::new();
        }

        let selected = select_best_subset(candidates);
        let mut out: Vec<(Box<dyn Secret>, usize)> = selected
            .into_iter()
            .filter_map(|tuple| {
                (self.from_tuple)(&tuple.matches).map(|secret| (Box::new(secret) as Box<dyn Secret>, tuple.start))
            })
            .collect();
        out.sort_by_key(|(_, pos)| *pos);
        out
    }

    fn max_secret_len(&self) -> usize {
        let k = self.finders.len();
        if k == 0 {
            return 0;
        }
        self.max_element_len * k + self.max_distance * k.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::SecretKind;
    use regex::bytes::Regex;
    use std::any::Any;

    #[derive(Debug, PartialEq, Eq)]
    struct Triple(String);

    impl Secret for Triple {
        fn kind(&self) -> SecretKind {
            SecretKind::Custom("triple")
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn regex_finder(pattern: &'static str) -> Finder {
        let re = Regex::new(pattern).unwrap();
        Box::new(move |data: &[u8]| re.find_iter(data).map(|m| m.start()..m.end()).collect())
    }

    fn triple_detector(max_distance: usize) -> NTupleDetector<Triple> {
        NTupleDetector::new(
            2,
            max_distance,
            vec![
                regex_finder(r"a\d"),
                regex_finder(r"b\d"),
                regex_finder(r"c\d"),
            ],
            |matches| {
                let joined = matches
                    .iter()
                    .map(|m| String::from_utf8(m.bytes.clone()).unwrap())
                    .collect::<Vec<_>>()
                    .join("-");
                Some(Triple(joined))
            },
        )
    }

    #[test]
    fn happy_path_two_tuples() {
        let d = triple_detector(1000);
        let out = d.detect(b"a1 b1 c1   a2 b2 c2");
        let rendered: Vec<(String, usize)> = out
            .into_iter()
            .map(|(s, pos)| (s.as_any().downcast_ref::<Triple>().unwrap().0.clone(), pos))
            .collect();
        assert_eq!(
            rendered,
            vec![("a1-b1-c1".to_string(), 0), ("a2-b2-c2".to_string(), 11)]
        );
    }

    #[test]
    fn distance_exclusion_yields_nothing() {
        let d = triple_detector(5);
        let out = d.detect(b"a1           b1          c1");
        assert!(out.is_empty());
    }

    #[test]
    fn missing_finder_with_no_partial_is_empty() {
        let d = NTupleDetector::new(
            2,
            1000,
            vec![regex_finder(r"a\d"), regex_finder(r"zzz_never_matches")],
            |matches| Some(Triple(format!("{:?}", matches))),
        );
        assert!(d.detect(b"a1 a2 a3").is_empty());
    }

    #[test]
    fn partial_fallback_returns_individual_matches() {
        let d = NTupleDetector::new(
            2,
            1000,
            vec![regex_finder(r"a\d"), regex_finder(r"zzz_never_matches")],
            |_matches| None::<Triple>,
        )
        .with_partial_fallback(|m| Some(Triple(String::from_utf8(m.bytes.clone()).unwrap())));

        let out = d.detect(b"a1 a2");
        let rendered: Vec<String> = out
            .into_iter()
            .map(|(s, _)| s.as_any().downcast_ref::<Triple>().unwrap().0.clone())
            .collect();
        assert_eq!(rendered, vec!["a1".to_string(), "a2".to_string()]);
    }

    #[test]
    fn max_secret_len_accounts_for_gaps() {
        let d = triple_detector(7);
        // 3 finders of max element len 2, 2 internal gaps of at most 7.
        assert_eq!(d.max_secret_len(), 2 * 3 + 7 * 2);
    }

    #[test]
    fn wis_prefers_minimum_gap_tie_break() {
        // Two finders; three 'a' matches and one 'b' match, where two
        // candidate tuples share the 'b' and would overlap if both picked,
        // forcing WIS to choose by cardinality (both single tuples, so it
        // falls back to minimum gap).
        let d = NTupleDetector::new(
            2,
            1000,
            vec![regex_finder(r"a\d"), regex_finder(r"b\d")],
            |matches| {
                let joined = matches
                    .iter()
                    .map(|m| String::from_utf8(m.bytes.clone()).unwrap())
                    .collect::<Vec<_>>()
                    .join("-");
                Some(Triple(joined))
            },
        );
        // a1 is far from b1; a2 is close to b1. Both a1-b1 and a2-b1 are
        // valid candidates but overlap on b1, so only one tuple can be
        // selected; the minimum-gap candidate (a2-b1) should win.
        let out = d.detect(b"a1          a2b1");
        let rendered: Vec<String> = out
            .into_iter()
            .map(|(s, _)| s.as_any().downcast_ref::<Triple>().unwrap().0.clone())
            .collect();
        assert_eq!(rendered, vec!["a2-b1".to_string()]);
    }
}
