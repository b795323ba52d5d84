//! C2: the regex-to-secret adapter used by the large majority of detectors.

use std::marker::PhantomData;

use regex::bytes::Regex;

use crate::secret::Secret;

use super::{Detector, RawMatch};

/// A detector that maps every non-overlapping match of a single compiled
/// regex to a secret, via a caller-supplied constructor.
///
/// `from_match` returning `None` drops the match — used to apply semantic
/// filters a regex alone can't express (e.g. "must start with the right
/// prefix", or a checksum the regex can't encode).
pub struct SimpleTokenDetector<S, F> {
    regex: Regex,
    max_len: usize,
    from_match: F,
    _secret: PhantomData<fn() -> S>,
}

impl<S, F> SimpleTokenDetector<S, F>
where
    S: Secret,
    F: Fn(&[u8]) -> Option<S> + Send + Sync,
{
    pub fn new(regex: Regex, max_len: usize, from_match: F) -> Self {
        Self {
            regex,
            max_len,
            from_match,
            _secret: PhantomData,
        }
    }
}

impl<S, F> Detector for SimpleTokenDetector<S, F>
where
    S: Secret,
    F: Fn(&[u8]) -> Option<S> + Send + Sync,
{
    fn detect(&self, data: &[u8]) -> Vec<(Box<dyn Secret>, usize)> {
        self.regex
            .find_iter(data)
            .filter_map(|m| {
                (self.from_match)(m.as_bytes())
                    .map(|secret| (Box::new(secret) as Box<dyn Secret>, m.start()))
            })
            .collect()
    }

    fn max_secret_len(&self) -> usize {
        self.max_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::SecretKind;
    use std::any::Any;

    #[derive(Debug, PartialEq, Eq)]
    struct Token(Vec<u8>);

    impl Secret for Token {
        fn kind(&self) -> SecretKind {
            SecretKind::GenericToken
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn detector() -> SimpleTokenDetector<Token, impl Fn(&[u8]) -> Option<Token>> {
        SimpleTokenDetector::new(Regex::new(r"FOO").unwrap(), 3, |bytes| {
            Some(Token(bytes.to_vec()))
        })
    }

    #[test]
    fn finds_every_non_overlapping_match() {
        let d = detector();
        let out = d.detect(b"aaFOOaFOOaabFOOab");
        let positions: Vec<usize> = out.iter().map(|(_, pos)| *pos).collect();
        assert_eq!(positions, vec![2, 6, 12]);
    }

    #[test]
    fn from_match_rejection_drops_the_hit() {
        let d = SimpleTokenDetector::new(Regex::new(r"FOO").unwrap(), 3, |_: &[u8]| {
            None::<Token>
        });
        assert!(d.detect(b"FOOFOO").is_empty());
    }

    #[test]
    fn max_secret_len_is_reported() {
        let d = detector();
        assert_eq!(d.max_secret_len(), 3);
    }

    #[test]
    fn positions_match_the_original_bytes() {
        let d = detector();
        let data = b"xxFOOyy";
        for (secret, pos) in d.detect(data) {
            let token = secret.as_any().downcast_ref::<Token>().unwrap();
            assert_eq!(&data[pos..pos + token.0.len()], token.0.as_slice());
        }
    }
}
