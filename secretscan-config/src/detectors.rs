//! Per-detector regex and limit records.
//!
//! These feed `secretscan-detectors`' registry, which turns each record into
//! a live `secretscan_core::detect::Detector`; this crate only validates the
//! shape of the configuration, not that a pattern actually compiles (that
//! happens at registry build time, where a bad regex is a startup error).

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation;

/// A single finder's regex plus the name of the kind it produces, used by
/// both simple-token and n-tuple detectors.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct FinderConfig {
    #[validate(length(min = 1))]
    #[validate(custom(function = validation::validate_regex))]
    pub pattern: String,
}

/// Configuration for a C2 simple-token detector.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct SimpleDetectorConfig {
    /// Name of the secret kind this detector produces (e.g. `"aws-access-key"`).
    #[validate(length(min = 1))]
    pub kind: String,

    #[validate(nested)]
    pub finder: FinderConfig,

    /// Worst-case byte span of a match, used to size the engine's retention.
    #[validate(range(min = 1))]
    pub max_len: usize,

    /// Literal prefixes checked with Aho-Corasick before running the regex;
    /// empty means "always run the regex".
    #[serde(default)]
    pub prefixes: Vec<String>,
}

/// Configuration for a C3 n-tuple composite detector.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct TupleDetectorConfig {
    #[validate(length(min = 1))]
    pub kind: String,

    /// One finder per tuple element, in the positional order the resulting
    /// secret's constructor expects.
    #[validate(length(min = 2))]
    #[validate(nested)]
    pub finders: Vec<FinderConfig>,

    #[validate(range(min = 1))]
    pub max_element_len: usize,

    #[validate(range(min = 0))]
    pub max_distance: usize,

    /// Literal prefixes checked with Aho-Corasick before running any finder.
    #[serde(default)]
    pub prefixes: Vec<String>,
}

/// Either flavor of detector, as loaded from configuration.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DetectorConfig {
    Simple(SimpleDetectorConfig),
    Tuple(TupleDetectorConfig),
}

impl Validate for DetectorConfig {
    fn validate(&self) -> Result<(), validator::ValidationErrors> {
        match self {
            DetectorConfig::Simple(c) => c.validate(),
            DetectorConfig::Tuple(c) => c.validate(),
        }
    }
}
