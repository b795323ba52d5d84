//! The credential data model: opaque secret values carrying a runtime kind
//! tag, plus the enumerated validation outcome attached to them.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Runtime type identity for a detected credential.
///
/// Two secrets compare by kind first, then by content (§3 of the design).
/// `Custom` lets a detector introduce a new credential kind without a core
/// release, mirroring the original registry's opaque string keys while
/// keeping the common kinds `Copy` and allocation-free.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SecretKind {
    GenericToken,
    AwsAccessKeyPair,
    OAuthClientPair,
    Custom(&'static str),
}

impl fmt::Display for SecretKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretKind::GenericToken => write!(f, "generic-token"),
            SecretKind::AwsAccessKeyPair => write!(f, "aws-access-key-pair"),
            SecretKind::OAuthClientPair => write!(f, "oauth-client-pair"),
            SecretKind::Custom(name) => write!(f, "{name}"),
        }
    }
}

/// A detected, never-mutated credential value.
///
/// A concrete secret (e.g. a bearer token, or an `{id, secret, url}`
/// triple) implements this trait so it can flow through one pipeline
/// regardless of its kind. `as_any` is what lets the Validation Engine's
/// generic wrapper ([`crate::validate::ValidatorAdapter`]) recover the
/// concrete type a strongly-typed `Validator<S>` expects.
pub trait Secret: fmt::Debug + Send + Sync + 'static {
    fn kind(&self) -> SecretKind;

    fn as_any(&self) -> &dyn Any;
}

/// Enumerated validation outcome. Attached once to a secret, never revised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    Valid,
    Invalid,
    Unsupported,
    Failed,
}

/// The taxonomy of §7: every failure a validator can report maps to one of
/// these, which in turn determines the attached [`ValidationStatus`].
#[derive(Debug, Error, Clone)]
pub enum ValidationError {
    #[error("validation cancelled")]
    Cancelled,

    #[error("could not build validator endpoint: {0}")]
    EndpointBuild(String),

    #[error("http transport error: {0}")]
    HttpTransport(Arc<reqwest::Error>),

    #[error("unexpected response status {0}")]
    UnexpectedStatus(u16),
}

impl From<reqwest::Error> for ValidationError {
    fn from(err: reqwest::Error) -> Self {
        ValidationError::HttpTransport(Arc::new(err))
    }
}

/// Status plus optional underlying error, as returned by `Validate`.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub status: ValidationStatus,
    pub error: Option<ValidationError>,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self {
            status: ValidationStatus::Valid,
            error: None,
        }
    }

    pub fn invalid() -> Self {
        Self {
            status: ValidationStatus::Invalid,
            error: None,
        }
    }

    pub fn unsupported() -> Self {
        Self {
            status: ValidationStatus::Unsupported,
            error: None,
        }
    }

    pub fn failed(error: ValidationError) -> Self {
        Self {
            status: ValidationStatus::Failed,
            error: Some(error),
        }
    }

    pub fn invalid_with(error: ValidationError) -> Self {
        Self {
            status: ValidationStatus::Invalid,
            error: Some(error),
        }
    }
}
