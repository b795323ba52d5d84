//! Validators: async verifiers that take a typed secret and report whether
//! it is still live against its issuing service.

pub mod engine;
pub mod http;

use async_trait::async_trait;

use crate::cancel::CancellationToken;
use crate::secret::{Secret, ValidationOutcome};

/// A strongly-typed validator for one concrete secret type `S`.
///
/// Implementors are the ~30 near-identical HTTP calls the declarative
/// [`http::HttpValidator`] exists to avoid hand-writing; most credential
/// kinds never need a bespoke impl of this trait at all.
#[async_trait]
pub trait Validator<S: Secret>: Send + Sync {
    async fn validate(&self, secret: &S, cancel: &CancellationToken) -> ValidationOutcome;
}

/// Type-erased validator, so a [`engine::ValidationEngine`] can hold
/// heterogeneous validators in one registry keyed by [`crate::secret::SecretKind`].
#[async_trait]
pub trait ErasedValidator: Send + Sync {
    async fn validate_erased(&self, secret: &dyn Secret, cancel: &CancellationToken) -> ValidationOutcome;
}

/// Adapts a `Validator<S>` into an `ErasedValidator` by downcasting the
/// incoming `&dyn Secret` back to `&S` via `Any`. The downcast only fails if
/// the engine is asked to validate a secret under the wrong kind — a caller
/// bug, not a runtime condition this adapter needs to recover gracefully
/// from beyond reporting `Unsupported`.
pub struct ValidatorAdapter<S, V> {
    inner: V,
    _secret: std::marker::PhantomData<fn() -> S>,
}

impl<S, V> ValidatorAdapter<S, V>
where
    S: Secret,
    V: Validator<S>,
{
    pub fn new(inner: V) -> Self {
        Self {
            inner,
            _secret: std::marker::PhantomData,
        }
    }
}

#[async_trait]
impl<S, V> ErasedValidator for ValidatorAdapter<S, V>
where
    S: Secret,
    V: Validator<S>,
{
    async fn validate_erased(&self, secret: &dyn Secret, cancel: &CancellationToken) -> ValidationOutcome {
        match secret.as_any().downcast_ref::<S>() {
            Some(concrete) => self.inner.validate(concrete, cancel).await,
            None => ValidationOutcome::unsupported(),
        }
    }
}
