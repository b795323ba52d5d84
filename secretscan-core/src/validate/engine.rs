//! C6: the type-indexed Validation Engine — a registry from secret kind to
//! erased validator, with "unsupported" as the default for unregistered
//! kinds.

use std::collections::HashMap;

use tracing::instrument;

use crate::cancel::CancellationToken;
use crate::secret::{Secret, SecretKind, ValidationError, ValidationOutcome};

use super::{ErasedValidator, Validator, ValidatorAdapter};

/// Registry mapping [`SecretKind`] to the validator that handles it.
///
/// Independent of any specific secret type (storage is erased), which is
/// what lets this live in the core rather than alongside each concrete
/// credential plugin.
#[derive(Default)]
pub struct ValidationEngine {
    validators: HashMap<SecretKind, Box<dyn ErasedValidator>>,
}

impl ValidationEngine {
    pub fn new() -> Self {
        Self {
            validators: HashMap::new(),
        }
    }

    /// Registers `validator` for `kind`. Returns `true` if a validator was
    /// already bound for this kind (and has now been replaced) — used by
    /// idempotency tests, not by callers needing an error on conflict.
    pub fn add_validator<S, V>(&mut self, kind: SecretKind, validator: V) -> bool
    where
        S: Secret,
        V: Validator<S> + 'static,
    {
        self.validators
            .insert(kind, Box::new(ValidatorAdapter::new(validator)))
            .is_some()
    }

    #[instrument(skip(self, secret, cancel), fields(kind = %secret.kind()))]
    pub async fn validate(&self, secret: &dyn Secret, cancel: &CancellationToken) -> ValidationOutcome {
        if cancel.is_cancelled() {
            return ValidationOutcome::failed(ValidationError::Cancelled);
        }

        match self.validators.get(&secret.kind()) {
            Some(validator) => validator.validate_erased(secret, cancel).await,
            None => ValidationOutcome::unsupported(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::ValidationStatus;
    use async_trait::async_trait;
    use std::any::Any;

    #[derive(Debug)]
    struct Token;

    impl Secret for Token {
        fn kind(&self) -> SecretKind {
            SecretKind::GenericToken
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct AlwaysValid;

    #[async_trait]
    impl Validator<Token> for AlwaysValid {
        async fn validate(&self, _secret: &Token, _cancel: &CancellationToken) -> ValidationOutcome {
            ValidationOutcome::valid()
        }
    }

    struct AlwaysInvalid;

    #[async_trait]
    impl Validator<Token> for AlwaysInvalid {
        async fn validate(&self, _secret: &Token, _cancel: &CancellationToken) -> ValidationOutcome {
            ValidationOutcome::invalid()
        }
    }

    #[tokio::test]
    async fn unregistered_kind_is_unsupported() {
        let engine = ValidationEngine::new();
        let outcome = engine.validate(&Token, &CancellationToken::none()).await;
        assert_eq!(outcome.status, ValidationStatus::Unsupported);
    }

    #[tokio::test]
    async fn registered_kind_dispatches_to_its_validator() {
        let mut engine = ValidationEngine::new();
        engine.add_validator(SecretKind::GenericToken, AlwaysValid);
        let outcome = engine.validate(&Token, &CancellationToken::none()).await;
        assert_eq!(outcome.status, ValidationStatus::Valid);
    }

    #[tokio::test]
    async fn re_registering_a_kind_replaces_it_and_reports_idempotency() {
        let mut engine = ValidationEngine::new();
        let was_present = engine.add_validator(SecretKind::GenericToken, AlwaysValid);
        assert!(!was_present);

        let was_present = engine.add_validator(SecretKind::GenericToken, AlwaysInvalid);
        assert!(was_present);

        let outcome = engine.validate(&Token, &CancellationToken::none()).await;
        assert_eq!(outcome.status, ValidationStatus::Invalid);
    }

    #[tokio::test]
    async fn already_cancelled_short_circuits_before_dispatch() {
        let mut engine = ValidationEngine::new();
        engine.add_validator(SecretKind::GenericToken, AlwaysValid);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = engine.validate(&Token, &cancel).await;
        assert_eq!(outcome.status, ValidationStatus::Failed);
        assert!(matches!(outcome.error, Some(ValidationError::Cancelled)));
    }
}
