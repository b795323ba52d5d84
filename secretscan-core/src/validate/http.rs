//! C5: the declarative HTTP-request validator template that powers most
//! concrete credential validators — each one differs only in endpoint,
//! header layout, and which response codes count as "authenticated".

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use tracing::{instrument, warn};

use crate::cancel::CancellationToken;
use crate::secret::{Secret, ValidationError, ValidationOutcome, ValidationStatus};

use super::Validator;

/// One candidate URL for a secret of type `S`: either fixed, or derived from
/// the secret's fields (e.g. a workspace-specific host).
pub enum Endpoint<S> {
    Static(String),
    Func(Box<dyn Fn(&S) -> Result<String, ValidationError> + Send + Sync>),
}

impl<S> Endpoint<S> {
    fn resolve(&self, secret: &S) -> Result<String, ValidationError> {
        match self {
            Endpoint::Static(url) => Ok(url.clone()),
            Endpoint::Func(f) => f(secret),
        }
    }
}

type HeaderFn<S> = Box<dyn Fn(&S) -> Vec<(String, String)> + Send + Sync>;
type BodyFn<S> = Box<dyn Fn(&S) -> Result<Option<String>, ValidationError> + Send + Sync>;
type BodyClassifier = Box<dyn Fn(&[u8]) -> Option<ValidationStatus> + Send + Sync>;

/// Declarative HTTP validator for secret type `S`.
///
/// Built with [`HttpValidator::new`] then customised via the `with_*`
/// builders; every field mirrors §4.4 of the validation design exactly.
pub struct HttpValidator<S> {
    endpoints: Vec<Endpoint<S>>,
    method: Method,
    headers: HeaderFn<S>,
    body: BodyFn<S>,
    valid_codes: HashSet<u16>,
    invalid_codes: HashSet<u16>,
    status_from_body: Option<BodyClassifier>,
    client: Arc<reqwest::Client>,
}

impl<S: Secret> HttpValidator<S> {
    pub fn new(endpoint: Endpoint<S>, method: Method, client: Arc<reqwest::Client>) -> Self {
        Self {
            endpoints: vec![endpoint],
            method,
            headers: Box::new(|_| Vec::new()),
            body: Box::new(|_| Ok(None)),
            valid_codes: HashSet::from([StatusCode::OK.as_u16()]),
            invalid_codes: HashSet::from([
                StatusCode::UNAUTHORIZED.as_u16(),
                StatusCode::FORBIDDEN.as_u16(),
            ]),
            status_from_body: None,
            client,
        }
    }

    /// Additional endpoints to retry, in order, when an earlier one reports
    /// `Invalid`. The first `Valid` wins; if none succeed, the last result is
    /// returned.
    pub fn with_fallback_endpoints(mut self, endpoints: Vec<Endpoint<S>>) -> Self {
        self.endpoints.extend(endpoints);
        self
    }

    pub fn with_headers(mut self, headers: impl Fn(&S) -> Vec<(String, String)> + Send + Sync + 'static) -> Self {
        self.headers = Box::new(headers);
        self
    }

    pub fn with_body(
        mut self,
        body: impl Fn(&S) -> Result<Option<String>, ValidationError> + Send + Sync + 'static,
    ) -> Self {
        self.body = Box::new(body);
        self
    }

    pub fn with_valid_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.valid_codes = codes.into_iter().collect();
        self
    }

    pub fn with_invalid_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.invalid_codes = codes.into_iter().collect();
        self
    }

    pub fn with_status_from_body(
        mut self,
        classifier: impl Fn(&[u8]) -> Option<ValidationStatus> + Send + Sync + 'static,
    ) -> Self {
        self.status_from_body = Some(Box::new(classifier));
        self
    }

    #[instrument(skip(self, secret, cancel), fields(kind = %secret.kind()))]
    async fn validate_one_endpoint(&self, endpoint: &Endpoint<S>, secret: &S, cancel: &CancellationToken) -> ValidationOutcome {
        let url = match endpoint.resolve(secret) {
            Ok(url) if !url.is_empty() => url,
            Ok(_) => {
                return ValidationOutcome::invalid_with(ValidationError::EndpointBuild(
                    "endpoint resolved to an empty URL".to_string(),
                ))
            }
            Err(err) => return ValidationOutcome::invalid_with(err),
        };

        let mut request = self.client.request(self.method.clone(), &url);
        for (name, value) in (self.headers)(secret) {
            request = request.header(name, value);
        }
        match (self.body)(secret) {
            Ok(Some(body)) => request = request.body(body),
            Ok(None) => {}
            Err(err) => return ValidationOutcome::invalid_with(err),
        }

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return ValidationOutcome::failed(ValidationError::Cancelled),
            result = request.send() => result,
        };

        let response = match response {
            Ok(response) => response,
            Err(err) => return ValidationOutcome::failed(ValidationError::from(err)),
        };

        let status = response.status().as_u16();
        if self.valid_codes.contains(&status) {
            return ValidationOutcome::valid();
        }
        if self.invalid_codes.contains(&status) {
            return ValidationOutcome::invalid();
        }

        if let Some(classify) = &self.status_from_body {
            let body = match response.bytes().await {
                Ok(body) => body,
                Err(err) => return ValidationOutcome::failed(ValidationError::from(err)),
            };
            if let Some(resolved) = classify(&body) {
                return match resolved {
                    ValidationStatus::Valid => ValidationOutcome::valid(),
                    ValidationStatus::Invalid => ValidationOutcome::invalid(),
                    ValidationStatus::Unsupported => ValidationOutcome::unsupported(),
                    ValidationStatus::Failed => {
                        ValidationOutcome::failed(ValidationError::UnexpectedStatus(status))
                    }
                };
            }
        }

        warn!(status, url, "validator received an unclassified response status");
        ValidationOutcome::failed(ValidationError::UnexpectedStatus(status))
    }
}

#[async_trait]
impl<S: Secret> Validator<S> for HttpValidator<S> {
    async fn validate(&self, secret: &S, cancel: &CancellationToken) -> ValidationOutcome {
        if cancel.is_cancelled() {
            return ValidationOutcome::failed(ValidationError::Cancelled);
        }

        let mut last = ValidationOutcome::unsupported();
        for endpoint in &self.endpoints {
            let outcome = self.validate_one_endpoint(endpoint, secret, cancel).await;
            if matches!(outcome.status, ValidationStatus::Valid) {
                return outcome;
            }
            last = outcome;
        }
        last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::SecretKind;
    use httpmock::MockServer;
    use std::any::Any;

    #[derive(Debug, Clone)]
    struct Token(String);

    impl Secret for Token {
        fn kind(&self) -> SecretKind {
            SecretKind::GenericToken
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn client() -> Arc<reqwest::Client> {
        Arc::new(reqwest::Client::new())
    }

    #[tokio::test]
    async fn valid_status_code_reports_valid() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(httpmock::Method::GET).path("/me");
                then.status(200);
            })
            .await;

        let validator = HttpValidator::new(
            Endpoint::Static(server.url("/me")),
            Method::GET,
            client(),
        );
        let outcome = validator
            .validate(&Token("secret".to_string()), &CancellationToken::none())
            .await;
        assert_eq!(outcome.status, ValidationStatus::Valid);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn invalid_status_code_reports_invalid() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(httpmock::Method::GET).path("/me");
                then.status(401);
            })
            .await;

        let validator = HttpValidator::new(
            Endpoint::Static(server.url("/me")),
            Method::GET,
            client(),
        );
        let outcome = validator
            .validate(&Token("secret".to_string()), &CancellationToken::none())
            .await;
        assert_eq!(outcome.status, ValidationStatus::Invalid);
    }

    #[tokio::test]
    async fn fallback_endpoint_is_tried_after_invalid_first_result() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(httpmock::Method::GET).path("/first");
                then.status(401);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(httpmock::Method::GET).path("/second");
                then.status(200);
            })
            .await;

        let validator = HttpValidator::new(
            Endpoint::Static(server.url("/first")),
            Method::GET,
            client(),
        )
        .with_fallback_endpoints(vec![Endpoint::Static(server.url("/second"))]);

        let outcome = validator
            .validate(&Token("secret".to_string()), &CancellationToken::none())
            .await;
        assert_eq!(outcome.status, ValidationStatus::Valid);
    }

    #[tokio::test]
    async fn empty_endpoint_url_is_invalid() {
        let validator: HttpValidator<Token> = HttpValidator::new(
            Endpoint::Func(Box::new(|_: &Token| Ok(String::new()))),
            Method::GET,
            client(),
        );
        let outcome = validator
            .validate(&Token("secret".to_string()), &CancellationToken::none())
            .await;
        assert_eq!(outcome.status, ValidationStatus::Invalid);
    }

    #[tokio::test]
    async fn already_cancelled_token_short_circuits() {
        let validator = HttpValidator::new(
            Endpoint::Static("https://example.invalid/me".to_string()),
            Method::GET,
            client(),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = validator.validate(&Token("secret".to_string()), &cancel).await;
        assert_eq!(outcome.status, ValidationStatus::Failed);
        assert!(matches!(outcome.error, Some(ValidationError::Cancelled)));
    }

    #[tokio::test]
    async fn inconclusive_status_consults_body_classifier() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(httpmock::Method::GET).path("/me");
                then.status(403).body(r#"{"error":"expired"}"#);
            })
            .await;

        let validator = HttpValidator::new(
            Endpoint::Static(server.url("/me")),
            Method::GET,
            client(),
        )
        .with_invalid_codes([401u16])
        .with_status_from_body(|body| {
            if body.windows(7).any(|w| w == b"expired") {
                Some(ValidationStatus::Invalid)
            } else {
                None
            }
        });

        let outcome = validator
            .validate(&Token("secret".to_string()), &CancellationToken::none())
            .await;
        assert_eq!(outcome.status, ValidationStatus::Invalid);
    }
}
