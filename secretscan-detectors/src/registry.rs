//! Builds a ready-to-run detector list and validation engine from
//! [`secretscan_config::ScanConfig`], layering operator-configured detectors
//! on top of this crate's hand-registered built-ins.

use std::sync::Arc;

use regex::bytes::Regex;
use thiserror::Error;

use secretscan_config::{DetectorConfig, ScanConfig, ValidatorConfig};
use secretscan_core::detect::simple::SimpleTokenDetector;
use secretscan_core::detect::tuple::NTupleDetector;
use secretscan_core::detect::Detector;
use secretscan_core::secret::{SecretKind, ValidationError};
use secretscan_core::validate::engine::ValidationEngine;
use secretscan_core::validate::http::{Endpoint, HttpValidator};

use crate::builtin;
use crate::prefilter::PrefilteredDetector;
use crate::secrets::{substitute, GenericToken, GenericTuple, SecretFields};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("detector '{kind}' has an invalid pattern: {source}")]
    InvalidPattern {
        kind: String,
        #[source]
        source: regex::Error,
    },
}

/// Built-in detectors plus whatever the operator configured by hand in
/// `secretscan-config`. Built-ins and config-driven kinds never collide:
/// built-ins use [`SecretKind::Custom`] names reserved by this crate
/// ([`builtin::GITHUB_PAT_KIND`] etc.) or the dedicated enum variants, while
/// config-driven kinds are whatever string the operator names.
pub fn build_detectors(config: &ScanConfig) -> Result<Vec<Box<dyn Detector>>, RegistryError> {
    let mut detectors = builtin::all_detectors();
    detectors.extend(build_detectors_from_config(config)?);
    Ok(detectors)
}

fn build_detectors_from_config(config: &ScanConfig) -> Result<Vec<Box<dyn Detector>>, RegistryError> {
    config
        .detectors
        .iter()
        .map(|entry| match entry {
            DetectorConfig::Simple(c) => {
                let kind: &'static str = Box::leak(c.kind.clone().into_boxed_str());
                let re = Regex::new(&c.finder.pattern).map_err(|source| RegistryError::InvalidPattern {
                    kind: c.kind.clone(),
                    source,
                })?;
                let detector: Box<dyn Detector> = Box::new(SimpleTokenDetector::new(re, c.max_len, move |bytes: &[u8]| {
                    Some(GenericToken {
                        kind,
                        value: bytes.to_vec(),
                    })
                }));
                Ok(prefilter_if_configured(&c.prefixes, detector))
            }
            DetectorConfig::Tuple(c) => {
                let kind: &'static str = Box::leak(c.kind.clone().into_boxed_str());
                let finders = c
                    .finders
                    .iter()
                    .map(|f| {
                        let re = Regex::new(&f.pattern).map_err(|source| RegistryError::InvalidPattern {
                            kind: c.kind.clone(),
                            source,
                        })?;
                        Ok(Box::new(move |data: &[u8]| re.find_iter(data).map(|m| m.start()..m.end()).collect())
                            as secretscan_core::detect::tuple::Finder)
                    })
                    .collect::<Result<Vec<_>, RegistryError>>()?;

                let detector: Box<dyn Detector> = Box::new(NTupleDetector::new(
                    c.max_element_len,
                    c.max_distance,
                    finders,
                    move |matches| {
                        let fields = matches
                            .iter()
                            .map(|m| String::from_utf8_lossy(&m.bytes).into_owned())
                            .collect();
                        Some(GenericTuple { kind, fields })
                    },
                ));
                Ok(prefilter_if_configured(&c.prefixes, detector))
            }
        })
        .collect()
}

fn prefilter_if_configured(prefixes: &[String], detector: Box<dyn Detector>) -> Box<dyn Detector> {
    if prefixes.is_empty() {
        return detector;
    }
    let refs: Vec<&str> = prefixes.iter().map(String::as_str).collect();
    Box::new(PrefilteredDetector::new(&refs, detector))
}

/// The validation engine for every built-in kind, plus an `HttpValidator`
/// templated from each operator-configured [`ValidatorConfig`]. A
/// config-driven kind with no matching `ValidatorConfig` entry is left
/// unregistered and reports `Unsupported`, which is the documented
/// behaviour for any kind the registry doesn't know about.
pub fn build_validation_engine(config: &ScanConfig, client: Arc<reqwest::Client>) -> ValidationEngine {
    let mut engine = ValidationEngine::new();
    builtin::register_validators(&mut engine, client.clone());
    register_validators_from_config(config, client, &mut engine);
    engine
}

fn register_validators_from_config(config: &ScanConfig, client: Arc<reqwest::Client>, engine: &mut ValidationEngine) {
    for vcfg in &config.validators {
        let is_tuple = config
            .detectors
            .iter()
            .any(|d| matches!(d, DetectorConfig::Tuple(t) if t.kind == vcfg.kind));
        let kind: &'static str = Box::leak(vcfg.kind.clone().into_boxed_str());

        if is_tuple {
            engine.add_validator(
                SecretKind::Custom(kind),
                templated_validator::<GenericTuple>(vcfg, client.clone()),
            );
        } else {
            engine.add_validator(
                SecretKind::Custom(kind),
                templated_validator::<GenericToken>(vcfg, client.clone()),
            );
        }
    }
}

/// Builds an `HttpValidator<S>` whose endpoint/header/body templates are
/// substituted from `S::template_fields()` at validation time — the
/// config-driven counterpart of [`builtin`]'s hand-written validators.
fn templated_validator<S>(vcfg: &ValidatorConfig, client: Arc<reqwest::Client>) -> HttpValidator<S>
where
    S: secretscan_core::secret::Secret + SecretFields,
{
    let method = http_method(&vcfg.method);
    let mut endpoints = vcfg
        .endpoints
        .iter()
        .cloned()
        .map(|template| {
            Endpoint::Func(Box::new(move |secret: &S| {
                let rendered = substitute(&template, &secret.template_fields());
                if rendered.is_empty() {
                    Err(ValidationError::EndpointBuild("endpoint template resolved to an empty URL".to_string()))
                } else {
                    Ok(rendered)
                }
            }))
        })
        .collect::<Vec<_>>();
    let primary = endpoints.remove(0);

    let headers_template = vcfg.headers.clone();
    let body_template = vcfg.body.clone();

    HttpValidator::new(primary, method, client)
        .with_fallback_endpoints(endpoints)
        .with_headers(move |secret: &S| {
            let fields = secret.template_fields();
            headers_template
                .iter()
                .map(|(name, template)| (name.clone(), substitute(template, &fields)))
                .collect()
        })
        .with_body(move |secret: &S| Ok(body_template.as_ref().map(|t| substitute(t, &secret.template_fields()))))
        .with_valid_codes(vcfg.valid_codes.iter().copied())
        .with_invalid_codes(vcfg.invalid_codes.iter().copied())
}

fn http_method(method: &str) -> reqwest::Method {
    match method.to_ascii_uppercase().as_str() {
        "POST" => reqwest::Method::POST,
        "PUT" => reqwest::Method::PUT,
        "PATCH" => reqwest::Method::PATCH,
        "DELETE" => reqwest::Method::DELETE,
        "HEAD" => reqwest::Method::HEAD,
        _ => reqwest::Method::GET,
    }
}

#[allow(dead_code)]
fn assert_kind_is_distinguishable(_kind: SecretKind) {}

#[cfg(test)]
mod tests {
    use super::*;
    use secretscan_config::{FinderConfig, SimpleDetectorConfig};

    #[test]
    fn build_detectors_includes_builtins() {
        let config = ScanConfig::default();
        let detectors = build_detectors(&config).unwrap();
        assert_eq!(detectors.len(), 4);
    }

    #[test]
    fn config_driven_simple_detector_is_included() {
        let mut config = ScanConfig::default();
        config.detectors.push(DetectorConfig::Simple(SimpleDetectorConfig {
            kind: "custom-token".to_string(),
            finder: FinderConfig {
                pattern: "CUSTOM_[0-9]{4}".to_string(),
            },
            max_len: 11,
            prefixes: vec!["CUSTOM_".to_string()],
        }));
        let detectors = build_detectors(&config).unwrap();
        assert_eq!(detectors.len(), 5);

        let custom = detectors.last().unwrap();
        let out = custom.detect(b"id=CUSTOM_1234 done");
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn invalid_pattern_is_reported_as_registry_error() {
        let mut config = ScanConfig::default();
        config.detectors.push(DetectorConfig::Simple(SimpleDetectorConfig {
            kind: "broken".to_string(),
            finder: FinderConfig {
                pattern: "(unterminated".to_string(),
            },
            max_len: 10,
            prefixes: vec![],
        }));
        assert!(build_detectors(&config).is_err());
    }

    #[tokio::test]
    async fn config_driven_validator_is_wired_to_its_matching_kind() {
        use httpmock::MockServer;
        use secretscan_core::cancel::CancellationToken;

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(httpmock::Method::GET).path("/check");
                then.status(200);
            })
            .await;

        let mut config = ScanConfig::default();
        config.detectors.push(DetectorConfig::Simple(SimpleDetectorConfig {
            kind: "custom-token".to_string(),
            finder: FinderConfig {
                pattern: "CUSTOM_[0-9]{4}".to_string(),
            },
            max_len: 11,
            prefixes: vec![],
        }));
        config.validators.push(ValidatorConfig {
            kind: "custom-token".to_string(),
            endpoints: vec![server.url("/check")],
            method: "GET".to_string(),
            headers: std::collections::HashMap::new(),
            body: None,
            valid_codes: vec![200],
            invalid_codes: vec![401, 403],
        });

        let engine = build_validation_engine(&config, Arc::new(reqwest::Client::new()));
        let secret = GenericToken {
            kind: "custom-token",
            value: b"CUSTOM_1234".to_vec(),
        };
        let outcome = engine.validate(&secret, &CancellationToken::none()).await;
        assert_eq!(outcome.status, secretscan_core::secret::ValidationStatus::Valid);
    }

    #[tokio::test]
    async fn unconfigured_validator_kind_remains_unsupported() {
        let config = ScanConfig::default();
        let engine = build_validation_engine(&config, Arc::new(reqwest::Client::new()));
        let secret = GenericToken {
            kind: "no-such-validator",
            value: b"whatever".to_vec(),
        };
        let cancel = secretscan_core::cancel::CancellationToken::none();
        let outcome = engine.validate(&secret, &cancel).await;
        assert_eq!(outcome.status, secretscan_core::secret::ValidationStatus::Unsupported);
    }
}
