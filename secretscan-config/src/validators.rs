//! Per-validator endpoint/header/body/response-code records that configure
//! `secretscan-detectors`' HTTP-template validators.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation;

/// Declarative configuration for one [`HttpValidator`](secretscan_core::validate::http::HttpValidator)
/// instance, keyed to the secret kind it validates.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct ValidatorConfig {
    /// Secret kind this validator handles; must match a configured detector's `kind`.
    #[validate(length(min = 1))]
    pub kind: String,

    /// URLs to try in order; the first to report `Valid` wins.
    #[validate(length(min = 1))]
    pub endpoints: Vec<String>,

    #[validate(custom(function = validation::validate_http_method))]
    #[serde(default = "default_method")]
    pub method: String,

    /// Request headers; values may reference secret fields by name (e.g.
    /// `"Authorization: Bearer {token}"`) — substitution is the concrete
    /// validator's responsibility, not this config's.
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Optional request body template, same substitution convention as headers.
    pub body: Option<String>,

    #[validate(length(min = 1))]
    pub valid_codes: Vec<u16>,

    #[serde(default = "default_invalid_codes")]
    pub invalid_codes: Vec<u16>,
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_invalid_codes() -> Vec<u16> {
    vec![401, 403]
}
