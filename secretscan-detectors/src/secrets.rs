//! Concrete credential types this crate's built-in detectors produce.

use std::any::Any;
use std::collections::HashMap;

use secretscan_core::secret::{Secret, SecretKind};

/// A single opaque bearer token (API keys, PATs, webhook URLs — anything
/// one regex fully describes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericToken {
    pub kind: &'static str,
    pub value: Vec<u8>,
}

impl Secret for GenericToken {
    fn kind(&self) -> SecretKind {
        SecretKind::Custom(self.kind)
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// An AWS-style access-key-id / secret-access-key pair, formed by the n-tuple detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsAccessKeyPair {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl Secret for AwsAccessKeyPair {
    fn kind(&self) -> SecretKind {
        SecretKind::AwsAccessKeyPair
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// An OAuth-style `{client_id, client_secret, workspace_url}` triple,
/// extracted from a flat JSON blob via [`secretscan_core::detect::json_extract`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthClientPair {
    pub client_id: String,
    pub client_secret: String,
    pub workspace_url: Option<String>,
}

impl Secret for OAuthClientPair {
    fn kind(&self) -> SecretKind {
        SecretKind::OAuthClientPair
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A positional tuple of string fields produced by a config-driven n-tuple
/// detector with no dedicated Rust type — `kind` names it, `fields` holds
/// one entry per finder in finder-index order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericTuple {
    pub kind: &'static str,
    pub fields: Vec<String>,
}

impl Secret for GenericTuple {
    fn kind(&self) -> SecretKind {
        SecretKind::Custom(self.kind)
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Maps the template placeholders a config-driven HTTP validator can
/// reference (e.g. `"{access_key_id}"`, `"{field0}"`) to that secret's field
/// values. Built-in secret kinds (with their own hand-written validators in
/// [`crate::builtin`]) don't need this — it's the substitution layer a
/// future config-driven validator registry would build on top of
/// [`crate::registry::build_detectors`]'s config-driven detector kinds.
pub trait SecretFields {
    fn template_fields(&self) -> HashMap<String, String>;
}

impl SecretFields for GenericToken {
    fn template_fields(&self) -> HashMap<String, String> {
        HashMap::from([("value".to_string(), String::from_utf8_lossy(&self.value).into_owned())])
    }
}

impl SecretFields for AwsAccessKeyPair {
    fn template_fields(&self) -> HashMap<String, String> {
        HashMap::from([
            ("access_key_id".to_string(), self.access_key_id.clone()),
            ("secret_access_key".to_string(), self.secret_access_key.clone()),
        ])
    }
}

impl SecretFields for OAuthClientPair {
    fn template_fields(&self) -> HashMap<String, String> {
        let mut fields = HashMap::from([
            ("client_id".to_string(), self.client_id.clone()),
            ("client_secret".to_string(), self.client_secret.clone()),
        ]);
        if let Some(url) = &self.workspace_url {
            fields.insert("workspace_url".to_string(), url.clone());
        }
        fields
    }
}

impl SecretFields for GenericTuple {
    fn template_fields(&self) -> HashMap<String, String> {
        self.fields
            .iter()
            .enumerate()
            .map(|(i, v)| (format!("field{i}"), v.clone()))
            .collect()
    }
}

/// Substitutes every `{field}` occurrence in `template` with the
/// corresponding entry from `fields`, leaving unknown placeholders intact.
pub fn substitute(template: &str, fields: &HashMap<String, String>) -> String {
    let mut out = template.to_string();
    for (key, value) in fields {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}
