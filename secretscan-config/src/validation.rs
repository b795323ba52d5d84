//! Custom validation functions shared across configuration modules.

use validator::ValidationError;

/// Validate that a string compiles as a `regex::bytes::Regex` pattern.
pub fn validate_regex(pattern: &str) -> Result<(), ValidationError> {
    regex::bytes::Regex::new(pattern)
        .map(|_| ())
        .map_err(|_| ValidationError::new("invalid_regex"))
}

/// Validate an HTTP method name against the verbs the validator template
/// actually dispatches.
pub fn validate_http_method(method: &str) -> Result<(), ValidationError> {
    let valid = matches!(
        method.to_ascii_uppercase().as_str(),
        "GET" | "POST" | "PUT" | "PATCH" | "DELETE" | "HEAD"
    );
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_http_method"))
    }
}

/// Validate a `host:port` listen address.
pub fn validate_socket_addr(addr: &str) -> Result<(), ValidationError> {
    addr.parse::<std::net::SocketAddr>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("invalid_socket_addr"))
}
