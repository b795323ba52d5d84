//! C4.6: a tolerant flat-JSON key extractor used by n-tuple detectors whose
//! finders need `{key: "value", ...}` blobs pulled apart.
//!
//! This is hand-rolled rather than built on `serde_json` because the
//! tolerance requirements (arbitrary backslash-escaping, trailing commas,
//! stopping at the first malformed byte instead of erroring the whole blob)
//! don't match a strict parser's contract — the input here is an arbitrary
//! regex match, not a validated document.

use std::collections::HashMap;

/// Extracts `required` and `optional` string-valued keys from `data`, a flat
/// (non-nested) JSON object.
///
/// Returns `None` ("no extraction") if any required key is absent or maps to
/// an empty string. Returns `Some(map)` otherwise, containing every required
/// key plus whichever optional keys were present; an empty `required` list
/// with no matches yields `Some(HashMap::new())`.
///
/// Only JSON string values are accepted — numbers, booleans, arrays,
/// objects, and `null` are treated as if the key were absent.
pub fn extract_flat_json(data: &[u8], required: &[&str], optional: &[&str]) -> Option<HashMap<String, String>> {
    let mut found = HashMap::new();
    let wanted: Vec<&str> = required.iter().chain(optional.iter()).copied().collect();

    for key in &wanted {
        if let Some(value) = find_string_value(data, key) {
            if !value.is_empty() {
                found.insert((*key).to_string(), value);
            }
        }
    }

    for key in required {
        match found.get(*key) {
            Some(v) if !v.is_empty() => {}
            _ => return None,
        }
    }

    Some(found)
}

/// Locate `"key"` followed by a colon, then decode the string value that
/// follows, tolerating arbitrary escaping. Returns `None` if the key isn't
/// present, isn't followed by a JSON string, or the string is unterminated.
fn find_string_value(data: &[u8], key: &str) -> Option<String> {
    let needle = format!("\"{key}\"");
    let needle = needle.as_bytes();

    let mut search_from = 0;
    while let Some(rel) = find_subslice(&data[search_from..], needle) {
        let key_start = search_from + rel;
        let after_key = key_start + needle.len();
        search_from = after_key;

        let mut i = after_key;
        while i < data.len() && is_json_whitespace(data[i]) {
            i += 1;
        }
        if i >= data.len() || data[i] != b':' {
            continue;
        }
        i += 1;
        while i < data.len() && is_json_whitespace(data[i]) {
            i += 1;
        }
        if i >= data.len() || data[i] != b'"' {
            // Not a string value (number/bool/array/object/null) — skip, a
            // later occurrence of the same key text might still be one.
            continue;
        }
        i += 1;
        if let Some(value) = decode_string(data, i) {
            return Some(value);
        }
    }
    None
}

fn is_json_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Single-pass de-escaping state machine starting just after the opening
/// quote at `data[start]`. `\n` becomes a newline; every other `\c` becomes
/// `c` verbatim (matches the JSON escape table loosely — this extractor
/// only needs "don't choke on escapes", not strict JSON escape validation).
/// A trailing unescaped backslash at the terminal position is not
/// interpreted as an escape (there is no following character).
fn decode_string(data: &[u8], start: usize) -> Option<String> {
    let mut out = Vec::new();
    let mut i = start;
    let mut escaped = false;

    while i < data.len() {
        let b = data[i];
        if escaped {
            match b {
                b'n' => out.push(b'\n'),
                c => out.push(c),
            }
            escaped = false;
            i += 1;
            continue;
        }
        match b {
            b'\\' if i + 1 < data.len() => {
                escaped = true;
                i += 1;
            }
            b'\\' => {
                // Terminal backslash: not an escape, and also not a closing
                // quote, so the string is unterminated.
                return None;
            }
            b'"' => return String::from_utf8(out).ok(),
            _ => {
                out.push(b);
                i += 1;
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_required_and_optional_keys() {
        let data = br#"{"client_id": "abc123", "client_secret": "xyz789", "extra": 5}"#;
        let map = extract_flat_json(data, &["client_id", "client_secret"], &["workspace_url"]).unwrap();
        assert_eq!(map.get("client_id").unwrap(), "abc123");
        assert_eq!(map.get("client_secret").unwrap(), "xyz789");
        assert!(!map.contains_key("workspace_url"));
    }

    #[test]
    fn missing_required_key_yields_no_extraction() {
        let data = br#"{"client_id": "abc123"}"#;
        assert!(extract_flat_json(data, &["client_id", "client_secret"], &[]).is_none());
    }

    #[test]
    fn empty_required_value_yields_no_extraction() {
        let data = br#"{"client_id": ""}"#;
        assert!(extract_flat_json(data, &["client_id"], &[]).is_none());
    }

    #[test]
    fn no_required_keys_configured_yields_empty_map() {
        let data = br#"{"anything": "goes"}"#;
        let map = extract_flat_json(data, &[], &[]).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn non_string_values_are_ignored() {
        let data = br#"{"client_id": 12345, "client_secret": "real"}"#;
        assert!(extract_flat_json(data, &["client_id"], &[]).is_none());
        let map = extract_flat_json(data, &["client_secret"], &[]).unwrap();
        assert_eq!(map.get("client_secret").unwrap(), "real");
    }

    #[test]
    fn handles_escaped_quotes_and_newlines() {
        let data = br#"{"token": "line1\nline2 \"quoted\" end"}"#;
        let map = extract_flat_json(data, &["token"], &[]).unwrap();
        assert_eq!(map.get("token").unwrap(), "line1\nline2 \"quoted\" end");
    }

    #[test]
    fn tolerates_trailing_comma() {
        let data = br#"{"client_id": "abc", "client_secret": "def",}"#;
        let map = extract_flat_json(data, &["client_id", "client_secret"], &[]).unwrap();
        assert_eq!(map.get("client_id").unwrap(), "abc");
        assert_eq!(map.get("client_secret").unwrap(), "def");
    }

    #[test]
    fn unterminated_string_is_skipped() {
        let data = br#"{"client_id": "abc"#;
        assert!(extract_flat_json(data, &["client_id"], &[]).is_none());
    }
}
