//! Kubernetes label helpers
//!
//! Availability zones in OpenStack are free-form strings; the node's
//! topology label has to be a valid label value.

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum length of a Kubernetes label value
pub const LABEL_VALUE_MAX_LEN: usize = 63;

static INVALID_LABEL_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^-a-zA-Z0-9_.]+").expect("static label regex is valid")
});

static LABEL_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9])?$")
        .expect("static label regex is valid")
});

const EDGE_CHARS: &[char] = &['-', '_', '.'];

/// Turn an arbitrary string into a valid, lower-case label value.
///
/// Runs of disallowed characters collapse to a single `-`, edge `-_.` are
/// trimmed, and the result is cut to 63 characters. The cut can expose a new
/// edge character, so trimming is applied again afterwards; this keeps the
/// function idempotent.
pub fn sanitize_label(input: &str) -> String {
    let replaced = INVALID_LABEL_CHARS.replace_all(input, "-");
    let mut label = replaced.trim_matches(EDGE_CHARS);

    // only ASCII survives the replacement, so byte slicing is safe
    if label.len() > LABEL_VALUE_MAX_LEN {
        label = label[..LABEL_VALUE_MAX_LEN].trim_matches(EDGE_CHARS);
    }

    label.to_ascii_lowercase()
}

/// Check whether a string is usable verbatim as a label value
pub fn is_valid_label_value(value: &str) -> bool {
    value.len() <= LABEL_VALUE_MAX_LEN && LABEL_VALUE.is_match(value)
}
