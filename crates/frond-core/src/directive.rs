//! Directive name resolution.
//!
//! Authors write directives with one of four prefixes: the short form `f-`,
//! the long form `frond-`, or their `data-` doubles for authoring contexts
//! that only allow `data-*` attributes. The prefix list is tried in a fixed
//! order so that ambiguous spellings resolve deterministically. Attributes
//! matching no prefix are not directives and pass through every later stage
//! untouched.

use crate::attrs::AttributeSet;

/// Recognized directive prefixes, tried in order. The trailing separator
/// (`-`) is appended during matching, so `frond-get` cannot be shadowed by
/// the `f` prefix.
pub const PREFIXES: [&str; 4] = ["f", "frond", "data-f", "data-frond"];

/// The bare marker attribute that turns an element into a request trigger
/// for its own component.
pub const MARKER: &str = "frond";

/// The `data-` double of [`MARKER`].
pub const MARKER_DATA: &str = "data-frond";

/// Logical directive names that map onto the AJAX client's wire vocabulary.
/// The exact strings matter for client compatibility.
pub const WIRE_NAMES: [&str; 28] = [
    "boost",
    "confirm",
    "delete",
    "disable",
    "encoding",
    "ext",
    "get",
    "headers",
    "history-elt",
    "include",
    "indicator",
    "params",
    "patch",
    "post",
    "preserve",
    "prompt",
    "push-url",
    "put",
    "request",
    "select",
    "sse",
    "swap",
    "swap-oob",
    "target",
    "trigger",
    "vals",
    "vars",
    "ws",
];

/// The deprecated directive name. Still effective for backward
/// compatibility, but every occurrence is reported to the deprecation
/// logger.
pub const DEPRECATED_VARS: &str = "vars";

/// Resolves an attribute key to its logical directive name.
///
/// Returns `None` for attributes that carry no recognized prefix; such
/// attributes are passed through unchanged by the rewriter.
#[must_use]
pub fn resolve(key: &str) -> Option<&str> {
    for prefix in PREFIXES {
        if key.len() > prefix.len() + 1
            && key.as_bytes()[prefix.len()] == b'-'
            && key.starts_with(prefix)
        {
            return Some(&key[prefix.len() + 1..]);
        }
    }
    None
}

/// Extracts the field name of a value directive (`val:<field>`), normalized
/// from its hyphenated authoring form to the codec's camel-case key casing.
#[must_use]
pub fn value_field(logical_name: &str) -> Option<String> {
    let field = logical_name.strip_prefix("val:")?;
    Some(to_camel_case(field))
}

/// Returns `true` if the element carries the bare marker attribute in
/// either authoring form. Presence alone counts; the value (usually empty)
/// is ignored.
#[must_use]
pub fn marker_present(attrs: &AttributeSet) -> bool {
    attrs.contains(MARKER) || attrs.contains(MARKER_DATA)
}

/// Looks up the value of the directive `name` across all prefixes, in
/// prefix order, returning the first non-empty value.
#[must_use]
pub fn directive_value<'a>(attrs: &'a AttributeSet, name: &str) -> Option<&'a str> {
    for prefix in PREFIXES {
        if let Some(value) = attrs.get(&format!("{prefix}-{name}")) {
            if !value.is_empty() {
                return Some(value);
            }
        }
    }
    None
}

/// Converts a hyphenated, underscored, or spaced field name to camelCase.
fn to_camel_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut upper_next = false;
    for ch in input.chars() {
        if ch == '-' || ch == '_' || ch == ' ' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}
