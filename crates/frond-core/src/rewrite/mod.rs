//! Per-element attribute rewriting.
//!
//! The rewriter turns directive attributes into the wire attributes the
//! AJAX client consumes, in a fixed order per element:
//!
//! 1. the bare marker attribute synthesizes the verb attribute pointing at
//!    the render endpoint (with anti-forgery headers for `post` and a
//!    signed action parameter when present);
//! 2. one pass over the remaining attributes in discovery order handles
//!    value directives (`val:<field>`), the `replace` macro, and 1:1 wire
//!    mappings, routing the JSON-bodied `headers` and `vals` through the
//!    accumulator so earlier-committed values survive;
//! 3. consumed directives are removed; everything else passes through
//!    byte-for-byte.
//!
//! JSON-valued wire attributes accumulate: new pairs merge into whatever a
//! prior rewrite pass already committed, later values overriding
//! identically named keys.

mod error;

pub use error::RewriteError;

use serde_json::{Map, Value as JsonValue};

use crate::attrs::AttributeSet;
use crate::config::EngineConfig;
use crate::deprecation::DeprecationLogger;
use crate::directive;
use crate::token::{TokenSigner, keys};

/// Feature id reported for the deprecated `vars` directive.
pub const VARS_FEATURE_ID: &str = "directive:vars";

const VARS_MESSAGE: &str = "The \"vars\" directive has been deprecated for security reasons. \
     Use the \"vals\" or \"val:*\" directive instead.";

/// Rewrites one element's attribute set in place.
///
/// Holds only borrowed collaborators; each call is an independent, pure
/// transformation apart from deprecation notices.
pub struct AttributeRewriter<'a> {
    config: &'a EngineConfig,
    signer: &'a dyn TokenSigner,
    deprecations: &'a dyn DeprecationLogger,
    csrf_token: &'a str,
}

impl<'a> AttributeRewriter<'a> {
    /// Creates a rewriter over the engine configuration and collaborators.
    ///
    /// `csrf_token` is the per-request anti-forgery token merged into the
    /// headers wire attribute for `post` requests.
    #[must_use]
    pub fn new(
        config: &'a EngineConfig,
        signer: &'a dyn TokenSigner,
        deprecations: &'a dyn DeprecationLogger,
        csrf_token: &'a str,
    ) -> Self {
        Self {
            config,
            signer,
            deprecations,
            csrf_token,
        }
    }

    /// Rewrites the attribute set, returning `true` if anything changed.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError`] on a malformed JSON-bodied directive or a
    /// disallowed URI scheme. Either failure aborts the whole render.
    pub fn rewrite(&self, attrs: &mut AttributeSet) -> Result<bool, RewriteError> {
        let original = attrs.clone();

        self.apply_marker(attrs)?;

        let snapshot: Vec<(String, String)> = attrs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        let mut consumed: Vec<String> = Vec::new();

        for (key, value) in &snapshot {
            let Some(name) = directive::resolve(key) else {
                continue;
            };

            if let Some(field) = directive::value_field(name) {
                let mut pairs = Map::new();
                pairs.insert(field, JsonValue::String(value.clone()));
                self.merge_json_pairs(attrs, "vals", pairs)?;
            } else if name == "replace" {
                attrs.insert(self.config.wire_attribute("select"), value.clone());
                attrs.insert(self.config.wire_attribute("target"), value.clone());
                attrs.insert(self.config.wire_attribute("swap"), "outerHTML");
            } else if directive::WIRE_NAMES.contains(&name) {
                if name == "headers" || name == "vals" {
                    self.merge_raw_json(attrs, name, value)?;
                } else {
                    attrs.insert(self.config.wire_attribute(name), value.clone());
                }

                if name == directive::DEPRECATED_VARS {
                    self.deprecations.notify(VARS_FEATURE_ID, VARS_MESSAGE);
                }
            } else if name != "method" && name != "action" {
                // Prefixed but unrecognized: leave untouched.
                continue;
            }

            consumed.push(key.clone());
        }

        for key in consumed {
            attrs.remove(&key);
        }
        attrs.remove(directive::MARKER);
        attrs.remove(directive::MARKER_DATA);

        Ok(*attrs != original)
    }

    /// Handles the bare marker attribute: synthesizes the verb attribute
    /// pointing at the render endpoint.
    fn apply_marker(&self, attrs: &mut AttributeSet) -> Result<(), RewriteError> {
        if !directive::marker_present(attrs) {
            return Ok(());
        }

        let mut verb = "get";

        let method = directive::directive_value(attrs, "method").unwrap_or_default();
        if method.eq_ignore_ascii_case("post") {
            verb = "post";

            let mut headers = Map::new();
            headers.insert(
                self.config.csrf_header.clone(),
                JsonValue::String(self.csrf_token.to_string()),
            );
            self.merge_json_pairs(attrs, "headers", headers)?;
        }

        let mut url = self.config.endpoint.clone();
        if let Some(action) = directive::directive_value(attrs, "action") {
            let token = self.signer.sign(action);
            let separator = if url.contains('?') { '&' } else { '?' };
            url = format!("{url}{separator}{}={token}", keys::ACTION);
        }

        attrs.insert(self.config.wire_attribute(verb), url);
        Ok(())
    }

    /// Merges new pairs into a JSON-valued wire attribute, preserving keys
    /// committed by earlier passes. New values win on key collision.
    fn merge_json_pairs(
        &self,
        attrs: &mut AttributeSet,
        logical_name: &str,
        pairs: Map<String, JsonValue>,
    ) -> Result<(), RewriteError> {
        let key = self.config.wire_attribute(logical_name);

        let mut merged = match attrs.get(&key) {
            Some(existing) if !existing.is_empty() => {
                parse_json_object(&key, existing)?
            }
            _ => Map::new(),
        };
        merged.extend(pairs);

        attrs.insert(key, html_safe_json(&merged));
        Ok(())
    }

    /// Merges a raw JSON-bodied directive value. The value is checked for
    /// a script-executing URI scheme before any parsing happens.
    fn merge_raw_json(
        &self,
        attrs: &mut AttributeSet,
        logical_name: &str,
        raw: &str,
    ) -> Result<(), RewriteError> {
        if raw.starts_with("javascript:") {
            return Err(RewriteError::UnsafeUriScheme {
                attribute: logical_name.to_string(),
            });
        }

        let pairs = parse_json_object(logical_name, raw)?;
        self.merge_json_pairs(attrs, logical_name, pairs)
    }
}

fn parse_json_object(attribute: &str, raw: &str) -> Result<Map<String, JsonValue>, RewriteError> {
    serde_json::from_str::<Map<String, JsonValue>>(raw).map_err(|err| {
        RewriteError::MalformedJsonDirective {
            attribute: attribute.to_string(),
            detail: err.to_string(),
        }
    })
}

/// Serializes a JSON object with HTML-safe escaping so the result cannot
/// break out of a double-quoted attribute value. `<`, `>`, `&` and `'` are
/// hex-escaped; in JSON text these characters only ever occur inside
/// strings, so a plain replacement is sound.
pub(crate) fn html_safe_json(map: &Map<String, JsonValue>) -> String {
    let json = serde_json::to_string(&JsonValue::Object(map.clone()))
        .unwrap_or_else(|_| "{}".to_string());
    json.replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
        .replace('\'', "\\u0027")
}

#[cfg(test)]
mod unit_tests {
    use std::cell::RefCell;

    use super::*;
    use crate::config::EngineConfig;
    use crate::deprecation::NullDeprecationLogger;
    use crate::token::HmacTokenSigner;

    /// Deprecation logger that records every notice for assertions.
    #[derive(Default)]
    struct RecordingLogger {
        notices: RefCell<Vec<String>>,
    }

    impl DeprecationLogger for RecordingLogger {
        fn notify(&self, feature_id: &str, _message: &str) {
            self.notices.borrow_mut().push(feature_id.to_string());
        }
    }

    fn signer() -> HmacTokenSigner {
        HmacTokenSigner::new(*b"rewrite-test-key")
    }

    fn rewrite(attrs: &mut AttributeSet) -> Result<bool, RewriteError> {
        let config = EngineConfig::default();
        let signer = signer();
        let rewriter = AttributeRewriter::new(&config, &signer, &NullDeprecationLogger, "csrf-123");
        rewriter.rewrite(attrs)
    }

    #[test]
    fn test_bare_marker_synthesizes_get() {
        let mut attrs = AttributeSet::from_pairs([("frond", "")]);
        rewrite(&mut attrs).unwrap();

        assert_eq!(attrs.get("hx-get"), Some("/frond/components/render"));
        assert!(!attrs.contains("frond"));
        assert!(!attrs.contains("hx-post"));
    }

    #[test]
    fn test_post_method_injects_csrf_header() {
        for method in ["post", "POST", "Post"] {
            let mut attrs = AttributeSet::from_pairs([("frond", ""), ("f-method", method)]);
            rewrite(&mut attrs).unwrap();

            assert_eq!(attrs.get("hx-post"), Some("/frond/components/render"));
            assert!(!attrs.contains("hx-get"));
            let headers = attrs.get("hx-headers").unwrap();
            assert!(headers.contains("X-CSRF-Token"));
            assert!(headers.contains("csrf-123"));
            assert!(!attrs.contains("f-method"));
        }
    }

    #[test]
    fn test_action_directive_is_signed_into_the_url() {
        let config = EngineConfig::default();
        let signer = signer();
        let rewriter = AttributeRewriter::new(&config, &signer, &NullDeprecationLogger, "csrf");

        let mut attrs = AttributeSet::from_pairs([("frond", ""), ("f-action", "entries/save")]);
        rewriter.rewrite(&mut attrs).unwrap();

        let url = attrs.get("hx-get").unwrap();
        let token = url
            .strip_prefix("/frond/components/render?frond:action=")
            .unwrap();
        assert_eq!(signer.unsign(token).unwrap(), "entries/save");
        assert!(!attrs.contains("f-action"));
    }

    #[test]
    fn test_value_directives_accumulate_into_vals() {
        let mut attrs =
            AttributeSet::from_pairs([("f-val:page", "2"), ("f-val:sort-order", "desc")]);
        rewrite(&mut attrs).unwrap();

        let vals: Map<String, JsonValue> =
            serde_json::from_str(attrs.get("hx-vals").unwrap()).unwrap();
        assert_eq!(vals["page"], "2");
        assert_eq!(vals["sortOrder"], "desc");
        assert!(!attrs.contains("f-val:page"));
    }

    #[test]
    fn test_replace_macro_expansion() {
        let mut attrs = AttributeSet::from_pairs([("f-replace", "#list")]);
        rewrite(&mut attrs).unwrap();

        assert_eq!(attrs.get("hx-select"), Some("#list"));
        assert_eq!(attrs.get("hx-target"), Some("#list"));
        assert_eq!(attrs.get("hx-swap"), Some("outerHTML"));
        assert_eq!(attrs.len(), 3);
    }

    #[test]
    fn test_known_directives_map_one_to_one() {
        let mut attrs = AttributeSet::from_pairs([
            ("f-trigger", "click"),
            ("frond-swap", "innerHTML"),
            ("data-f-push-url", "true"),
        ]);
        rewrite(&mut attrs).unwrap();

        assert_eq!(attrs.get("hx-trigger"), Some("click"));
        assert_eq!(attrs.get("hx-swap"), Some("innerHTML"));
        assert_eq!(attrs.get("hx-push-url"), Some("true"));
    }

    #[test]
    fn test_non_directives_pass_through() {
        let mut attrs = AttributeSet::from_pairs([
            ("class", "card"),
            ("data-role", "widget"),
            ("f-unknown", "kept"),
        ]);
        let changed = rewrite(&mut attrs).unwrap();

        assert!(!changed);
        assert_eq!(attrs.get("class"), Some("card"));
        assert_eq!(attrs.get("data-role"), Some("widget"));
        // Prefixed but unrecognized names are not directives the rewriter
        // knows; they pass through for forward compatibility.
        assert_eq!(attrs.get("f-unknown"), Some("kept"));
    }

    #[test]
    fn test_headers_and_vals_accumulate_instead_of_clobbering() {
        let mut attrs = AttributeSet::from_pairs([
            ("hx-vals", r#"{"a":1,"b":2}"#),
            ("f-vals", r#"{"b":3,"c":4}"#),
        ]);
        rewrite(&mut attrs).unwrap();

        let vals: Map<String, JsonValue> =
            serde_json::from_str(attrs.get("hx-vals").unwrap()).unwrap();
        assert_eq!(vals["a"], 1);
        assert_eq!(vals["b"], 3); // later wins
        assert_eq!(vals["c"], 4);
    }

    #[test]
    fn test_merging_empty_pairs_is_the_identity() {
        let mut attrs =
            AttributeSet::from_pairs([("hx-vals", r#"{"a":1,"b":2}"#), ("f-vals", "{}")]);
        rewrite(&mut attrs).unwrap();

        let vals: Map<String, JsonValue> =
            serde_json::from_str(attrs.get("hx-vals").unwrap()).unwrap();
        assert_eq!(vals["a"], 1);
        assert_eq!(vals["b"], 2);
        assert_eq!(vals.len(), 2);
    }

    #[test]
    fn test_malformed_json_directive_is_a_hard_stop() {
        let mut attrs = AttributeSet::from_pairs([("f-vals", "{not json")]);
        assert!(matches!(
            rewrite(&mut attrs),
            Err(RewriteError::MalformedJsonDirective { .. })
        ));

        // A malformed previously committed value is also a hard stop.
        let mut attrs =
            AttributeSet::from_pairs([("hx-vals", "{broken"), ("f-val:a", "1")]);
        assert!(matches!(
            rewrite(&mut attrs),
            Err(RewriteError::MalformedJsonDirective { .. })
        ));
    }

    #[test]
    fn test_javascript_scheme_rejected_only_for_json_directives() {
        let mut attrs = AttributeSet::from_pairs([("f-vals", "javascript:alert(1)")]);
        assert!(matches!(
            rewrite(&mut attrs),
            Err(RewriteError::UnsafeUriScheme { .. })
        ));

        // Non-JSON-bodied directives are not checked for the scheme.
        let mut attrs = AttributeSet::from_pairs([("f-get", "javascript:alert(1)")]);
        rewrite(&mut attrs).unwrap();
        assert_eq!(attrs.get("hx-get"), Some("javascript:alert(1)"));
    }

    #[test]
    fn test_deprecated_vars_still_effective_and_notified_per_occurrence() {
        let config = EngineConfig::default();
        let signer = signer();
        let logger = RecordingLogger::default();
        let rewriter = AttributeRewriter::new(&config, &signer, &logger, "csrf");

        let mut attrs = AttributeSet::from_pairs([("f-vars", "a:1")]);
        rewriter.rewrite(&mut attrs).unwrap();
        assert_eq!(attrs.get("hx-vars"), Some("a:1"));

        let mut attrs = AttributeSet::from_pairs([("frond-vars", "b:2")]);
        rewriter.rewrite(&mut attrs).unwrap();

        assert_eq!(
            *logger.notices.borrow(),
            [VARS_FEATURE_ID, VARS_FEATURE_ID]
        );
    }

    #[test]
    fn test_data_prefix_applies_to_every_emission() {
        let config = EngineConfig {
            data_prefix: true,
            ..EngineConfig::default()
        };
        let signer = signer();
        let rewriter = AttributeRewriter::new(&config, &signer, &NullDeprecationLogger, "csrf");

        let mut attrs = AttributeSet::from_pairs([
            ("frond", ""),
            ("f-method", "post"),
            ("f-val:page", "1"),
            ("f-replace", "#x"),
        ]);
        rewriter.rewrite(&mut attrs).unwrap();

        for name in ["post", "headers", "vals", "select", "target", "swap"] {
            assert!(
                attrs.contains(&format!("data-hx-{name}")),
                "missing data-hx-{name}"
            );
        }
        assert!(!attrs.contains("hx-post"));
    }

    #[test]
    fn test_html_safe_json_escaping() {
        let mut map = Map::new();
        map.insert(
            "key".to_string(),
            JsonValue::String("<script>&'</script>".to_string()),
        );
        let encoded = html_safe_json(&map);

        assert!(!encoded.contains('<'));
        assert!(!encoded.contains('>'));
        assert!(!encoded.contains('&'));
        assert!(!encoded.contains('\''));

        let decoded: Map<String, JsonValue> = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded["key"], "<script>&'</script>");
    }
}
