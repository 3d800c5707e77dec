//! Fragment post-processing.
//!
//! Parses a rendered HTML fragment, applies the attribute rewriter to every
//! element in document order, and re-serializes the result. Elements that
//! need no rewriting are emitted byte-for-byte; the streaming rewriter
//! neither deduplicates `id` attributes nor re-encodes entities.
//!
//! The fragment is wrapped in a minimal document shell before parsing so
//! that raw `<script>` content at the top level of the fragment cannot be
//! reinterpreted or relocated, and unwrapped afterwards.

use std::cell::RefCell;

use lol_html::html_content::Element;
use lol_html::{RewriteStrSettings, element, rewrite_str};
use thiserror::Error;

use crate::attrs::AttributeSet;
use crate::config::EngineConfig;
use crate::deprecation::DeprecationLogger;
use crate::rewrite::{AttributeRewriter, RewriteError};
use crate::token::TokenSigner;

const SHELL_OPEN: &str = "<!doctype html><html><body>";
const BODY_OPEN: &str = "<body>";
const BODY_CLOSE: &str = "</body>";

/// Errors raised while post-processing a fragment.
#[derive(Debug, Error)]
pub enum FragmentError {
    /// An element's attribute rewrite failed; the whole render fails.
    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    /// The underlying HTML rewriter reported a failure.
    #[error("html rewriting failed: {0}")]
    Html(String),
}

/// Applies the attribute rewriter to every element of an HTML fragment.
pub struct FragmentProcessor<'a> {
    rewriter: AttributeRewriter<'a>,
}

impl<'a> FragmentProcessor<'a> {
    /// Creates a processor over the engine configuration and collaborators.
    #[must_use]
    pub fn new(
        config: &'a EngineConfig,
        signer: &'a dyn TokenSigner,
        deprecations: &'a dyn DeprecationLogger,
        csrf_token: &'a str,
    ) -> Self {
        Self {
            rewriter: AttributeRewriter::new(config, signer, deprecations, csrf_token),
        }
    }

    /// Rewrites directive attributes throughout the fragment.
    ///
    /// Empty or whitespace-only input is returned unchanged. Each element
    /// is visited exactly once and rewritten independently; duplicate `id`
    /// attributes are preserved.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentError`] when any element's rewrite fails; the
    /// fragment is never partially degraded.
    pub fn process(&self, html: &str) -> Result<String, FragmentError> {
        if html.trim().is_empty() {
            return Ok(html.to_string());
        }

        let shell = format!("{SHELL_OPEN}{html}{BODY_CLOSE}</html>");
        let failure: RefCell<Option<FragmentError>> = RefCell::new(None);

        let result = rewrite_str(
            &shell,
            RewriteStrSettings {
                element_content_handlers: vec![element!("*", |el| {
                    if let Err(err) = self.rewrite_element(el) {
                        let message = err.to_string();
                        *failure.borrow_mut() = Some(err);
                        return Err(message.into());
                    }
                    Ok(())
                })],
                ..RewriteStrSettings::default()
            },
        );

        let output = match result {
            Ok(output) => output,
            Err(err) => {
                return Err(failure
                    .take()
                    .unwrap_or_else(|| FragmentError::Html(err.to_string())));
            }
        };

        let start = output
            .find(BODY_OPEN)
            .map(|index| index + BODY_OPEN.len())
            .ok_or_else(|| FragmentError::Html("document shell lost during rewrite".to_string()))?;
        let end = output
            .rfind(BODY_CLOSE)
            .ok_or_else(|| FragmentError::Html("document shell lost during rewrite".to_string()))?;

        // Normalize the double-encoded ampersand artifact of encoded
        // character references (`&amp;#39;` back to `&#39;`).
        Ok(output[start..end].replace("&amp;#", "&#"))
    }

    fn rewrite_element(&self, el: &mut Element<'_, '_>) -> Result<(), FragmentError> {
        let mut attrs = AttributeSet::new();
        for attr in el.attributes() {
            attrs.insert(attr.name(), attr.value());
        }
        let original_names = attrs.names();

        let changed = self.rewriter.rewrite(&mut attrs)?;
        if !changed {
            // Untouched elements keep their source bytes.
            return Ok(());
        }

        for name in original_names {
            el.remove_attribute(&name);
        }
        for (name, value) in attrs.iter() {
            el.set_attribute(name, value)
                .map_err(|err| FragmentError::Html(err.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use crate::deprecation::NullDeprecationLogger;
    use crate::token::HmacTokenSigner;

    fn process(html: &str) -> Result<String, FragmentError> {
        let config = EngineConfig::default();
        let signer = HmacTokenSigner::new(*b"fragment-test-key");
        let processor = FragmentProcessor::new(&config, &signer, &NullDeprecationLogger, "csrf");
        processor.process(html)
    }

    #[test]
    fn test_empty_and_whitespace_input_is_a_noop() {
        assert_eq!(process("").unwrap(), "");
        assert_eq!(process("  \n\t").unwrap(), "  \n\t");
    }

    #[test]
    fn test_fragment_without_directives_is_unchanged() {
        let html = r#"<div class="card"><p title="a&quot;b">text</p></div>"#;
        assert_eq!(process(html).unwrap(), html);
    }

    #[test]
    fn test_directives_are_rewritten_on_nested_elements() {
        let html = r#"<div><button frond f-method="post">Go</button></div>"#;
        let output = process(html).unwrap();

        assert!(output.contains("hx-post=\"/frond/components/render\""));
        assert!(output.contains("<button hx-headers="));
        assert!(!output.contains("f-method"));
    }

    #[test]
    fn test_duplicate_ids_are_preserved() {
        let html = r#"<div id="x">one</div><div id="x">two</div>"#;
        let output = process(html).unwrap();

        assert_eq!(output.matches("id=\"x\"").count(), 2);
        assert!(output.contains("one"));
        assert!(output.contains("two"));
    }

    #[test]
    fn test_duplicate_id_attributes_on_one_element_do_not_raise() {
        let output = process(r#"<div id="x" id="y">ok</div>"#).unwrap();
        assert!(output.contains("ok"));
    }

    #[test]
    fn test_top_level_script_content_is_preserved() {
        let html = "<script>if (a < b) { run('&'); }</script><p>ok</p>";
        let output = process(html).unwrap();

        assert!(output.contains("if (a < b) { run('&'); }"));
        assert!(output.contains("<p>ok</p>"));
    }

    #[test]
    fn test_double_encoded_references_are_normalized() {
        let html = "<p>&amp;#8212; and &amp;#39;</p>";
        assert_eq!(process(html).unwrap(), "<p>&#8212; and &#39;</p>");
    }

    #[test]
    fn test_malformed_json_directive_fails_the_fragment() {
        let html = r#"<div f-vals="{broken">x</div>"#;
        assert!(matches!(
            process(html),
            Err(FragmentError::Rewrite(
                RewriteError::MalformedJsonDirective { .. }
            ))
        ));
    }

    #[test]
    fn test_unsafe_scheme_fails_the_fragment() {
        let html = r#"<div f-vals="javascript:alert(1)">x</div>"#;
        assert!(matches!(
            process(html),
            Err(FragmentError::Rewrite(RewriteError::UnsafeUriScheme { .. }))
        ));
    }
}
