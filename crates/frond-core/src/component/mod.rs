//! Component invocation building.
//!
//! The builder composes the variable codec and the fragment post-processor
//! to produce the final tagged, replayable component markup: a `<div>`
//! wrapper whose wire attributes let the AJAX client re-request the
//! component, and whose JSON values attribute carries the signed invocation
//! state.

mod diagnostics;
mod state;

pub use state::{InvocationState, InvocationTarget, StateError, decode_action};

use http::StatusCode;
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use crate::attrs::AttributeSet;
use crate::config::EngineConfig;
use crate::deprecation::{DeprecationLogger, TracingDeprecationLogger};
use crate::fragment::{FragmentError, FragmentProcessor};
use crate::rewrite::{AttributeRewriter, html_safe_json};
use crate::token::{CodecError, TokenError, TokenSigner, VariableCodec, VariableKind, VariableMap, keys};

/// Which kind of renderable a target name resolved to. Determines which
/// state key carries the signed target token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// A registered component.
    Component,
    /// A template path fallback.
    Template,
}

/// The output of resolving and rendering a target.
#[derive(Debug, Clone)]
pub struct RenderedTarget {
    /// Whether the target was a component or a template.
    pub kind: TargetKind,
    /// The rendered HTML fragment, before post-processing.
    pub html: String,
}

/// Error returned by the resolver when rendering a known target fails.
#[derive(Debug, Error)]
#[error("rendering \"{name}\" failed: {detail}")]
pub struct ResolveError {
    /// The target that failed to render.
    pub name: String,
    /// Host-provided failure detail.
    pub detail: String,
}

/// Turns a target name into renderable content. Component location,
/// instantiation, and dependency injection live behind this seam.
pub trait ComponentResolver {
    /// Returns `true` if a component or fallback template is registered
    /// under `name`.
    fn exists(&self, name: &str) -> bool;

    /// Renders the target with the given variables.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] when the host's rendering fails.
    fn render(&self, name: &str, variables: &VariableMap) -> Result<RenderedTarget, ResolveError>;
}

/// Per-request ambient values.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    /// Site/context discriminator round-tripped as a signed token.
    pub site_id: String,
    /// Anti-forgery token merged into the headers wire attribute for
    /// `post` requests.
    pub csrf_token: String,
}

/// Mutable invocation context passed to the before/after hooks.
///
/// Before hooks may rewrite the target, variables, and attributes prior to
/// building; after hooks may rewrite the final markup in `output`.
#[derive(Debug, Clone)]
pub struct ComponentEvent {
    /// The target name (component name or template path).
    pub target: String,
    /// The invocation variables.
    pub variables: VariableMap,
    /// Caller-supplied wrapper attributes.
    pub attributes: AttributeSet,
    /// The built markup; `None` until building completes.
    pub output: Option<String>,
}

/// A synchronous invocation hook.
pub type ComponentHook = Box<dyn Fn(&mut ComponentEvent)>;

/// Errors raised while building or replaying a component invocation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A variable's value is of a kind that cannot cross the browser
    /// boundary. Carries a rendered diagnostic fragment the host should
    /// surface in place of the component.
    #[error("the variable \"{name}\" cannot be encoded into component state ({kind})")]
    InvalidVariable {
        /// Name of the offending variable.
        name: String,
        /// The rejected category.
        kind: VariableKind,
        /// Human-readable diagnostic markup.
        diagnostic: String,
    },

    /// Neither a component nor a fallback template matches the name.
    #[error("unable to find the component or template \"{name}\"")]
    TargetNotFound {
        /// The attempted target name.
        name: String,
    },

    /// The host failed to render a known target.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Fragment post-processing failed (malformed JSON directive, unsafe
    /// URI scheme, or an HTML rewriting failure).
    #[error(transparent)]
    Fragment(#[from] FragmentError),

    /// A replayed token failed verification.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Replayed invocation state is incomplete.
    #[error(transparent)]
    State(#[from] StateError),
}

impl EngineError {
    /// Returns the HTTP status class for this error.
    ///
    /// Everything except a host-side render failure is a deterministic
    /// input-shape problem and maps to 400 Bad Request.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Resolve(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidVariable { .. }
            | Self::TargetNotFound { .. }
            | Self::Fragment(_)
            | Self::Token(_)
            | Self::State(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Returns the rendered diagnostic fragment, when this error should be
    /// surfaced in place of the component rather than as a request fault.
    #[must_use]
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::InvalidVariable { diagnostic, .. } => Some(diagnostic),
            _ => None,
        }
    }
}

/// Builds replayable component markup.
pub struct ComponentBuilder<'a> {
    config: EngineConfig,
    signer: &'a dyn TokenSigner,
    resolver: &'a dyn ComponentResolver,
    deprecations: &'a dyn DeprecationLogger,
    before_create: Vec<ComponentHook>,
    after_create: Vec<ComponentHook>,
}

impl<'a> ComponentBuilder<'a> {
    /// Creates a builder with the default `tracing` deprecation logger.
    #[must_use]
    pub fn new(
        config: EngineConfig,
        signer: &'a dyn TokenSigner,
        resolver: &'a dyn ComponentResolver,
    ) -> Self {
        Self {
            config,
            signer,
            resolver,
            deprecations: &TracingDeprecationLogger,
            before_create: Vec::new(),
            after_create: Vec::new(),
        }
    }

    /// Replaces the deprecation logger collaborator.
    #[must_use]
    pub fn with_deprecation_logger(mut self, logger: &'a dyn DeprecationLogger) -> Self {
        self.deprecations = logger;
        self
    }

    /// Registers a hook invoked before building, in registration order.
    pub fn on_before_create(&mut self, hook: impl Fn(&mut ComponentEvent) + 'static) {
        self.before_create.push(Box::new(hook));
    }

    /// Registers a hook invoked after building, in registration order.
    pub fn on_after_create(&mut self, hook: impl Fn(&mut ComponentEvent) + 'static) {
        self.after_create.push(Box::new(hook));
    }

    /// Renders a component invocation into replayable markup.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TargetNotFound`] for unknown targets,
    /// [`EngineError::InvalidVariable`] (with a rendered diagnostic) for
    /// unencodable variables, and [`EngineError::Fragment`] when directive
    /// rewriting fails anywhere in the rendered fragment.
    pub fn create(
        &self,
        ctx: &RenderContext,
        target: &str,
        variables: &VariableMap,
        attributes: &AttributeSet,
    ) -> Result<String, EngineError> {
        let codec = VariableCodec::new(self.signer, self.config.array_policy);

        let mut values: Map<String, JsonValue> = Map::new();
        values.insert(
            keys::SITE_ID.to_string(),
            JsonValue::String(self.signer.sign(&ctx.site_id)),
        );

        let mut event = ComponentEvent {
            target: target.to_string(),
            variables: variables.clone(),
            attributes: attributes.clone(),
            output: None,
        };
        for hook in &self.before_create {
            hook(&mut event);
        }

        if !self.resolver.exists(&event.target) {
            return Err(EngineError::TargetNotFound {
                name: event.target.clone(),
            });
        }
        let rendered = self.resolver.render(&event.target, &event.variables)?;

        let processor =
            FragmentProcessor::new(&self.config, self.signer, self.deprecations, &ctx.csrf_token);
        let content = processor.process(&rendered.html)?;

        let target_key = match rendered.kind {
            TargetKind::Component => keys::COMPONENT,
            TargetKind::Template => keys::TEMPLATE,
        };
        values.insert(
            target_key.to_string(),
            JsonValue::String(self.signer.sign(&event.target)),
        );

        for (name, value) in event.variables.iter() {
            let token = codec.encode(name, value).map_err(|err| match err {
                CodecError::InvalidVariable { name, kind } => {
                    let diagnostic = diagnostics::invalid_variable_markup(&name, kind);
                    EngineError::InvalidVariable {
                        name,
                        kind,
                        diagnostic,
                    }
                }
                CodecError::Token(err) => EngineError::Token(err),
            })?;
            values.insert(
                format!("{}[{name}]", keys::VARIABLE_PREFIX),
                JsonValue::String(token),
            );
        }

        // Allow the id to be overridden; a synthesized id never starts
        // with a digit, so it stays a legal scripting identifier.
        let id = event
            .attributes
            .get("id")
            .map_or_else(random_id, str::to_string);

        // Base attributes first, caller attributes merged over them, so
        // that directive-derived values can still override the defaults
        // when the merged set is rewritten below.
        let mut merged = AttributeSet::from_pairs([
            ("id".to_string(), id.clone()),
            ("class".to_string(), "frond-component".to_string()),
            (self.config.wire_attribute("target"), "this".to_string()),
            (self.config.wire_attribute("include"), format!("#{id} *")),
            (self.config.wire_attribute("trigger"), "refresh".to_string()),
            (self.config.wire_attribute("get"), self.config.endpoint.clone()),
            (self.config.wire_attribute("vals"), html_safe_json(&values)),
        ]);
        merged.merge_from(&event.attributes);

        let rewriter =
            AttributeRewriter::new(&self.config, self.signer, self.deprecations, &ctx.csrf_token);
        rewriter.rewrite(&mut merged).map_err(FragmentError::from)?;

        event.output = Some(html_tag("div", &content, &merged));
        for hook in &self.after_create {
            hook(&mut event);
        }

        Ok(event.output.unwrap_or_default())
    }
}

/// Synthesizes a wrapper id. The fixed prefix guarantees the id never
/// starts with a digit.
fn random_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    format!("component-{suffix}")
}

/// Emits an element with the given attribute set and raw content body.
fn html_tag(name: &str, content: &str, attrs: &AttributeSet) -> String {
    let mut out = String::with_capacity(content.len() + 64);
    out.push('<');
    out.push_str(name);
    for (attr, value) in attrs.iter() {
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        out.push_str(&escape_html(value));
        out.push('"');
    }
    out.push('>');
    out.push_str(content);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
    out
}

/// Escapes text for embedding in HTML content or a double-quoted
/// attribute value.
pub(crate) fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
