//! Server-side component rewriting for hypermedia clients.
//!
//! `frond-core` renders small server-side components into HTML fragments
//! and rewrites their markup so that an htmx-style AJAX client can later
//! re-request and refresh them in place. The component's invocation state
//! (target name, input variables, site context) round-trips through the
//! browser as signed, tamper-evident tokens.
//!
//! The engine is built from small, composable layers:
//!
//! - [`token`]: signed tokens and the variable codec — the security
//!   boundary. Invocation variables are validated against strict shape
//!   rules before signing; forged tokens fail closed on replay.
//! - [`directive`]: recognizes the authoring attribute vocabulary
//!   (`f-get`, `frond-swap`, `data-f-val:page`, …) and maps each key to
//!   its canonical logical name.
//! - [`rewrite`]: the per-element state machine turning directives into
//!   wire attributes, with cumulative merging of JSON-valued attributes.
//! - [`fragment`]: applies the rewriter to every element of a rendered
//!   HTML fragment via a streaming HTML rewriter.
//! - [`component`]: composes codec and post-processor into the final
//!   `<div>`-wrapped, replayable component markup, with before/after
//!   hooks and replay decoding.
//!
//! Everything is single-threaded, synchronous, and request-scoped: no
//! component performs I/O or shares mutable state across invocations. The
//! only observable side effect of a rewrite is the deprecation notice.
//!
//! # Example
//!
//! ```rust,no_run
//! use frond_core::attrs::AttributeSet;
//! use frond_core::component::{ComponentBuilder, RenderContext};
//! use frond_core::config::EngineConfig;
//! use frond_core::token::{HmacTokenSigner, VariableMap};
//!
//! # fn example(resolver: &dyn frond_core::component::ComponentResolver) {
//! let signer = HmacTokenSigner::new(*b"secret-key");
//! let builder = ComponentBuilder::new(EngineConfig::default(), &signer, resolver);
//!
//! let ctx = RenderContext {
//!     site_id: "1".to_string(),
//!     csrf_token: "token".to_string(),
//! };
//! let variables = VariableMap::from_iter([("page", 1i64)]);
//! let markup = builder.create(&ctx, "Listing", &variables, &AttributeSet::new());
//! # let _ = markup;
//! # }
//! ```

#![warn(missing_docs)]

pub mod attrs;
pub mod component;
pub mod config;
pub mod deprecation;
pub mod directive;
pub mod fragment;
pub mod rewrite;
pub mod token;

pub use attrs::AttributeSet;
pub use component::{
    ComponentBuilder, ComponentEvent, ComponentResolver, EngineError, InvocationState,
    InvocationTarget, RenderContext, RenderedTarget, ResolveError, TargetKind,
};
pub use config::{ArrayPolicy, EngineConfig};
pub use deprecation::{DeprecationLogger, NullDeprecationLogger, TracingDeprecationLogger};
pub use fragment::{FragmentError, FragmentProcessor};
pub use rewrite::{AttributeRewriter, RewriteError};
pub use token::{
    CodecError, HmacTokenSigner, TokenError, TokenSigner, Variable, VariableCodec, VariableKind,
    VariableMap,
};
