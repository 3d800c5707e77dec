//! Engine configuration.
//!
//! Configuration is a plain struct handed to the builder and processor at
//! construction time. Nothing in this crate reads ambient or global state at
//! call time, so two engines with different configurations can coexist in
//! one process.

use serde::{Deserialize, Serialize};

/// Validation policy for array-valued invocation variables.
///
/// The engine supports two mutually incompatible policies because both are
/// depended upon by existing deployments. Under [`ArrayPolicy::Lenient`],
/// arrays whose leaves are all scalars may be encoded into tokens. Under
/// [`ArrayPolicy::Strict`], any array is rejected outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrayPolicy {
    /// Arrays of scalars (recursively) are accepted.
    #[default]
    Lenient,

    /// Any array is rejected with an invalid-variable error.
    Strict,
}

/// Configuration for the component engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// URL of the server endpoint that re-renders components.
    ///
    /// Every synthesized verb attribute points here.
    pub endpoint: String,

    /// When `true`, every emitted wire attribute carries a `data-` prefix
    /// (`data-hx-get` instead of `hx-get`) for strict-markup authoring
    /// contexts. Applied uniformly to every emission site.
    pub data_prefix: bool,

    /// Array validation policy for the variable codec.
    pub array_policy: ArrayPolicy,

    /// Name of the anti-forgery header injected into the headers wire
    /// attribute when a component issues a `post` request.
    pub csrf_header: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint: "/frond/components/render".to_string(),
            data_prefix: false,
            array_policy: ArrayPolicy::default(),
            csrf_header: "X-CSRF-Token".to_string(),
        }
    }
}

impl EngineConfig {
    /// Returns the wire attribute name for a logical name, applying the
    /// configured `data-` prefix.
    #[must_use]
    pub fn wire_attribute(&self, name: &str) -> String {
        if self.data_prefix {
            format!("data-hx-{name}")
        } else {
            format!("hx-{name}")
        }
    }
}
