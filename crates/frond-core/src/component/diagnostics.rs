//! Rendered diagnostics for unencodable variables.
//!
//! Encode-time kind errors are authoring mistakes, so they surface as a
//! human-readable fragment in place of the component instead of a generic
//! server fault.

use super::escape_html;
use crate::token::VariableKind;

/// Renders the diagnostic fragment for a variable of a rejected kind.
pub(crate) fn invalid_variable_markup(name: &str, kind: VariableKind) -> String {
    let guidance = match kind {
        VariableKind::Element => {
            "Pass the element's id instead, and fetch the element inside the component."
        }
        VariableKind::Model => {
            "Pass the model's identifier or its individual fields as scalar values instead."
        }
        VariableKind::Object => "Pass the object's individual fields as scalar values instead.",
        VariableKind::Array => {
            "This engine is configured with the strict array policy; pass scalar values only."
        }
    };

    format!(
        concat!(
            "<div class=\"frond-error\">",
            "<p>The variable <code>{name}</code> could not be added to this ",
            "component's state because {kind} values cannot be sent to the ",
            "browser.</p>",
            "<p>{guidance}</p>",
            "</div>"
        ),
        name = escape_html(name),
        kind = kind,
        guidance = guidance,
    )
}
