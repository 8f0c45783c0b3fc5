//! Synthesizes human-readable tool descriptions from parameter metadata.

use std::fmt::Write as _;

use crate::params::ParamSpec;

/// Renders a fallback description for a callable with no declared one.
///
/// The output lists each parameter with its type, requiredness, and any
/// attached constraints, one bullet per parameter.
#[must_use]
pub fn describe_callable(name: &str, params: &[ParamSpec]) -> String {
    if params.is_empty() {
        return format!("Invokes '{name}'. Takes no parameters.");
    }

    let mut text = format!("Invokes '{name}' with the following parameters:");
    for param in params {
        let _ = write!(
            text,
            "\n- {} ({}{})",
            param.resolved_name(),
            param.param_type().display_name(),
            if param.is_required() { ", required" } else { "" },
        );
        let constraints = param.constraints();
        if let Some(description) = constraints.description() {
            let _ = write!(text, ": {description}");
        }
        let mut notes = Vec::new();
        if let Some(minimum) = constraints.minimum() {
            notes.push(format!("minimum {minimum}"));
        }
        if let Some(maximum) = constraints.maximum() {
            notes.push(format!("maximum {maximum}"));
        }
        if let (Some(min), Some(max)) = (constraints.min_length(), constraints.max_length()) {
            notes.push(format!("length {min}..{max}"));
        }
        if let Some(pattern) = constraints.pattern() {
            notes.push(format!("pattern '{pattern}'"));
        }
        if let Some(default) = constraints.default_value() {
            notes.push(format!("defaults to {default}"));
        }
        if !notes.is_empty() {
            let _ = write!(text, " [{}]", notes.join(", "));
        }
    }
    text
}
