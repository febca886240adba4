//! Actionable-error filtering.
//!
//! The raw error map accumulates entries for sections the user cannot reach yet
//! and for values that have since become valid. Only the subset computed here
//! may block submission.

use crate::dependency::is_field_enabled;
use crate::evaluate::{ContextProvider, Errors, evaluate_field};
use crate::policy::SectionPolicy;
use crate::primitives::{field_value, is_empty_value};
use crate::types::{FieldPath, FormSchema};
use serde_json::Value;
use tracing::debug;

/// Returns the errors that should block submission.
///
/// An entry survives when its field (and, for a nested path, both the owning
/// object field and the property) is required, its section and owning field are
/// enabled, and the live value is still empty or still fails evaluation.
pub fn actionable_errors(
    schema: &FormSchema,
    policy: &SectionPolicy,
    errors: &Errors,
    record: &Value,
    ctx: &dyn ContextProvider,
) -> Errors {
    errors
        .iter()
        .filter(|(path, _)| is_actionable(schema, policy, path, record, ctx))
        .map(|(path, message)| (path.clone(), message.clone()))
        .collect()
}

/// Decides a single error path. Paths unknown to the schema are never
/// actionable.
pub fn is_actionable(
    schema: &FormSchema,
    policy: &SectionPolicy,
    path: &str,
    record: &Value,
    ctx: &dyn ContextProvider,
) -> bool {
    let parsed: FieldPath = match path.parse() {
        Ok(p) => p,
        Err(_) => {
            debug!(path, "dropping error with malformed path");
            return false;
        }
    };
    let owner = match schema.field(&parsed.section, &parsed.field) {
        Some(f) => f,
        None => {
            debug!(path, "dropping error for undeclared field");
            return false;
        }
    };
    let node = match schema.lookup(&parsed) {
        Some(n) => n,
        None => {
            debug!(path, "dropping error for undeclared property");
            return false;
        }
    };

    if !owner.required || !node.required {
        return false;
    }
    if !policy.is_enabled(&parsed.section, record) {
        return false;
    }
    if !is_field_enabled(schema, &parsed.section, owner, record) {
        return false;
    }

    let live = field_value(record, &parsed);
    is_empty_value(live) || evaluate_field(node, live, ctx).is_some()
}
