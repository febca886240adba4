//! Engine behaviour options.

use crate::enums::CascadeMode;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// Options controlling how the engine reacts to updates.
///
/// Every key is optional in YAML; missing keys take the defaults below.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct EngineOptions {
    /// Reset propagation policy for upstream changes.
    pub cascade: CascadeMode,
    /// Re-validate fields as they are updated. When off, errors only change
    /// through `validate`.
    pub validate_on_change: bool,
    /// Drop reset fields from the touched set so they do not surface errors
    /// before the user revisits them.
    pub untouch_on_reset: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            cascade: CascadeMode::FixedPoint,
            validate_on_change: true,
            untouch_on_reset: true,
        }
    }
}

impl EngineOptions {
    pub fn from_yaml(input: &str) -> Result<Self, EngineError> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_saphyr::from_str(input).map_err(|e| EngineError::Options(e.to_string()))
    }
}
