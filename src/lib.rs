//! Schema-driven dependent form engine.
//!
//! A form is a multi-section record (for example a virtual machine creation
//! request). Each field's default, validity and enabled state derive from a
//! static declarative schema plus the current record, not from per-field code.
//! The crate provides the whole pipeline from schema source to a running
//! engine:
//!
//! ```text
//! parse(yaml) → FormSchema → validate(schema) → ValidationResult
//!                          → normalize(schema) → FormSchema → FormEngine
//!                          → serialize(schema) → yaml
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use formengine::{FormEngine, SectionPolicy};
//! use serde_json::json;
//!
//! let yaml = r#"
//! resource: vm
//! sections:
//!   - name: basic
//!     fields:
//!       - name: region
//!         type: string
//!         required: true
//!         onChange:
//!           reset: [az]
//!       - name: az
//!         type: string
//!         required: true
//!   - name: network
//!     fields:
//!       - name: vpc
//!         type: string
//!         required: true
//!         dependsOn: [basic.region]
//! "#;
//!
//! let schema = formengine::load(yaml).expect("valid schema").schema;
//! let mut engine = FormEngine::builder(schema)
//!     .section_policy(SectionPolicy::new().requires_all("network", ["basic.region", "basic.az"]))
//!     .build()
//!     .expect("engine");
//!
//! engine.update_field("basic", "region", "us-east-1").unwrap();
//! engine.update_field("basic", "az", "us-east-1a").unwrap();
//! engine.update_field("network", "vpc", "vpc-1").unwrap();
//!
//! // Changing the region blanks everything downstream of it.
//! engine.update_field("basic", "region", "eu-west-1").unwrap();
//! assert_eq!(engine.get_field_value("basic", "az"), Some(&json!("")));
//! assert_eq!(engine.get_field_value("network", "vpc"), Some(&json!("")));
//! ```
//!
//! # Logging
//!
//! The crate emits [`tracing`] events (cascade resets and builds at `debug`,
//! per-field evaluation at `trace`, fail-open conditions at `warn`). It never
//! installs a subscriber.

pub mod actionable;
pub mod config;
pub mod dependency;
pub mod ecs;
pub mod engine;
pub mod enums;
pub mod error;
pub mod evaluate;
pub mod normalize;
pub mod parse;
pub mod policy;
pub mod primitives;
pub mod serialize;
pub mod types;
pub mod validate;

pub use config::EngineOptions;
pub use engine::{FormAction, FormEngine, FormEngineBuilder, FormState};
pub use enums::*;
pub use error::*;
pub use evaluate::{ContextProvider, EmptyContext, Errors};
pub use policy::{SectionPolicy, SectionRule};
pub use types::*;

// Re-export entry-point functions at the crate root for convenience.
pub use normalize::normalize;
pub use parse::parse;
pub use serialize::serialize;
pub use validate::validate;

/// Result of the [`load`] convenience entry point.
pub struct LoadResult {
    /// The normalized schema.
    pub schema: FormSchema,
    /// Non-fatal warnings produced during validation.
    pub warnings: Vec<Diagnostic>,
}

/// Convenience entry point composing parse → validate → normalize.
///
/// # Errors
///
/// Returns `Err(Vec<FormError>)` if parsing fails or validation finds errors.
pub fn load(input: &str) -> Result<LoadResult, Vec<FormError>> {
    let schema = parse::parse(input).map_err(|e| vec![FormError::Parse(e)])?;

    let result = validate::validate(&schema);
    if !result.errors.is_empty() {
        return Err(result
            .errors
            .into_iter()
            .map(FormError::Validation)
            .collect());
    }

    Ok(LoadResult {
        schema: normalize::normalize(schema),
        warnings: result.warnings,
    })
}
