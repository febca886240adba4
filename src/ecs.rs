//! The built-in ECS (virtual machine instance) resource.
//!
//! Sections `compute`, `storage` and `network` open once a region and an
//! availability zone are chosen; `ip` opens once a VPC and subnet are chosen.

use crate::engine::FormEngine;
use crate::error::EngineError;
use crate::evaluate::ContextProvider;
use crate::parse::parse;
use crate::policy::SectionPolicy;
use crate::types::FormSchema;

/// The ECS schema source.
pub const SCHEMA_YAML: &str = include_str!("../schemas/ecs.yaml");

/// Context path holding the project's instance quota.
pub const INSTANCE_QUOTA_PATH: &str = "project.quota.instanceCount";

/// Parses the ECS schema. Cross-references are checked when an engine is built.
pub fn schema() -> Result<FormSchema, EngineError> {
    Ok(parse(SCHEMA_YAML)?)
}

pub fn section_policy() -> SectionPolicy {
    SectionPolicy::new()
        .requires_all("compute", ["basic.region", "basic.az"])
        .requires_all("storage", ["basic.region", "basic.az"])
        .requires_all("network", ["basic.region", "basic.az"])
        .requires_all("ip", ["network.vpc", "network.subnet"])
}

/// An ECS form engine reading quotas from `context`.
pub fn engine(context: impl ContextProvider + 'static) -> Result<FormEngine, EngineError> {
    FormEngine::builder(schema()?)
        .section_policy(section_policy())
        .context(context)
        .build()
}
