//! Section enablement policy.
//!
//! Whether a whole section is reachable is resource-specific policy, kept as an
//! explicit mapping from section name to a rule over the record. Sections
//! without a rule are always enabled.

use crate::error::EngineError;
use crate::primitives::{get_path, is_empty_value};
use crate::types::FormSchema;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Predicate over the whole record.
pub type RecordPredicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// How one section decides whether it is enabled.
#[derive(Clone)]
pub enum SectionRule {
    /// Enabled when every listed `section.field` path holds a non-empty value.
    RequiresAll(Vec<String>),
    /// Enabled when the predicate returns true.
    Custom(RecordPredicate),
}

impl SectionRule {
    pub fn evaluate(&self, record: &Value) -> bool {
        match self {
            SectionRule::RequiresAll(paths) => paths
                .iter()
                .all(|p| !is_empty_value(get_path(record, p))),
            SectionRule::Custom(predicate) => predicate(record),
        }
    }
}

impl fmt::Debug for SectionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionRule::RequiresAll(paths) => f.debug_tuple("RequiresAll").field(paths).finish(),
            SectionRule::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Mapping from section name to its enablement rule.
#[derive(Clone, Debug, Default)]
pub struct SectionPolicy {
    rules: BTreeMap<String, SectionRule>,
}

impl SectionPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables `section` only while every path in `paths` is non-empty.
    pub fn requires_all<I, S>(mut self, section: impl Into<String>, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.insert(
            section.into(),
            SectionRule::RequiresAll(paths.into_iter().map(Into::into).collect()),
        );
        self
    }

    /// Enables `section` while `predicate` holds for the record.
    pub fn custom<F>(mut self, section: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.rules
            .insert(section.into(), SectionRule::Custom(Arc::new(predicate)));
        self
    }

    pub fn rule(&self, section: &str) -> Option<&SectionRule> {
        self.rules.get(section)
    }

    pub fn is_enabled(&self, section: &str, record: &Value) -> bool {
        self.rule(section)
            .map(|rule| rule.evaluate(record))
            .unwrap_or(true)
    }

    /// Rejects rules for undeclared sections and `RequiresAll` paths the
    /// schema does not declare.
    pub fn check_against(&self, schema: &FormSchema) -> Result<(), EngineError> {
        for (section, rule) in &self.rules {
            if schema.section(section).is_none() {
                return Err(EngineError::UnknownSection(section.clone()));
            }
            if let SectionRule::RequiresAll(paths) = rule {
                for path in paths {
                    if !schema.contains_path(path) {
                        return Err(EngineError::UnknownPolicyPath {
                            section: section.clone(),
                            path: path.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
