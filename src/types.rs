use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::enums::*;
use crate::error::EngineError;

fn default_version() -> u32 {
    1
}

fn is_false(b: &bool) -> bool {
    !*b
}

// ─── Schema ─────────────────────────────────────────────────────────────────

/// Static, versioned schema for one resource type: an ordered list of sections.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormSchema {
    pub resource: String,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub sections: Vec<SectionSchema>,
}

/// A named group of fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionSchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

/// Declarative description of one field.
///
/// Object fields may declare `properties`, each a nested `FieldSchema` with
/// its own `required` flag. Array fields may declare an `items` schema that
/// every element is checked against.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct FieldSchema {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Bound>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_message: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldSchema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<FieldSchema>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<DisabledRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_change: Option<OnChange>,
}

impl FieldSchema {
    /// A bare field of the given name and type with every rule unset.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        FieldSchema {
            name: name.into(),
            field_type,
            required: false,
            label: None,
            description: None,
            default: None,
            min: None,
            max: None,
            min_length: None,
            max_length: None,
            pattern: None,
            pattern_message: None,
            allowed: None,
            min_items: None,
            max_items: None,
            items: None,
            properties: None,
            depends_on: Vec::new(),
            disabled: None,
            on_change: None,
        }
    }

    /// The label used in messages: the declared label, else the humanized name.
    pub fn display_label(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => crate::primitives::humanize(&self.name),
        }
    }

    /// Looks up a declared object property by name.
    pub fn property(&self, name: &str) -> Option<&FieldSchema> {
        self.properties
            .as_ref()
            .and_then(|props| props.iter().find(|p| p.name == name))
    }

    pub fn reset_targets(&self) -> &[String] {
        self.on_change
            .as_ref()
            .map(|c| c.reset.as_slice())
            .unwrap_or(&[])
    }
}

impl SectionSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl FormSchema {
    pub fn section(&self, name: &str) -> Option<&SectionSchema> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn field(&self, section: &str, field: &str) -> Option<&FieldSchema> {
        self.section(section).and_then(|s| s.field(field))
    }

    /// Resolves a typed path to the schema node it names, descending into
    /// object properties for nested paths.
    pub fn lookup(&self, path: &FieldPath) -> Option<&FieldSchema> {
        let field = self.field(&path.section, &path.field)?;
        match &path.property {
            Some(prop) => field.property(prop),
            None => Some(field),
        }
    }

    /// Returns true when the dotted path names a declared field or property.
    pub fn contains_path(&self, path: &str) -> bool {
        path.parse::<FieldPath>()
            .ok()
            .and_then(|p| self.lookup(&p))
            .is_some()
    }

    /// Every field path in declaration order, each object field followed by
    /// its declared properties.
    pub fn field_paths(&self) -> Vec<FieldPath> {
        let mut paths = Vec::new();
        for section in &self.sections {
            for field in &section.fields {
                paths.push(FieldPath::new(section.name.clone(), field.name.clone()));
                for prop in field.properties.iter().flatten() {
                    paths.push(FieldPath::nested(
                        section.name.clone(),
                        field.name.clone(),
                        prop.name.clone(),
                    ));
                }
            }
        }
        paths
    }
}

// ─── Bounds ─────────────────────────────────────────────────────────────────

/// An upper numeric bound: a literal, or a value read from external context
/// (for example a project quota).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bound {
    Static(f64),
    Context {
        context: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fallback: Option<f64>,
    },
}

// ─── Enablement ─────────────────────────────────────────────────────────────

/// `disabled: { when: <predicate> }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisabledRule {
    pub when: Predicate,
}

/// `onChange: { reset: [..] }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OnChange {
    #[serde(default)]
    pub reset: Vec<String>,
}

/// A disablement predicate, decided once when the schema is loaded.
///
/// Written as `"!path"` (disabled while `path` is falsy) or `"path"` (disabled
/// while `path` is truthy). Any other form is kept as `Unsupported` and never
/// disables the field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Predicate {
    Not(String),
    Truthy(String),
    Unsupported(String),
}

impl Predicate {
    pub fn parse(raw: &str) -> Predicate {
        let trimmed = raw.trim();
        let (negated, path) = match trimmed.strip_prefix('!') {
            Some(rest) => (true, rest.trim()),
            None => (false, trimmed),
        };
        if !is_path_like(path) {
            return Predicate::Unsupported(raw.to_string());
        }
        if negated {
            Predicate::Not(path.to_string())
        } else {
            Predicate::Truthy(path.to_string())
        }
    }

    /// The path the predicate reads, if it is a supported form.
    pub fn path(&self) -> Option<&str> {
        match self {
            Predicate::Not(p) | Predicate::Truthy(p) => Some(p),
            Predicate::Unsupported(_) => None,
        }
    }
}

fn is_path_like(s: &str) -> bool {
    !s.is_empty()
        && s.split('.').all(|seg| {
            !seg.is_empty() && seg.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        })
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Not(p) => write!(f, "!{}", p),
            Predicate::Truthy(p) => write!(f, "{}", p),
            Predicate::Unsupported(raw) => write!(f, "{}", raw),
        }
    }
}

impl Serialize for Predicate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Predicate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Predicate::parse(&raw))
    }
}

// ─── Paths ──────────────────────────────────────────────────────────────────

/// A typed dotted path: `section.field` or `section.field.property`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    pub section: String,
    pub field: String,
    pub property: Option<String>,
}

impl FieldPath {
    pub fn new(section: impl Into<String>, field: impl Into<String>) -> Self {
        FieldPath {
            section: section.into(),
            field: field.into(),
            property: None,
        }
    }

    pub fn nested(
        section: impl Into<String>,
        field: impl Into<String>,
        property: impl Into<String>,
    ) -> Self {
        FieldPath {
            section: section.into(),
            field: field.into(),
            property: Some(property.into()),
        }
    }

    /// Builds a path from a section name and a field reference that may itself
    /// carry a property (`systemDisk.size`).
    pub fn in_section(section: &str, field: &str) -> Result<Self, EngineError> {
        format!("{}.{}", section, field).parse()
    }

    pub fn is_nested(&self) -> bool {
        self.property.is_some()
    }

    /// The top-level field that owns this path.
    pub fn owner(&self) -> FieldPath {
        FieldPath::new(self.section.clone(), self.field.clone())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.property {
            Some(prop) => write!(f, "{}.{}.{}", self.section, self.field, prop),
            None => write!(f, "{}.{}", self.section, self.field),
        }
    }
}

impl FromStr for FieldPath {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = s.split('.').collect();
        if segments.iter().any(|seg| seg.is_empty()) {
            return Err(EngineError::MalformedPath(s.to_string()));
        }
        match segments.as_slice() {
            [section, field] => Ok(FieldPath::new(*section, *field)),
            [section, field, prop] => Ok(FieldPath::nested(*section, *field, *prop)),
            _ => Err(EngineError::MalformedPath(s.to_string())),
        }
    }
}
