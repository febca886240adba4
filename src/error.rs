use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Diagnostic severity level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

/// A structured, non-fatal diagnostic produced while validating a schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub message: String,
}

/// Error kind for parse failures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    Syntax,
    TypeMismatch,
    UnknownVariant,
}

/// Produced by `parse` when schema deserialization fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        ParseError {
            kind,
            message: message.into(),
            path: None,
            line: None,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, &self.path) {
            (Some(line), _) => write!(f, "line {}: {}", line, self.message),
            (None, Some(path)) => write!(f, "{}: {}", path, self.message),
            (None, None) => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ParseError {}

/// Produced by `validate` when a schema violates a structural rule.
///
/// These are configuration errors: a schema carrying any of them must not be
/// used to build an engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{rule} at {path}: {message}")]
pub struct ValidationError {
    pub rule: String,
    pub path: String,
    pub message: String,
}

/// Result of schema validation: errors and warnings.
#[derive(Clone, Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<Diagnostic>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors then warnings, as one severity-tagged list.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.errors
            .iter()
            .map(Diagnostic::from)
            .chain(self.warnings.iter().cloned())
            .collect()
    }
}

impl From<&ValidationError> for Diagnostic {
    fn from(e: &ValidationError) -> Self {
        Diagnostic {
            severity: DiagnosticSeverity::Error,
            code: e.rule.clone(),
            path: Some(e.path.clone()),
            message: e.message.clone(),
        }
    }
}

/// Serialization error.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SerializeError {
    pub message: String,
}

/// Combined error type for the `load` entry point.
#[derive(Clone, Debug, Error)]
pub enum FormError {
    #[error("Parse error: {0}")]
    Parse(ParseError),
    #[error("Validation error: {0}")]
    Validation(ValidationError),
}

/// Errors returned by engine construction and mutation.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum EngineError {
    #[error("schema could not be parsed: {0}")]
    Parse(#[from] ParseError),
    /// The schema failed validation; the engine refuses to run on it.
    #[error("schema is invalid: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    InvalidSchema(Vec<ValidationError>),
    /// A path does not name a section/field declared in the schema.
    #[error("unknown field '{0}'")]
    UnknownField(String),
    /// A section name is not declared in the schema.
    #[error("unknown section '{0}'")]
    UnknownSection(String),
    /// A dotted path is syntactically malformed.
    #[error("malformed field path '{0}'")]
    MalformedPath(String),
    /// A section policy rule references a path the schema does not declare.
    #[error("section policy for '{section}' references unknown field '{path}'")]
    UnknownPolicyPath { section: String, path: String },
    /// Initial values or a partial update were not shaped as the schema expects.
    #[error("invalid record shape at '{path}': {message}")]
    InvalidRecord { path: String, message: String },
    #[error("invalid engine options: {0}")]
    Options(String),
}
