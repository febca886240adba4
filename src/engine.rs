//! The form engine: a state container over one record, driven by a schema.
//!
//! Every mutation is a pure transition `reduce(state, action) -> state`; the
//! mutating methods replace the current state with the reducer's output, so a
//! failed action leaves the engine untouched.

use crate::actionable;
use crate::config::EngineOptions;
use crate::dependency::{DependencyIndex, is_path_enabled};
use crate::enums::{CascadeMode, FieldType};
use crate::error::{DiagnosticSeverity, EngineError};
use crate::evaluate::*;
use crate::normalize::normalize;
use crate::policy::SectionPolicy;
use crate::primitives::{TypeDefaults, field_value, set_field_value};
use crate::types::*;
use crate::validate::validate;
use serde_json::{Map, Value};
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use tracing::{debug, warn};

/// Snapshot of everything that changes during a form session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormState {
    pub data: Value,
    pub errors: Errors,
    pub touched: BTreeSet<String>,
}

/// A state transition request.
#[derive(Clone, Debug, PartialEq)]
pub enum FormAction {
    /// Write one field (or one property of an object field).
    UpdateField { path: FieldPath, value: Value },
    /// Merge partial data into a section.
    UpdateSection {
        section: String,
        data: Map<String, Value>,
    },
    /// Re-run validation over the whole record.
    Validate,
    /// Mark every field and property as touched.
    TouchAll,
    /// Restore the initial values and clear errors and touched paths.
    Reset,
}

/// Builder for [`FormEngine`]. Construction validates the schema and the
/// section policy, so a built engine never runs on dangling references.
pub struct FormEngineBuilder {
    schema: FormSchema,
    policy: SectionPolicy,
    options: EngineOptions,
    context: Box<dyn ContextProvider>,
    initial: Option<Value>,
    defaults: TypeDefaults,
}

impl FormEngineBuilder {
    pub fn section_policy(mut self, policy: SectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn context(mut self, context: impl ContextProvider + 'static) -> Self {
        self.context = Box::new(context);
        self
    }

    /// Starting values. Missing sections and fields are filled with defaults;
    /// keys the schema does not declare are rejected at build time.
    pub fn initial_values(mut self, initial: Value) -> Self {
        self.initial = Some(initial);
        self
    }

    pub fn type_defaults(mut self, defaults: TypeDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn build(self) -> Result<FormEngine, EngineError> {
        let result = validate(&self.schema);
        for d in result.diagnostics() {
            match d.severity {
                DiagnosticSeverity::Error => {
                    debug!(code = %d.code, path = ?d.path, "{}", d.message)
                }
                DiagnosticSeverity::Warning => {
                    warn!(code = %d.code, path = ?d.path, "{}", d.message)
                }
            }
        }
        if !result.is_valid() {
            return Err(EngineError::InvalidSchema(result.errors));
        }

        let schema = normalize(self.schema);
        self.policy.check_against(&schema)?;
        precompile_patterns(&schema);

        let initial = initial_record(&schema, self.initial.as_ref(), &self.defaults)?;
        let index = DependencyIndex::build(&schema);
        debug!(
            resource = %schema.resource,
            version = schema.version,
            sections = schema.sections.len(),
            "built form engine"
        );

        Ok(FormEngine {
            state: FormState {
                data: initial.clone(),
                ..FormState::default()
            },
            schema,
            policy: self.policy,
            options: self.options,
            context: self.context,
            defaults: self.defaults,
            index,
            initial,
        })
    }
}

/// Builds the starting record: provided values where given, defaults elsewhere.
fn initial_record(
    schema: &FormSchema,
    provided: Option<&Value>,
    defaults: &TypeDefaults,
) -> Result<Value, EngineError> {
    let provided = match provided {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(map),
        Some(_) => {
            return Err(EngineError::InvalidRecord {
                path: String::new(),
                message: "initial values must be an object".to_string(),
            });
        }
    };

    if let Some(map) = provided {
        for (section_name, section_value) in map {
            let section = schema
                .section(section_name)
                .ok_or_else(|| EngineError::UnknownSection(section_name.clone()))?;
            let fields = section_value
                .as_object()
                .ok_or_else(|| EngineError::InvalidRecord {
                    path: section_name.clone(),
                    message: "section values must be an object".to_string(),
                })?;
            for key in fields.keys() {
                if section.field(key).is_none() {
                    return Err(EngineError::UnknownField(format!("{}.{}", section_name, key)));
                }
            }
        }
    }

    let mut record = Map::new();
    for section in &schema.sections {
        let given = provided.and_then(|m| m.get(&section.name));
        let mut values = Map::new();
        for field in &section.fields {
            let value = match given.and_then(|g| g.get(&field.name)) {
                Some(v) if !v.is_null() => fill_properties(field, v.clone(), defaults),
                _ => defaults.default_for(field),
            };
            values.insert(field.name.clone(), value);
        }
        record.insert(section.name.clone(), Value::Object(values));
    }
    Ok(Value::Object(record))
}

/// Fills missing declared properties of an object value with their defaults.
fn fill_properties(field: &FieldSchema, mut value: Value, defaults: &TypeDefaults) -> Value {
    if let (Some(props), Some(map)) = (&field.properties, value.as_object_mut()) {
        for prop in props {
            if !map.contains_key(&prop.name) {
                map.insert(prop.name.clone(), defaults.default_for(prop));
            }
        }
    }
    value
}

/// Schema-driven state container for one multi-section record.
pub struct FormEngine {
    schema: FormSchema,
    policy: SectionPolicy,
    options: EngineOptions,
    context: Box<dyn ContextProvider>,
    defaults: TypeDefaults,
    index: DependencyIndex,
    initial: Value,
    state: FormState,
}

impl fmt::Debug for FormEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormEngine")
            .field("resource", &self.schema.resource)
            .field("options", &self.options)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl FormEngine {
    pub fn builder(schema: FormSchema) -> FormEngineBuilder {
        FormEngineBuilder {
            schema,
            policy: SectionPolicy::default(),
            options: EngineOptions::default(),
            context: Box::new(EmptyContext),
            initial: None,
            defaults: TypeDefaults::default(),
        }
    }

    // ─── Snapshots ──────────────────────────────────────────────────────────

    pub fn form_data(&self) -> &Value {
        &self.state.data
    }

    pub fn errors(&self) -> &Errors {
        &self.state.errors
    }

    pub fn touched(&self) -> &BTreeSet<String> {
        &self.state.touched
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Errors on paths the user has touched (directly, or through the owning
    /// field for nested paths).
    pub fn visible_errors(&self) -> Errors {
        self.state
            .errors
            .iter()
            .filter(|(path, _)| {
                self.state.touched.contains(*path)
                    || path
                        .parse::<FieldPath>()
                        .map(|p| self.state.touched.contains(&p.owner().to_string()))
                        .unwrap_or(false)
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    // ─── Commands ───────────────────────────────────────────────────────────

    /// Applies an action, replacing the state only if it succeeds.
    pub fn apply(&mut self, action: &FormAction) -> Result<(), EngineError> {
        self.state = self.reduce(&self.state, action)?;
        Ok(())
    }

    /// Writes `value` to `section.field` (`field` may be `object.property`),
    /// re-validates that field and cascades resets downstream.
    pub fn update_field(
        &mut self,
        section: &str,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<(), EngineError> {
        let path = FieldPath::in_section(section, field)?;
        self.apply(&FormAction::UpdateField {
            path,
            value: value.into(),
        })
    }

    /// Merges `data` into `section` and re-validates the whole section.
    pub fn update_section(&mut self, section: &str, data: Value) -> Result<(), EngineError> {
        let data = match data {
            Value::Object(map) => map,
            _ => {
                return Err(EngineError::InvalidRecord {
                    path: section.to_string(),
                    message: "section update must be an object".to_string(),
                });
            }
        };
        self.apply(&FormAction::UpdateSection {
            section: section.to_string(),
            data,
        })
    }

    /// Validates every field, replaces the error map, and returns it.
    pub fn validate(&mut self) -> &Errors {
        self.state.errors = validate_all(&self.schema, &self.state.data, self.context.as_ref());
        &self.state.errors
    }

    pub fn reset(&mut self) {
        self.state = FormState {
            data: self.initial.clone(),
            ..FormState::default()
        };
    }

    /// Validates, marks everything touched, and returns the record if no
    /// actionable error remains.
    pub fn submit(&mut self) -> Result<Value, Errors> {
        self.validate();
        self.state.touched = self.all_paths();
        let blocking = self.actionable_errors();
        if blocking.is_empty() {
            debug!(resource = %self.schema.resource, "submission accepted");
            Ok(self.state.data.clone())
        } else {
            debug!(count = blocking.len(), "submission blocked");
            Err(blocking)
        }
    }

    // ─── Queries ────────────────────────────────────────────────────────────

    pub fn get_field_value(&self, section: &str, field: &str) -> Option<&Value> {
        let path = FieldPath::in_section(section, field).ok()?;
        self.schema.lookup(&path)?;
        field_value(&self.state.data, &path)
    }

    pub fn get_field_config(&self, section: &str, field: &str) -> Option<&FieldSchema> {
        let path = FieldPath::in_section(section, field).ok()?;
        self.schema.lookup(&path)
    }

    /// Undeclared fields are reported as disabled.
    pub fn is_field_enabled(&self, section: &str, field: &str) -> bool {
        match FieldPath::in_section(section, field) {
            Ok(path) => is_path_enabled(&self.schema, &path, &self.state.data),
            Err(_) => false,
        }
    }

    pub fn is_section_enabled(&self, section: &str) -> bool {
        self.schema.section(section).is_some() && self.policy.is_enabled(section, &self.state.data)
    }

    pub fn get_context_value(&self, path: &str) -> Option<Value> {
        self.context.resolve(path)
    }

    /// The effective upper bound of a field after context resolution.
    pub fn get_max_value(&self, section: &str, field: &str) -> Option<f64> {
        let node = self.get_field_config(section, field)?;
        resolve_max(node, self.context.as_ref()).map(|b| b.value)
    }

    /// Evaluates `value` against a field's rules without touching state.
    pub fn validate_field(&self, section: &str, field: &str, value: &Value) -> Option<String> {
        let node = self.get_field_config(section, field)?;
        evaluate_field(node, Some(value), self.context.as_ref())
    }

    /// The subset of current errors that blocks submission.
    pub fn actionable_errors(&self) -> Errors {
        actionable::actionable_errors(
            &self.schema,
            &self.policy,
            &self.state.errors,
            &self.state.data,
            self.context.as_ref(),
        )
    }

    // ─── Reducer ────────────────────────────────────────────────────────────

    /// Pure transition: computes the state after `action` without mutating
    /// the engine.
    pub fn reduce(&self, state: &FormState, action: &FormAction) -> Result<FormState, EngineError> {
        let mut next = state.clone();
        match action {
            FormAction::UpdateField { path, value } => {
                self.reduce_update_field(&mut next, path, value)?;
            }
            FormAction::UpdateSection { section, data } => {
                self.reduce_update_section(&mut next, section, data)?;
            }
            FormAction::Validate => {
                next.errors = validate_all(&self.schema, &next.data, self.context.as_ref());
            }
            FormAction::TouchAll => {
                next.touched = self.all_paths();
            }
            FormAction::Reset => {
                next = FormState {
                    data: self.initial.clone(),
                    ..FormState::default()
                };
            }
        }
        Ok(next)
    }

    fn reduce_update_field(
        &self,
        state: &mut FormState,
        path: &FieldPath,
        value: &Value,
    ) -> Result<(), EngineError> {
        if self.schema.lookup(path).is_none() {
            return Err(EngineError::UnknownField(path.to_string()));
        }

        let previous = field_value(&state.data, path).cloned();
        set_field_value(&mut state.data, path, value.clone());
        state.touched.insert(path.to_string());

        if self.options.validate_on_change {
            self.revalidate_owner(state, &path.owner());
        }

        if previous.as_ref() != Some(value) {
            self.cascade(state, path, &BTreeSet::new());
        }
        Ok(())
    }

    fn reduce_update_section(
        &self,
        state: &mut FormState,
        section: &str,
        data: &Map<String, Value>,
    ) -> Result<(), EngineError> {
        let section_schema = self
            .schema
            .section(section)
            .ok_or_else(|| EngineError::UnknownSection(section.to_string()))?;

        let mut changed = Vec::new();
        let mut written = BTreeSet::new();
        for (key, incoming) in data {
            let field = section_schema
                .field(key)
                .ok_or_else(|| EngineError::UnknownField(format!("{}.{}", section, key)))?;
            let path = FieldPath::new(section, key.clone());
            let previous = field_value(&state.data, &path).cloned();
            let merged = merge_field(field, &path, previous.as_ref(), incoming)?;

            if previous.as_ref() != Some(&merged) {
                changed.push(path.clone());
            }
            set_field_value(&mut state.data, &path, merged);
            state.touched.insert(path.to_string());
            written.insert(path);
        }

        for path in &changed {
            self.cascade(state, path, &written);
        }

        // After the cascade, so the section's errors describe its final values.
        if self.options.validate_on_change {
            validate_section_into(section_schema, &state.data, self.context.as_ref(), &mut state.errors);
        }
        Ok(())
    }

    fn revalidate_owner(&self, state: &mut FormState, owner: &FieldPath) {
        if let Some(field) = self.schema.lookup(owner) {
            let results = evaluate_field_tree(field, owner, &state.data, self.context.as_ref());
            apply_results(&mut state.errors, results);
        }
    }

    /// Blanks every field downstream of `origin`.
    ///
    /// Each field resets at most once per call and the origin is never reset.
    /// Fields in `protected` (explicitly written by the same update) are left
    /// alone. In fixed-point mode every reset field propagates further.
    fn cascade(&self, state: &mut FormState, origin: &FieldPath, protected: &BTreeSet<FieldPath>) {
        let mut queue = VecDeque::from([origin.clone()]);
        let mut done: BTreeSet<FieldPath> = BTreeSet::new();

        while let Some(changed) = queue.pop_front() {
            for target in self.index.targets_of(&changed) {
                if target == *origin
                    || target == origin.owner()
                    || protected.contains(&target)
                    || done.contains(&target)
                {
                    continue;
                }
                let Some(node) = self.schema.lookup(&target) else {
                    continue;
                };

                set_field_value(&mut state.data, &target, self.defaults.default_for(node));
                let key = target.to_string();
                let nested_prefix = format!("{}.", key);
                state
                    .errors
                    .retain(|k, _| *k != key && !k.starts_with(&nested_prefix));
                if self.options.untouch_on_reset {
                    state
                        .touched
                        .retain(|k| *k != key && !k.starts_with(&nested_prefix));
                }
                debug!(from = %changed, reset = %target, "cascade reset");

                done.insert(target.clone());
                if self.options.cascade == CascadeMode::FixedPoint {
                    queue.push_back(target);
                }
            }
        }
    }

    fn all_paths(&self) -> BTreeSet<String> {
        self.schema
            .field_paths()
            .iter()
            .map(ToString::to_string)
            .collect()
    }
}

/// Computes a field's value after a section merge. Object fields merge one
/// level deep; when they declare properties, only declared keys are accepted.
fn merge_field(
    field: &FieldSchema,
    path: &FieldPath,
    previous: Option<&Value>,
    incoming: &Value,
) -> Result<Value, EngineError> {
    if field.field_type != FieldType::Object {
        return Ok(incoming.clone());
    }
    let Some(incoming_map) = incoming.as_object() else {
        return Ok(incoming.clone());
    };

    if field.properties.is_some() {
        for key in incoming_map.keys() {
            if field.property(key).is_none() {
                return Err(EngineError::UnknownField(format!("{}.{}", path, key)));
            }
        }
    }

    let mut merged = previous
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    for (k, v) in incoming_map {
        merged.insert(k.clone(), v.clone());
    }
    Ok(Value::Object(merged))
}
