//! Generic interpreter for the member schema.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use phonenumber::country;
use serde_json::{Map, Number, Value};
use tracing::debug;

use roster_config::{UnknownFieldPolicy, ValidationConfig};

use super::enums::EnumRegistry;
use super::errors::{NormalizedRecord, ValidationError, ValidationErrorKind, ValidationErrors};
use super::normalize::{normalize_name, normalize_phone};
use super::schema::{Blank, Constraint, FieldSpec, MemberSchema, Mode, Normalizer, Shape};

/// Largest magnitude an `f64` holds without losing integer precision.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, thiserror::Error)]
#[error("unknown phone region `{0}`")]
pub struct UnknownRegion(pub String);

/// Validates raw member input against a [`MemberSchema`].
///
/// A validator holds no mutable state; share it behind an `Arc` and call it
/// from any task.
#[derive(Debug, Clone)]
pub struct Validator {
    schema: MemberSchema,
    registry: Arc<EnumRegistry>,
    region: country::Id,
    unknown_fields: UnknownFieldPolicy,
}

impl Validator {
    pub fn new(schema: MemberSchema, registry: Arc<EnumRegistry>) -> Self {
        Self {
            schema,
            registry,
            region: country::Id::US,
            unknown_fields: UnknownFieldPolicy::Reject,
        }
    }

    /// The standard member schema, US phone numbers, unknown fields rejected.
    pub fn standard(registry: Arc<EnumRegistry>) -> Self {
        let schema = MemberSchema::standard(&registry);
        Self::new(schema, registry)
    }

    /// The standard schema with region and unknown-field policy taken from configuration.
    pub fn from_config(
        config: &ValidationConfig,
        registry: Arc<EnumRegistry>,
    ) -> Result<Self, UnknownRegion> {
        let region = config
            .default_region
            .trim()
            .to_uppercase()
            .parse::<country::Id>()
            .map_err(|_| UnknownRegion(config.default_region.clone()))?;

        Ok(Self::standard(registry)
            .with_region(region)
            .with_unknown_fields(config.unknown_fields))
    }

    pub fn with_region(mut self, region: country::Id) -> Self {
        self.region = region;
        self
    }

    pub fn with_unknown_fields(mut self, policy: UnknownFieldPolicy) -> Self {
        self.unknown_fields = policy;
        self
    }

    pub fn schema(&self) -> &MemberSchema {
        &self.schema
    }

    pub fn registry(&self) -> &EnumRegistry {
        &self.registry
    }

    pub fn region(&self) -> country::Id {
        self.region
    }

    /// Validate `raw` against the current instant.
    pub fn validate(&self, raw: &Value, mode: Mode) -> Result<NormalizedRecord, ValidationErrors> {
        self.validate_at(raw, mode, Utc::now())
    }

    /// Validate `raw`, treating `now` as the current instant for past-date checks.
    ///
    /// Every field is evaluated; the error list follows schema declaration
    /// order with unknown keys reported after the declared fields of their object.
    pub fn validate_at(
        &self,
        raw: &Value,
        mode: Mode,
        now: DateTime<Utc>,
    ) -> Result<NormalizedRecord, ValidationErrors> {
        let Value::Object(input) = raw else {
            return Err(ValidationError::new(
                "value",
                ValidationErrorKind::InvalidType,
                "\"value\" must be of type object",
            )
            .into());
        };

        let mut pass = Pass {
            validator: self,
            mode,
            now,
            errors: ValidationErrors::new(),
        };
        let fields = pass.object(self.schema.fields(), input, "");

        if pass.errors.is_empty() {
            Ok(NormalizedRecord::new(fields, mode))
        } else {
            Err(pass.errors)
        }
    }
}

enum Outcome {
    Value(Value),
    Absent,
    Failed,
}

struct Pass<'a> {
    validator: &'a Validator,
    mode: Mode,
    now: DateTime<Utc>,
    errors: ValidationErrors,
}

impl Pass<'_> {
    fn object(&mut self, specs: &[FieldSpec], input: &Map<String, Value>, prefix: &str) -> Map<String, Value> {
        let mut output = Map::new();

        for spec in specs {
            let path = join(prefix, spec.name);
            if let Outcome::Value(value) = self.field(spec, input.get(spec.name), &path) {
                output.insert(spec.name.to_string(), value);
            }
        }

        for key in input.keys() {
            if specs.iter().any(|spec| spec.name == key) {
                continue;
            }
            let path = join(prefix, key);
            match self.validator.unknown_fields {
                UnknownFieldPolicy::Reject => {
                    self.fail(&path, ValidationErrorKind::Unknown, format!("\"{path}\" is not allowed"));
                }
                UnknownFieldPolicy::Strip => debug!(field = %path, "stripping unknown member field"),
            }
        }

        output
    }

    fn field(&mut self, spec: &FieldSpec, value: Option<&Value>, path: &str) -> Outcome {
        let Some(value) = value else {
            return self.absent(spec, path);
        };

        if value.is_null() && spec.nullable {
            return Outcome::Value(Value::Null);
        }

        self.value(&spec.shape, &spec.constraints, spec.blank, value, path)
    }

    fn absent(&mut self, spec: &FieldSpec, path: &str) -> Outcome {
        if self.mode == Mode::Update {
            return Outcome::Absent;
        }

        if let Some(default) = &spec.default {
            return Outcome::Value(default.clone());
        }

        if let Shape::Object(children) = &spec.shape {
            if spec.materializes() {
                return Outcome::Value(Value::Object(self.object(children, &Map::new(), path)));
            }
        }

        if spec.required {
            self.fail(path, ValidationErrorKind::Required, format!("\"{path}\" is required"));
            return Outcome::Failed;
        }

        Outcome::Absent
    }

    fn value(
        &mut self,
        shape: &Shape,
        constraints: &[Constraint],
        blank: Blank,
        value: &Value,
        path: &str,
    ) -> Outcome {
        match shape {
            Shape::Text => self.text(constraints, blank, value, path),
            Shape::Number => self.number(constraints, value, path),
            Shape::Boolean => self.boolean(value, path),
            Shape::Date => self.date(constraints, value, path),
            Shape::List(item) => self.list(item, constraints, value, path),
            Shape::Object(children) => match value {
                Value::Object(map) => Outcome::Value(Value::Object(self.object(children, map, path))),
                _ => self.not_an_object(path),
            },
            Shape::Map => match value {
                Value::Object(map) => Outcome::Value(Value::Object(map.clone())),
                _ => self.not_an_object(path),
            },
        }
    }

    fn text(&mut self, constraints: &[Constraint], blank: Blank, value: &Value, path: &str) -> Outcome {
        let Value::String(raw) = value else {
            return self.fail(path, ValidationErrorKind::InvalidType, format!("\"{path}\" must be a string"));
        };

        let mut text = raw.clone();
        let mut blank_checked = false;

        for constraint in constraints {
            if !blank_checked && !constraint.is_conversion() {
                blank_checked = true;
                if text.is_empty() {
                    return self.blank(blank, text, path);
                }
            }

            match constraint {
                Constraint::Trim => text = text.trim().to_string(),
                Constraint::Lowercase => text = text.to_lowercase(),
                Constraint::Length { min, max } => {
                    let count = text.chars().count();
                    if let Some(min) = *min {
                        if count < min {
                            return self.fail(
                                path,
                                ValidationErrorKind::Length,
                                format!("\"{path}\" length must be at least {min} characters long"),
                            );
                        }
                    }
                    if let Some(max) = *max {
                        if count > max {
                            return self.fail(
                                path,
                                ValidationErrorKind::Length,
                                format!(
                                    "\"{path}\" length must be less than or equal to {max} characters long"
                                ),
                            );
                        }
                    }
                }
                Constraint::Pattern {
                    regex,
                    describe,
                    message,
                } => {
                    if !regex.is_match(&text) {
                        let message = message
                            .map(str::to_string)
                            .unwrap_or_else(|| format!("\"{path}\" {describe}"));
                        return self.fail(path, ValidationErrorKind::Pattern, message);
                    }
                }
                Constraint::OneOf { vocabulary, message } => {
                    let registry = &self.validator.registry;
                    if !registry.contains(*vocabulary, &text) {
                        let message = message.map(str::to_string).unwrap_or_else(|| {
                            format!(
                                "\"{path}\" must be one of [{}]",
                                registry.values(*vocabulary).join(", ")
                            )
                        });
                        return self.fail(path, ValidationErrorKind::NotAllowed, message);
                    }
                }
                Constraint::Normalize(Normalizer::Name) => text = normalize_name(&text),
                Constraint::Normalize(Normalizer::Phone) => {
                    match normalize_phone(Some(&text), self.validator.region) {
                        Ok(Some(canonical)) => text = canonical,
                        Ok(None) => return self.blank(blank, text, path),
                        Err(error) => {
                            return self.fail(
                                path,
                                error.kind,
                                format!("\"{path}\" must be a valid phone number"),
                            );
                        }
                    }
                }
                // Other shapes' steps; `MemberSchema::check` rejects them.
                _ => {}
            }
        }

        if !blank_checked && text.is_empty() {
            return self.blank(blank, text, path);
        }

        Outcome::Value(Value::String(text))
    }

    fn blank(&mut self, policy: Blank, text: String, path: &str) -> Outcome {
        match policy {
            Blank::Reject => self.fail(
                path,
                ValidationErrorKind::Empty,
                format!("\"{path}\" is not allowed to be empty"),
            ),
            Blank::Keep => Outcome::Value(Value::String(text)),
            // A patch must be able to clear the stored value.
            Blank::Absent if self.mode == Mode::Update => Outcome::Value(Value::Null),
            Blank::Absent => Outcome::Absent,
        }
    }

    fn number(&mut self, constraints: &[Constraint], value: &Value, path: &str) -> Outcome {
        let parsed = match value {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|number| number.is_finite());

        let Some(mut number) = parsed else {
            return self.fail(path, ValidationErrorKind::InvalidType, format!("\"{path}\" must be a number"));
        };

        for constraint in constraints {
            match constraint {
                Constraint::Min(min) => {
                    if number < *min {
                        return self.fail(
                            path,
                            ValidationErrorKind::Range,
                            format!("\"{path}\" must be greater than or equal to {min}"),
                        );
                    }
                }
                Constraint::Max(max) => {
                    if number > *max {
                        return self.fail(
                            path,
                            ValidationErrorKind::Range,
                            format!("\"{path}\" must be less than or equal to {max}"),
                        );
                    }
                }
                Constraint::Round(places) => number = round_to(number, *places),
                // Other shapes' steps; `MemberSchema::check` rejects them.
                _ => {}
            }
        }

        Outcome::Value(number_value(number))
    }

    fn boolean(&mut self, value: &Value, path: &str) -> Outcome {
        let parsed = match value {
            Value::Bool(flag) => Some(*flag),
            Value::String(text) => {
                let text = text.trim();
                if text.eq_ignore_ascii_case("true") {
                    Some(true)
                } else if text.eq_ignore_ascii_case("false") {
                    Some(false)
                } else {
                    None
                }
            }
            _ => None,
        };

        match parsed {
            Some(flag) => Outcome::Value(Value::Bool(flag)),
            None => self.fail(path, ValidationErrorKind::InvalidType, format!("\"{path}\" must be a boolean")),
        }
    }

    fn date(&mut self, constraints: &[Constraint], value: &Value, path: &str) -> Outcome {
        let parsed = match value {
            Value::String(text) => parse_instant(text.trim()),
            Value::Number(number) => number
                .as_i64()
                .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
            _ => None,
        };

        let Some(instant) = parsed else {
            return self.fail(path, ValidationErrorKind::InvalidType, format!("\"{path}\" must be a valid date"));
        };

        for constraint in constraints {
            if let Constraint::Past { message } = constraint {
                if instant >= self.now {
                    let message = message
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("\"{path}\" must be less than \"now\""));
                    return self.fail(path, ValidationErrorKind::NotInPast, message);
                }
            }
        }

        Outcome::Value(Value::String(
            instant.to_rfc3339_opts(SecondsFormat::Millis, true),
        ))
    }

    fn list(&mut self, item: &Shape, constraints: &[Constraint], value: &Value, path: &str) -> Outcome {
        let Value::Array(items) = value else {
            return self.fail(path, ValidationErrorKind::InvalidType, format!("\"{path}\" must be an array"));
        };

        let item_constraints = constraints
            .iter()
            .find_map(|constraint| match constraint {
                Constraint::Items(inner) => Some(inner.as_slice()),
                _ => None,
            })
            .unwrap_or(&[]);

        let mut values = Vec::with_capacity(items.len());
        let mut failed = false;
        for (index, entry) in items.iter().enumerate() {
            let item_path = format!("{path}[{index}]");
            match self.value(item, item_constraints, Blank::Reject, entry, &item_path) {
                Outcome::Value(value) => values.push(value),
                Outcome::Absent => {}
                Outcome::Failed => failed = true,
            }
        }
        if failed {
            return Outcome::Failed;
        }

        for constraint in constraints {
            match constraint {
                Constraint::NonEmpty => {
                    if values.is_empty() {
                        return self.fail(
                            path,
                            ValidationErrorKind::Length,
                            format!("\"{path}\" must contain at least 1 items"),
                        );
                    }
                }
                Constraint::Unique => {
                    if let Some(index) = first_duplicate(&values) {
                        let item_path = format!("{path}[{index}]");
                        return self.fail(
                            &item_path,
                            ValidationErrorKind::Duplicate,
                            format!("\"{item_path}\" contains a duplicate value"),
                        );
                    }
                }
                Constraint::Include(tag) => {
                    if !values.iter().any(|value| value.as_str() == Some(*tag)) {
                        values.push(Value::String((*tag).to_string()));
                    }
                }
                // `Items` ran per entry above.
                _ => {}
            }
        }

        Outcome::Value(Value::Array(values))
    }

    fn not_an_object(&mut self, path: &str) -> Outcome {
        self.fail(
            path,
            ValidationErrorKind::InvalidType,
            format!("\"{path}\" must be of type object"),
        )
    }

    fn fail(&mut self, path: &str, kind: ValidationErrorKind, message: impl Into<String>) -> Outcome {
        self.errors.push(ValidationError::new(path, kind, message));
        Outcome::Failed
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| Utc.from_utc_datetime(&midnight))
}

fn round_to(number: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (number * factor).round() / factor
}

/// Whole amounts stay JSON integers so `0` round-trips as `0`.
fn number_value(number: f64) -> Value {
    if number.fract() == 0.0 && number.abs() < MAX_EXACT_INTEGER {
        return Value::from(number as i64);
    }
    Number::from_f64(number)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn first_duplicate(values: &[Value]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .find(|(index, value)| values[..*index].contains(*value))
        .map(|(index, _)| index)
}
