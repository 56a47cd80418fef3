//! Declarative description of a member record.
//!
//! Every field is described once by a [`FieldSpec`]. The validation engine
//! interprets the table; [`Mode`] only decides whether `required` flags and
//! defaults take part.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use super::enums::{EnumRegistry, Vocabulary, MEMBER_TAG};
use crate::entities::Money;

pub(crate) static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}\p{M} '-]+$").expect("name pattern compiles"));

pub(crate) static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern compiles")
});

pub(crate) static MEMBER_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-f]{24}$").expect("member id pattern compiles"));

pub(crate) static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").expect("url pattern compiles"));

const MAX_EMAIL_LENGTH: usize = 254;

/// Validation profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Strict: required fields enforced and defaults injected.
    Create,
    /// Partial: every field optional, nothing injected.
    Update,
}

/// Structural type of a field's value.
#[derive(Debug, Clone)]
pub enum Shape {
    Text,
    Number,
    Boolean,
    /// An instant, canonicalized to RFC 3339 UTC.
    Date,
    List(Box<Shape>),
    Object(Vec<FieldSpec>),
    /// Free-form JSON object; keys are not checked.
    Map,
}

/// What an empty (or, after trimming, whitespace-only) string means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blank {
    Reject,
    Keep,
    Absent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalizer {
    Name,
    Phone,
}

/// One step in a field's pipeline. Steps run in the order declared.
#[derive(Debug, Clone)]
pub enum Constraint {
    Trim,
    Lowercase,
    Length {
        min: Option<usize>,
        max: Option<usize>,
    },
    Pattern {
        regex: &'static Lazy<Regex>,
        /// Appended to the quoted path in the default message.
        describe: &'static str,
        message: Option<&'static str>,
    },
    OneOf {
        vocabulary: Vocabulary,
        message: Option<&'static str>,
    },
    Min(f64),
    Max(f64),
    Past {
        message: Option<&'static str>,
    },
    /// Applied to every list item.
    Items(Vec<Constraint>),
    NonEmpty,
    Unique,
    /// Appends the tag when a list lacks it.
    Include(&'static str),
    /// Rounds to the given number of decimal places.
    Round(u32),
    Normalize(Normalizer),
}

impl Constraint {
    /// Conversions reshape a string before the blank policy is consulted.
    pub(crate) fn is_conversion(&self) -> bool {
        matches!(self, Constraint::Trim | Constraint::Lowercase)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Constraint::Trim => "trim",
            Constraint::Lowercase => "lowercase",
            Constraint::Length { .. } => "length",
            Constraint::Pattern { .. } => "pattern",
            Constraint::OneOf { .. } => "oneOf",
            Constraint::Min(_) => "min",
            Constraint::Max(_) => "max",
            Constraint::Past { .. } => "past",
            Constraint::Items(_) => "items",
            Constraint::NonEmpty => "nonEmpty",
            Constraint::Unique => "unique",
            Constraint::Include(_) => "include",
            Constraint::Round(_) => "round",
            Constraint::Normalize(_) => "normalize",
        }
    }

    /// Whether the engine evaluates this step for values of `shape`.
    pub fn applies_to(&self, shape: &Shape) -> bool {
        match shape {
            Shape::Text => matches!(
                self,
                Constraint::Trim
                    | Constraint::Lowercase
                    | Constraint::Length { .. }
                    | Constraint::Pattern { .. }
                    | Constraint::OneOf { .. }
                    | Constraint::Normalize(_)
            ),
            Shape::Number => matches!(
                self,
                Constraint::Min(_) | Constraint::Max(_) | Constraint::Round(_)
            ),
            Shape::Date => matches!(self, Constraint::Past { .. }),
            Shape::List(item) => match self {
                Constraint::Items(steps) => steps.iter().all(|step| step.applies_to(item)),
                Constraint::NonEmpty | Constraint::Unique => true,
                Constraint::Include(_) => matches!(**item, Shape::Text),
                _ => false,
            },
            Shape::Boolean | Shape::Object(_) | Shape::Map => false,
        }
    }
}

/// A constraint attached to a field whose shape never evaluates it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("constraint `{constraint}` does not apply to field \"{path}\"")]
pub struct SchemaError {
    pub path: String,
    pub constraint: &'static str,
}

/// A single field of the record schema.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub shape: Shape,
    pub required: bool,
    pub nullable: bool,
    pub blank: Blank,
    pub default: Option<Value>,
    pub constraints: Vec<Constraint>,
}

impl FieldSpec {
    pub fn new(name: &'static str, shape: Shape) -> Self {
        Self {
            name,
            shape,
            required: false,
            nullable: false,
            blank: Blank::Reject,
            default: None,
            constraints: Vec::new(),
        }
    }

    pub fn text(name: &'static str) -> Self {
        Self::new(name, Shape::Text)
    }

    pub fn object(name: &'static str, fields: Vec<FieldSpec>) -> Self {
        Self::new(name, Shape::Object(fields))
    }

    pub fn text_list(name: &'static str) -> Self {
        Self::new(name, Shape::List(Box::new(Shape::Text)))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn blank(mut self, policy: Blank) -> Self {
        self.blank = policy;
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Whether creation mode should build this object even when the input omits it.
    pub(crate) fn materializes(&self) -> bool {
        match &self.shape {
            Shape::Object(children) => children
                .iter()
                .any(|child| child.required || child.default.is_some() || child.materializes()),
            _ => false,
        }
    }
}

/// The member record's field table.
#[derive(Debug, Clone)]
pub struct MemberSchema {
    fields: Vec<FieldSpec>,
}

impl MemberSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        let schema = Self { fields };
        debug_assert_eq!(schema.check(), Ok(()), "malformed member schema");
        schema
    }

    /// Verifies that every constraint is one its field's shape evaluates.
    pub fn check(&self) -> Result<(), SchemaError> {
        check_fields(&self.fields, "")
    }

    /// The organisation's member schema, resolved against `registry`.
    pub fn standard(registry: &EnumRegistry) -> Self {
        Self::new(vec![
            name_field("firstName", "First name").required(),
            name_field("middleName", "Middle name")
                .nullable()
                .blank(Blank::Keep),
            name_field("lastName", "Last name").required(),
            FieldSpec::text("email")
                .required()
                .constraint(Constraint::Trim)
                .constraint(Constraint::Lowercase)
                .constraint(Constraint::Length {
                    min: None,
                    max: Some(MAX_EMAIL_LENGTH),
                })
                .constraint(Constraint::Pattern {
                    regex: &EMAIL_PATTERN,
                    describe: "must be a valid email",
                    message: None,
                }),
            FieldSpec::text("phoneNumber")
                .nullable()
                .blank(Blank::Absent)
                .constraint(Constraint::Trim)
                .constraint(Constraint::Normalize(Normalizer::Phone)),
            FieldSpec::new("dateOfBirth", Shape::Date).constraint(Constraint::Past {
                message: Some("Date of birth must be in the past."),
            }),
            FieldSpec::text("status")
                .default_value(json!(registry.default_status()))
                .constraint(Constraint::Trim)
                .constraint(Constraint::Lowercase)
                .constraint(Constraint::OneOf {
                    vocabulary: Vocabulary::Statuses,
                    message: None,
                }),
            tag_list("positions", Vocabulary::Positions, Some("Invalid position provided.")),
            tag_list("groups", Vocabulary::Groups, None),
            member_id_field("mentor").nullable(),
            FieldSpec::new("mentees", Shape::List(Box::new(Shape::Text)))
                .default_value(json!([]))
                .constraint(Constraint::Items(member_id_constraints())),
            FieldSpec::new("balance", Shape::Number)
                .default_value(json!(0))
                .constraint(Constraint::Min(-Money::MAX_AMOUNT))
                .constraint(Constraint::Max(Money::MAX_AMOUNT))
                .constraint(Constraint::Round(2)),
            FieldSpec::new("totalDonation", Shape::Number)
                .default_value(json!(0))
                .constraint(Constraint::Min(0.0))
                .constraint(Constraint::Max(Money::MAX_AMOUNT))
                .constraint(Constraint::Round(2)),
            FieldSpec::object(
                "authentication",
                vec![
                    FieldSpec::text("passwordHash").required(),
                    FieldSpec::new("emailVerified", Shape::Boolean).default_value(json!(false)),
                    FieldSpec::text("emailVerificationCode").nullable(),
                    FieldSpec::new("emailVerificationExpires", Shape::Date).nullable(),
                    FieldSpec::new("lockUntil", Shape::Date).nullable(),
                ],
            ),
            FieldSpec::object(
                "settings",
                vec![FieldSpec::object(
                    "emailNotifications",
                    vec![
                        FieldSpec::new("isEnabled", Shape::Boolean).default_value(json!(true)),
                        FieldSpec::new("fines", Shape::Boolean).default_value(json!(true)),
                        FieldSpec::new("payments", Shape::Boolean).default_value(json!(true)),
                    ],
                )],
            ),
            FieldSpec::object(
                "metadata",
                vec![
                    FieldSpec::text("studentID")
                        .nullable()
                        .blank(Blank::Keep)
                        .constraint(Constraint::Trim),
                    FieldSpec::text("notes").nullable().blank(Blank::Keep),
                    FieldSpec::text_list("goodDeeds").default_value(json!([])),
                    FieldSpec::text_list("accomplishments").default_value(json!([])),
                    FieldSpec::object(
                        "socialMedia",
                        ["instagram", "twitter", "linkedin", "facebook"]
                            .into_iter()
                            .map(social_link)
                            .collect(),
                    ),
                    FieldSpec::text_list("interests").default_value(json!([])),
                    FieldSpec::text_list("skills").default_value(json!([])),
                    FieldSpec::new("customFields", Shape::Map),
                ],
            ),
        ])
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }
}

fn check_fields(fields: &[FieldSpec], prefix: &str) -> Result<(), SchemaError> {
    for field in fields {
        let path = if prefix.is_empty() {
            field.name.to_string()
        } else {
            format!("{prefix}.{}", field.name)
        };
        if let Some(stray) = field
            .constraints
            .iter()
            .find(|constraint| !constraint.applies_to(&field.shape))
        {
            return Err(SchemaError {
                path,
                constraint: stray.label(),
            });
        }
        if let Shape::Object(children) = &field.shape {
            check_fields(children, &path)?;
        }
    }
    Ok(())
}

fn name_field(name: &'static str, label: &'static str) -> FieldSpec {
    let message: &'static str = match label {
        "First name" => "First name may only contain letters, spaces, hyphens, and apostrophes.",
        "Last name" => "Last name may only contain letters, spaces, hyphens, and apostrophes.",
        _ => "Middle name may only contain letters, spaces, hyphens, and apostrophes.",
    };

    FieldSpec::text(name)
        .constraint(Constraint::Trim)
        .constraint(Constraint::Length {
            min: Some(2),
            max: Some(50),
        })
        .constraint(Constraint::Pattern {
            regex: &NAME_PATTERN,
            describe: "contains invalid characters",
            message: Some(message),
        })
        .constraint(Constraint::Normalize(Normalizer::Name))
        // Case mapping can lengthen a name.
        .constraint(Constraint::Length {
            min: Some(2),
            max: Some(50),
        })
}

fn tag_list(name: &'static str, vocabulary: Vocabulary, message: Option<&'static str>) -> FieldSpec {
    FieldSpec::text_list(name)
        .default_value(json!([MEMBER_TAG]))
        .constraint(Constraint::Items(vec![Constraint::OneOf {
            vocabulary,
            message,
        }]))
        .constraint(Constraint::NonEmpty)
        .constraint(Constraint::Unique)
        .constraint(Constraint::Include(MEMBER_TAG))
}

fn member_id_constraints() -> Vec<Constraint> {
    vec![
        Constraint::Trim,
        Constraint::Lowercase,
        Constraint::Pattern {
            regex: &MEMBER_ID_PATTERN,
            describe: "must be a valid member id",
            message: None,
        },
    ]
}

fn member_id_field(name: &'static str) -> FieldSpec {
    member_id_constraints()
        .into_iter()
        .fold(FieldSpec::text(name), FieldSpec::constraint)
}

fn social_link(name: &'static str) -> FieldSpec {
    FieldSpec::text(name)
        .nullable()
        .blank(Blank::Keep)
        .constraint(Constraint::Trim)
        .constraint(Constraint::Pattern {
            regex: &URL_PATTERN,
            describe: "must be a valid uri",
            message: None,
        })
}
