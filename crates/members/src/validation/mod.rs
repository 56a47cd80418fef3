//! Validation and normalization of raw member input.

pub mod engine;
pub mod enums;
pub mod errors;
pub mod normalize;
pub mod schema;

pub use engine::{UnknownRegion, Validator};
pub use enums::{EnumRegistry, Vocabulary, MEMBER_TAG};
pub use errors::{NormalizedRecord, ValidationError, ValidationErrorKind, ValidationErrors};
pub use normalize::{normalize_name, normalize_phone};
pub use schema::{Blank, Constraint, FieldSpec, MemberSchema, Mode, Normalizer, SchemaError, Shape};
