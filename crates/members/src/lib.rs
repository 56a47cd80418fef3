//! # Roster Members Crate
//!
//! Member records and the validation engine that guards them. Every record
//! that reaches a store has passed through [`Validator`], which checks the raw
//! JSON input against the declarative [`MemberSchema`], normalizes names,
//! phone numbers and amounts, and injects creation defaults.
//!
//! ## Architecture
//!
//! - **Validation**: enum registry, field normalizers, schema table, engine
//! - **Entities**: `MemberRecord` and its nested sub-records
//! - **Types**: store-facing requests (`NewMember`, `MemberPatch`) and errors
//! - **Repositories**: the `MemberStore` contract and an in-memory store
//! - **Services**: `MemberService`, which ties validation to a store
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use roster_members::{EnumRegistry, Mode, Validator};
//! use serde_json::json;
//!
//! let validator = Validator::standard(Arc::new(EnumRegistry::standard()));
//! let record = validator
//!     .validate(
//!         &json!({
//!             "firstName": "ada",
//!             "lastName": "lovelace",
//!             "email": "Ada@Example.com",
//!             "authentication": { "passwordHash": "$argon2id$..." }
//!         }),
//!         Mode::Create,
//!     )
//!     .expect("valid member");
//!
//! assert_eq!(record.get("firstName"), Some(&json!("Ada")));
//! assert_eq!(record.get("status"), Some(&json!("pending")));
//! ```

pub mod entities;
pub mod repositories;
pub mod services;
pub mod types;
pub mod validation;

pub use entities::{
    AmountOutOfRange, Authentication, BalanceStatus, EmailNotifications, InvalidMemberId,
    MemberId, MemberRecord, Metadata, Money, Settings, SocialMedia,
};
pub use repositories::{InMemoryMemberStore, MemberStore};
pub use services::MemberService;
pub use types::{
    MemberError, MemberFilter, MemberPatch, MemberResult, NewMember, StoreError, StoreResult,
};
pub use validation::{
    normalize_name, normalize_phone, EnumRegistry, FieldSpec, MemberSchema, Mode,
    NormalizedRecord, ValidationError, ValidationErrorKind, ValidationErrors, Validator,
};
