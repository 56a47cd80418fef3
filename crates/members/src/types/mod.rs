//! Shared types for member management.

pub mod errors;
pub mod requests;

pub use errors::{MemberError, MemberResult, StoreError, StoreResult};
pub use requests::{MemberFilter, MemberPatch, NewMember};
