//! Domain entities for member management.
//!
//! These are plain data types already in canonical form; validation and
//! normalization happen before a value of these types is built.

pub mod member;
pub mod values;

pub use member::{Authentication, EmailNotifications, MemberRecord, Metadata, Settings, SocialMedia};
pub use values::{AmountOutOfRange, BalanceStatus, InvalidMemberId, MemberId, Money};
