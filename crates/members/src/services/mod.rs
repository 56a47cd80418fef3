//! Service layer for member management.

pub mod member_service;

pub use member_service::MemberService;
