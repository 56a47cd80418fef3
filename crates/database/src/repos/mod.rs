//! Repository implementations backed by SQLite

pub mod member_repository;

pub use member_repository::SqliteMemberStore;
