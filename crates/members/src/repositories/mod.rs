//! Storage contract for member records.

use std::future::Future;

use crate::entities::{MemberId, MemberRecord};
use crate::types::{MemberFilter, MemberPatch, NewMember, StoreResult};

pub mod memory;

pub use memory::InMemoryMemberStore;

/// Where validated member data is persisted.
///
/// Implementations enforce e-mail uniqueness; the validator cannot.
pub trait MemberStore: Send + Sync {
    /// Fetch a member without the authentication sub-record.
    fn find_by_id(
        &self,
        id: &MemberId,
    ) -> impl Future<Output = StoreResult<Option<MemberRecord>>> + Send;

    /// Fetch a member including the authentication sub-record.
    fn find_by_id_with_authentication(
        &self,
        id: &MemberId,
    ) -> impl Future<Output = StoreResult<Option<MemberRecord>>> + Send;

    /// Every matching member in creation order, authentication stripped.
    fn find_all(
        &self,
        filter: &MemberFilter,
    ) -> impl Future<Output = StoreResult<Vec<MemberRecord>>> + Send;

    /// Persist a new member; fails with `DuplicateKey` on an e-mail collision.
    fn insert(&self, member: NewMember) -> impl Future<Output = StoreResult<MemberRecord>> + Send;

    /// Merge `patch` into an existing member; fails with `NotFound` if absent.
    fn update(
        &self,
        id: &MemberId,
        patch: MemberPatch,
    ) -> impl Future<Output = StoreResult<MemberRecord>> + Send;

    fn delete(&self, id: &MemberId) -> impl Future<Output = StoreResult<()>> + Send;
}
