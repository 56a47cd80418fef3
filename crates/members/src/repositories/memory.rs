//! In-process member store, used by tests and the `validate` tooling.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use super::MemberStore;
use crate::entities::{MemberId, MemberRecord};
use crate::types::{MemberFilter, MemberPatch, NewMember, StoreError, StoreResult};

/// Member store backed by a vector kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMemberStore {
    members: Arc<RwLock<Vec<MemberRecord>>>,
}

impl InMemoryMemberStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.members.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.members.read().await.is_empty()
    }
}

fn email_taken(members: &[MemberRecord], email: &str, except: Option<&MemberId>) -> bool {
    members
        .iter()
        .any(|member| member.email == email && Some(&member.id) != except)
}

impl MemberStore for InMemoryMemberStore {
    async fn find_by_id(&self, id: &MemberId) -> StoreResult<Option<MemberRecord>> {
        Ok(self
            .find_by_id_with_authentication(id)
            .await?
            .map(MemberRecord::without_authentication))
    }

    async fn find_by_id_with_authentication(&self, id: &MemberId) -> StoreResult<Option<MemberRecord>> {
        let members = self.members.read().await;
        Ok(members.iter().find(|member| &member.id == id).cloned())
    }

    async fn find_all(&self, filter: &MemberFilter) -> StoreResult<Vec<MemberRecord>> {
        let members = self.members.read().await;
        Ok(members
            .iter()
            .filter(|member| filter.matches(member))
            .cloned()
            .map(MemberRecord::without_authentication)
            .collect())
    }

    async fn insert(&self, member: NewMember) -> StoreResult<MemberRecord> {
        let mut members = self.members.write().await;
        if email_taken(&members, &member.email, None) {
            return Err(StoreError::DuplicateKey {
                field: "email".to_string(),
            });
        }

        let record = member.into_record(MemberId::generate(), Utc::now());
        members.push(record.clone());
        Ok(record.without_authentication())
    }

    async fn update(&self, id: &MemberId, patch: MemberPatch) -> StoreResult<MemberRecord> {
        let mut members = self.members.write().await;

        if let Some(email) = patch.email() {
            if email_taken(&members, email, Some(id)) {
                return Err(StoreError::DuplicateKey {
                    field: "email".to_string(),
                });
            }
        }

        let member = members
            .iter_mut()
            .find(|member| &member.id == id)
            .ok_or(StoreError::NotFound)?;

        let mut updated = member.clone();
        patch
            .apply_to(&mut updated)
            .map_err(|error| StoreError::Backend(error.to_string()))?;
        updated.updated_at = Utc::now();
        *member = updated.clone();

        Ok(updated.without_authentication())
    }

    async fn delete(&self, id: &MemberId) -> StoreResult<()> {
        let mut members = self.members.write().await;
        let index = members
            .iter()
            .position(|member| &member.id == id)
            .ok_or(StoreError::NotFound)?;
        members.remove(index);
        Ok(())
    }
}
