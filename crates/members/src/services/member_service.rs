//! Member service tying validation to a store.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::entities::{MemberId, MemberRecord};
use crate::repositories::{InMemoryMemberStore, MemberStore};
use crate::types::{MemberError, MemberFilter, MemberPatch, MemberResult, NewMember};
use crate::validation::{EnumRegistry, Mode, Validator};

/// Service for managing member records
pub struct MemberService<S> {
    store: S,
    validator: Arc<Validator>,
}

impl MemberService<InMemoryMemberStore> {
    /// Create a service over an empty in-memory store with the standard validator
    pub fn new_for_testing() -> Self {
        Self::new(
            InMemoryMemberStore::new(),
            Arc::new(Validator::standard(Arc::new(EnumRegistry::standard()))),
        )
    }
}

impl<S> MemberService<S>
where
    S: MemberStore,
{
    pub fn new(store: S, validator: Arc<Validator>) -> Self {
        Self { store, validator }
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// List members matching `filter`
    pub async fn list_members(&self, filter: &MemberFilter) -> MemberResult<Vec<MemberRecord>> {
        Ok(self.store.find_all(filter).await?)
    }

    /// Get a member by identity
    pub async fn get_member(&self, id: &str) -> MemberResult<MemberRecord> {
        let id = MemberId::parse(id)?;
        self.store
            .find_by_id(&id)
            .await?
            .ok_or(MemberError::NotFound)
    }

    /// Validate `raw` in creation mode and persist it
    pub async fn create_member(&self, raw: &Value) -> MemberResult<MemberRecord> {
        let normalized = self.validator.validate(raw, Mode::Create).map_err(|errors| {
            warn!(errors = errors.len(), "rejected member creation");
            MemberError::Validation(errors)
        })?;
        let member = NewMember::try_from(normalized)?;

        let created = self.store.insert(member).await?;
        info!(member_id = %created.id, "created member");

        Ok(created)
    }

    /// Validate `raw` in update mode and merge it into the stored member
    pub async fn update_member(&self, id: &str, raw: &Value) -> MemberResult<MemberRecord> {
        let id = MemberId::parse(id)?;
        let normalized = self.validator.validate(raw, Mode::Update).map_err(|errors| {
            warn!(member_id = %id, errors = errors.len(), "rejected member update");
            MemberError::Validation(errors)
        })?;

        let updated = self
            .store
            .update(&id, MemberPatch::from(normalized))
            .await?;
        info!(member_id = %id, "updated member");

        Ok(updated)
    }

    /// Delete a member by identity
    pub async fn delete_member(&self, id: &str) -> MemberResult<()> {
        let id = MemberId::parse(id)?;
        self.store.delete(&id).await?;
        info!(member_id = %id, "deleted member");
        Ok(())
    }
}
