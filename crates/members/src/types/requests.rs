//! Typed requests handed to a member store.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::entities::{Authentication, MemberId, MemberRecord, Metadata, Money, Settings};
use crate::validation::NormalizedRecord;

/// A member that passed creation-mode validation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMember {
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<DateTime<Utc>>,
    pub status: String,
    pub positions: Vec<String>,
    pub groups: Vec<String>,
    #[serde(default)]
    pub mentor: Option<MemberId>,
    #[serde(default)]
    pub mentees: Vec<MemberId>,
    pub balance: Money,
    pub total_donation: Money,
    pub authentication: Authentication,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub metadata: Metadata,
}

impl NewMember {
    /// Build the stored record; join date, last login and timestamps are all `now`.
    pub fn into_record(self, id: MemberId, now: DateTime<Utc>) -> MemberRecord {
        MemberRecord {
            id,
            first_name: self.first_name,
            middle_name: self.middle_name,
            last_name: self.last_name,
            email: self.email,
            phone_number: self.phone_number,
            date_of_birth: self.date_of_birth,
            status: self.status,
            positions: self.positions,
            groups: self.groups,
            mentor: self.mentor,
            mentees: self.mentees,
            join_date: now,
            last_login: now,
            balance: self.balance,
            total_donation: self.total_donation,
            authentication: Some(self.authentication),
            lock_until: None,
            settings: self.settings,
            metadata: self.metadata,
            created_at: now,
            updated_at: now,
        }
    }
}

impl TryFrom<NormalizedRecord> for NewMember {
    type Error = serde_json::Error;

    fn try_from(record: NormalizedRecord) -> Result<Self, Self::Error> {
        serde_json::from_value(record.into_value())
    }
}

/// The fields of an update-mode validation, to be merged into a stored record.
///
/// Nested objects merge key by key, lists and scalars replace, and `null`
/// clears a nullable field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberPatch {
    fields: Map<String, Value>,
}

impl MemberPatch {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn touches(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// The new e-mail address, when the patch changes it.
    pub fn email(&self) -> Option<&str> {
        self.fields.get("email").and_then(Value::as_str)
    }

    /// Apply the patch in place. The record should carry its authentication
    /// sub-record when the patch touches it.
    pub fn apply_to(&self, record: &mut MemberRecord) -> Result<(), serde_json::Error> {
        let mut current = serde_json::to_value(&*record)?;
        for (key, value) in &self.fields {
            merge(&mut current[key.as_str()], value);
        }
        let lock_until = record.lock_until;
        *record = serde_json::from_value(current)?;
        record.lock_until = lock_until;
        Ok(())
    }
}

impl From<NormalizedRecord> for MemberPatch {
    fn from(record: NormalizedRecord) -> Self {
        Self::new(record.into_map())
    }
}

fn merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, value) in incoming {
                merge(existing.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

/// Optional criteria for listing members; every criterion set must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MemberFilter {
    pub status: Option<String>,
    pub position: Option<String>,
    pub group: Option<String>,
}

impl MemberFilter {
    pub fn matches(&self, member: &MemberRecord) -> bool {
        let status = self
            .status
            .as_deref()
            .map_or(true, |status| member.status.eq_ignore_ascii_case(status));
        let position = self
            .position
            .as_deref()
            .map_or(true, |position| member.positions.iter().any(|p| p == position));
        let group = self
            .group
            .as_deref()
            .map_or(true, |group| member.groups.iter().any(|g| g == group));

        status && position && group
    }
}
