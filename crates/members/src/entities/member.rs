use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::values::{BalanceStatus, MemberId, Money};

/// A member of the organisation as held by a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRecord {
    /// Store-assigned identity
    pub id: MemberId,
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub last_name: String,
    /// Lower-cased, unique across the record set
    pub email: String,
    /// E.164 form
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
    pub join_date: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
    pub balance: Money,
    pub total_donation: Money,
    /// Only present when explicitly requested from the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<Authentication>,
    /// `authentication.lockUntil`, retained when the sub-record is stripped
    #[serde(skip)]
    pub lock_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MemberRecord {
    /// First, optional middle and last name joined by single spaces.
    pub fn full_name(&self) -> String {
        [
            Some(self.first_name.as_str()),
            self.middle_name.as_deref(),
            Some(self.last_name.as_str()),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }

    /// Locked while `lockUntil` lies in the future, whether or not the
    /// authentication sub-record was loaded.
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        let lock_until = match &self.authentication {
            Some(auth) => auth.lock_until,
            None => self.lock_until,
        };
        lock_until.is_some_and(|until| until > now)
    }

    pub fn is_locked(&self) -> bool {
        self.is_locked_at(Utc::now())
    }

    pub fn balance_status(&self) -> BalanceStatus {
        BalanceStatus::from(self.balance)
    }

    pub fn without_authentication(mut self) -> Self {
        if let Some(auth) = self.authentication.take() {
            self.lock_until = auth.lock_until;
        }
        self
    }
}

/// Credential and verification state. Hidden from default reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authentication {
    pub password_hash: String,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub email_verification_code: Option<String>,
    #[serde(default)]
    pub email_verification_expires: Option<DateTime<Utc>>,
    #[serde(default)]
    pub lock_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub email_notifications: EmailNotifications,
}

/// Notification preferences; everything is on unless the member opts out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailNotifications {
    #[serde(default = "enabled")]
    pub is_enabled: bool,
    #[serde(default = "enabled")]
    pub fines: bool,
    #[serde(default = "enabled")]
    pub payments: bool,
}

impl Default for EmailNotifications {
    fn default() -> Self {
        Self {
            is_enabled: true,
            fines: true,
            payments: true,
        }
    }
}

fn enabled() -> bool {
    true
}

/// Free-form profile data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(rename = "studentID", default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub good_deeds: Vec<String>,
    #[serde(default)]
    pub accomplishments: Vec<String>,
    #[serde(default)]
    pub social_media: SocialMedia,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub custom_fields: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialMedia {
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub facebook: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn record() -> MemberRecord {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        MemberRecord {
            id: MemberId::generate(),
            first_name: "Ada".into(),
            middle_name: None,
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            phone_number: None,
            date_of_birth: None,
            status: "pending".into(),
            positions: vec!["Member".into()],
            groups: vec!["Member".into()],
            mentor: None,
            mentees: Vec::new(),
            join_date: now,
            last_login: now,
            balance: Money::ZERO,
            total_donation: Money::ZERO,
            authentication: None,
            lock_until: None,
            settings: Settings::default(),
            metadata: Metadata::default(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn full_name_skips_missing_and_blank_middle_names() {
        let mut member = record();
        assert_eq!(member.full_name(), "Ada Lovelace");
        member.middle_name = Some(String::new());
        assert_eq!(member.full_name(), "Ada Lovelace");
        member.middle_name = Some("King".into());
        assert_eq!(member.full_name(), "Ada King Lovelace");
    }

    #[test]
    fn lock_state_depends_on_lock_until() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut member = record();
        assert!(!member.is_locked_at(now));

        member.authentication = Some(Authentication {
            password_hash: "hash".into(),
            email_verified: false,
            email_verification_code: None,
            email_verification_expires: None,
            lock_until: Some(now + Duration::minutes(5)),
        });
        assert!(member.is_locked_at(now));
        assert!(!member.is_locked_at(now + Duration::minutes(5)));

        let stripped = member.clone().without_authentication();
        assert!(stripped.authentication.is_none());
        assert!(stripped.is_locked_at(now));
        assert!(!stripped.is_locked_at(now + Duration::minutes(5)));
    }

    #[test]
    fn retained_lock_expiry_is_not_serialized() {
        let mut member = record();
        member.lock_until = Some(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap());
        let value = serde_json::to_value(&member).unwrap();
        assert!(value.get("lockUntil").is_none());
        assert!(value.get("authentication").is_none());
    }

    #[test]
    fn authentication_is_omitted_when_not_loaded() {
        let value = serde_json::to_value(record()).unwrap();
        assert!(value.get("authentication").is_none());
        assert_eq!(value["settings"]["emailNotifications"]["fines"], json!(true));
        assert!(value["metadata"].get("studentID").is_some());
    }
}
