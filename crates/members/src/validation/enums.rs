//! Fixed vocabularies for member status, positions and groups.

/// Tag every member carries in both `positions` and `groups`.
pub const MEMBER_TAG: &str = "Member";

const STATUSES: &[&str] = &["active", "inactive", "suspended", "pending", "alumni"];

const POSITIONS: &[&str] = &[
    "President",
    "Vice President",
    "Secretary",
    "Treasurer",
    "Public Relations",
    "Dessalines",
    "Community Service",
    "Brother-to-Brother Coordinator",
    "Historian",
    "White Noise Coordinator",
    "Mission Trip Coordinator",
    MEMBER_TAG,
];

const GROUPS: &[&str] = &["Admin", "PR", "Marketing", "Finance", MEMBER_TAG];

/// Names one of the registry's vocabularies from inside a schema constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vocabulary {
    Statuses,
    Positions,
    Groups,
}

/// The ordered vocabularies consulted by the member schema.
///
/// Built once at start-up and shared by reference; nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumRegistry {
    statuses: Vec<String>,
    positions: Vec<String>,
    groups: Vec<String>,
    default_status: String,
}

impl EnumRegistry {
    /// The organisation's vocabularies.
    pub fn standard() -> Self {
        Self {
            statuses: owned(STATUSES),
            positions: owned(POSITIONS),
            groups: owned(GROUPS),
            default_status: "pending".to_string(),
        }
    }

    pub fn statuses(&self) -> &[String] {
        &self.statuses
    }

    pub fn positions(&self) -> &[String] {
        &self.positions
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn default_status(&self) -> &str {
        &self.default_status
    }

    pub fn values(&self, vocabulary: Vocabulary) -> &[String] {
        match vocabulary {
            Vocabulary::Statuses => &self.statuses,
            Vocabulary::Positions => &self.positions,
            Vocabulary::Groups => &self.groups,
        }
    }

    pub fn contains(&self, vocabulary: Vocabulary, value: &str) -> bool {
        self.values(vocabulary).iter().any(|entry| entry == value)
    }
}

impl Default for EnumRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
