use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identity of a member record: 24 lowercase hex characters.
///
/// The first four bytes are the big-endian creation time in seconds, the
/// remaining eight are random, so identities sort roughly by creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MemberId(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid member id `{0}`")]
pub struct InvalidMemberId(pub String);

impl MemberId {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 12];
        let seconds = Utc::now().timestamp().clamp(0, u32::MAX as i64) as u32;
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        rand::thread_rng().fill(&mut bytes[4..]);

        Self(bytes.iter().map(|byte| format!("{byte:02x}")).collect())
    }

    /// Accepts either case; the stored form is lowercase.
    pub fn parse(raw: &str) -> Result<Self, InvalidMemberId> {
        let trimmed = raw.trim();
        if trimmed.len() == 24 && trimmed.chars().all(|ch| ch.is_ascii_hexdigit()) {
            Ok(Self(trimmed.to_ascii_lowercase()))
        } else {
            Err(InvalidMemberId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MemberId {
    type Err = InvalidMemberId;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

impl TryFrom<String> for MemberId {
    type Error = InvalidMemberId;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<MemberId> for String {
    fn from(id: MemberId) -> Self {
        id.0
    }
}

/// A monetary amount held as whole cents.
///
/// Serialized as a JSON number with at most two decimals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("monetary amount {0} is outside +/-{max}", max = Money::MAX_AMOUNT)]
pub struct AmountOutOfRange(pub f64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Largest whole amount whose cent count stays below 2^53.
    pub const MAX_AMOUNT: f64 = 90_071_992_547_409.0;

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl TryFrom<f64> for Money {
    type Error = AmountOutOfRange;

    /// Rounds half away from zero to the nearest cent.
    fn try_from(amount: f64) -> Result<Self, Self::Error> {
        if !amount.is_finite() || amount.abs() > Self::MAX_AMOUNT {
            return Err(AmountOutOfRange(amount));
        }
        Ok(Self((amount * 100.0).round() as i64))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", magnitude / 100, magnitude % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % 100 == 0 {
            serializer.serialize_i64(self.0 / 100)
        } else {
            serializer.serialize_f64(self.as_f64())
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = f64::deserialize(deserializer)?;
        Money::try_from(amount).map_err(serde::de::Error::custom)
    }
}

/// Sign of a member's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceStatus {
    Credit,
    Debt,
    Clear,
}

impl From<Money> for BalanceStatus {
    fn from(balance: Money) -> Self {
        match balance.cents() {
            cents if cents > 0 => BalanceStatus::Credit,
            cents if cents < 0 => BalanceStatus::Debt,
            _ => BalanceStatus::Clear,
        }
    }
}
