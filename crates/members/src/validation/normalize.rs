//! Canonical forms for names and phone numbers.

use phonenumber::country;

use super::errors::{ValidationError, ValidationErrorKind};

/// Capitalize each part of a personal name.
///
/// Words are split on whitespace, apostrophes and hyphens; the first
/// character of every part is upper-cased and the rest lower-cased. The
/// separators themselves are kept exactly as given. A leading character
/// with no single-character capital (`ß`, `ŉ`) is left as it is.
///
/// ```
/// use roster_members::normalize_name;
///
/// assert_eq!(normalize_name("mary-jane o'BRIEN"), "Mary-Jane O'Brien");
/// assert_eq!(normalize_name(""), "");
/// ```
pub fn normalize_name(raw: &str) -> String {
    let mut normalized = String::with_capacity(raw.len());
    let mut part_start = true;

    for ch in raw.chars() {
        if ch.is_whitespace() || ch == '-' || ch == '\'' {
            normalized.push(ch);
            part_start = true;
        } else if part_start {
            normalized.push(single_upper(ch).unwrap_or(ch));
            part_start = false;
        } else {
            normalized.extend(ch.to_lowercase());
        }
    }

    normalized
}

fn single_upper(ch: char) -> Option<char> {
    let mut upper = ch.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(single), None) => Some(single),
        _ => None,
    }
}

/// Canonicalize a phone number to E.164.
///
/// Numbers without an international prefix are read against `region`.
/// Empty input means "no phone number" and is not an error.
pub fn normalize_phone(
    raw: Option<&str>,
    region: country::Id,
) -> Result<Option<String>, ValidationError> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };

    let invalid = || {
        ValidationError::new(
            "phoneNumber",
            ValidationErrorKind::InvalidPhoneNumber,
            "\"phoneNumber\" must be a valid phone number",
        )
    };

    let number = phonenumber::parse(Some(region), raw).map_err(|_| invalid())?;
    if !phonenumber::is_valid(&number) {
        return Err(invalid());
    }

    Ok(Some(
        number.format().mode(phonenumber::Mode::E164).to_string(),
    ))
}
