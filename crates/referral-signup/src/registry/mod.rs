//! User registry backed by SQLite.

mod database;
mod store;

pub use database::Database;
pub use store::UserRegistry;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Country prefix every stored phone number carries.
pub const COUNTRY_PREFIX: &str = "+1";

/// Length of generated referral codes.
pub const REFERRAL_CODE_LEN: usize = 9;

/// URL-safe alphabet referral codes are drawn from (64 symbols).
const REFERRAL_CODE_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

/// A signed-up user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Assigned by storage on insert
    pub id: i64,

    /// Normalized phone number, e.g. "+15551234567"
    pub phone_number: String,

    /// Code other users sign up with to credit this user
    pub referral_code: String,

    /// Giveaway entries, starts at 1
    pub entries: i64,

    pub created_at: DateTime<Utc>,
}

/// A referrer credited for a specific new user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReferralEdge {
    pub id: i64,
    pub referrer_code: String,
    pub new_user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Outcome of crediting a referrer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferralCredit {
    /// Phone number of the credited referrer
    pub referrer_phone: String,

    /// Referrer's entries after the increment
    pub entries: i64,

    pub edge: ReferralEdge,
}

/// Normalize a phone number to `+1` followed by digits.
///
/// Input already carrying the `+1` prefix keeps it; everything else is
/// stripped to digits and prefixed. Length is not checked here, see
/// [`validate_national_number`].
pub fn normalize_phone_number(number: &str) -> Result<String, String> {
    let number = number.trim();
    if number.is_empty() {
        return Err("Phone number required".into());
    }

    let national = number.strip_prefix(COUNTRY_PREFIX).unwrap_or(number);
    let digits: String = national.chars().filter(|c| c.is_ascii_digit()).collect();

    Ok(format!("{}{}", COUNTRY_PREFIX, digits))
}

/// Check that a normalized number has exactly ten national digits.
pub fn validate_national_number(normalized: &str) -> Result<(), String> {
    let national = normalized
        .strip_prefix(COUNTRY_PREFIX)
        .ok_or_else(|| "Phone number must start with +1".to_string())?;

    match national.len() {
        10 => Ok(()),
        n if n < 10 => Err("Phone number too short".into()),
        _ => Err("Phone number too long".into()),
    }
}

/// Generate a random URL-safe referral code.
pub fn generate_referral_code() -> String {
    let mut rng = rand::thread_rng();
    (0..REFERRAL_CODE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..REFERRAL_CODE_ALPHABET.len());
            REFERRAL_CODE_ALPHABET[idx] as char
        })
        .collect()
}

/// Build the shareable signup link for a referral code.
pub fn referral_link(base_url: &str, referral_code: &str) -> String {
    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{}{}ref={}", base_url, separator, referral_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_normalize_phone_number() {
        assert_eq!(normalize_phone_number("1234567890"), Ok("+11234567890".into()));
        assert_eq!(normalize_phone_number("+11234567890"), Ok("+11234567890".into()));
        assert_eq!(
            normalize_phone_number("(555) 123-4567"),
            Ok("+15551234567".into())
        );
        assert_eq!(
            normalize_phone_number("+1 555 123 4567"),
            Ok("+15551234567".into())
        );
        assert!(normalize_phone_number("").is_err());
        assert!(normalize_phone_number("   ").is_err());
    }

    #[test]
    fn test_normalize_keeps_unusual_lengths() {
        // Without the +1 prefix a leading 1 is treated as a national digit.
        assert_eq!(normalize_phone_number("15551234567"), Ok("+115551234567".into()));
        assert_eq!(normalize_phone_number("555"), Ok("+1555".into()));
        assert_eq!(normalize_phone_number("abc"), Ok("+1".into()));
    }

    #[test]
    fn test_validate_national_number() {
        assert!(validate_national_number("+15551234567").is_ok());
        assert_eq!(
            validate_national_number("+1555"),
            Err("Phone number too short".into())
        );
        assert_eq!(
            validate_national_number("+115551234567"),
            Err("Phone number too long".into())
        );
        assert!(validate_national_number("5551234567").is_err());
    }

    #[test]
    fn test_generate_referral_code_shape() {
        let code = generate_referral_code();
        assert_eq!(code.len(), REFERRAL_CODE_LEN);
        assert!(code
            .bytes()
            .all(|b| REFERRAL_CODE_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_generate_referral_code_distinct() {
        let codes: HashSet<String> = (0..1000).map(|_| generate_referral_code()).collect();
        assert_eq!(codes.len(), 1000);
    }

    #[test]
    fn test_referral_link() {
        assert_eq!(
            referral_link("https://referral.gamifyHQ.com/signup", "abc123"),
            "https://referral.gamifyHQ.com/signup?ref=abc123"
        );
        assert_eq!(
            referral_link("https://example.com/join?utm=sms", "abc123"),
            "https://example.com/join?utm=sms&ref=abc123"
        );
    }
}
