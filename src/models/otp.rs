use chrono::{DateTime, Duration, Utc};
use mongodb::bson;
use serde::{Deserialize, Serialize};

/// Purpose a one-time code was issued for. A code only validates against
/// entries of its own purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    ConfirmEmail,
    ResetPassword,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::ConfirmEmail => "confirm_email",
            OtpPurpose::ResetPassword => "reset_password",
        }
    }
}

/// One-time code entry embedded in the account document. Only the bcrypt
/// hash of the code is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpEntry {
    pub code_hash: String,
    pub purpose: OtpPurpose,
    pub expires_at: bson::DateTime,
}

impl OtpEntry {
    pub fn new(code_hash: String, purpose: OtpPurpose, ttl_minutes: i64) -> Self {
        let expires_at = Utc::now() + Duration::minutes(ttl_minutes);
        Self {
            code_hash,
            purpose,
            expires_at: bson::DateTime::from_chrono(expires_at),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.to_chrono() <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_not_expired_within_ttl() {
        let entry = OtpEntry::new("hash".to_string(), OtpPurpose::ConfirmEmail, 10);
        assert!(!entry.is_expired(Utc::now()));
    }

    #[test]
    fn test_entry_expired_after_ttl() {
        let entry = OtpEntry::new("hash".to_string(), OtpPurpose::ConfirmEmail, 10);
        assert!(entry.is_expired(Utc::now() + Duration::minutes(11)));
    }

    #[test]
    fn test_purpose_round_trips_through_serde() {
        let json = serde_json::to_string(&OtpPurpose::ResetPassword).expect("serialize");
        assert_eq!(json, "\"reset_password\"");
        let back: OtpPurpose = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, OtpPurpose::ResetPassword);
        assert_eq!(back.as_str(), "reset_password");
    }
}
