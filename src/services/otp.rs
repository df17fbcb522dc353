use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};

use super::error::ServiceError;
use crate::models::{OtpEntry, OtpPurpose};

pub const OTP_CODE_LEN: usize = 6;

/// Outcome of validating a supplied code against an account's entries.
/// `NoLiveEntry` surfaces as "OTP expired", `Mismatch` as "Invalid OTP".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpOutcome {
    Valid,
    Mismatch,
    NoLiveEntry,
}

/// Generates one-time codes and their stored entries
#[derive(Clone)]
pub struct OtpManager {
    ttl_minutes: i64,
    bcrypt_cost: u32,
}

impl OtpManager {
    pub fn new(ttl_minutes: i64, bcrypt_cost: u32) -> Self {
        Self {
            ttl_minutes,
            bcrypt_cost,
        }
    }

    /// Generate a 6-character alphanumeric code. Returns the plaintext (for
    /// the notification email) and the hashed entry to store.
    pub fn generate(&self, purpose: OtpPurpose) -> Result<(String, OtpEntry), ServiceError> {
        let code: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(OTP_CODE_LEN)
            .map(char::from)
            .collect();

        let code_hash = bcrypt::hash(&code, self.bcrypt_cost).map_err(|e| {
            ServiceError::Internal(anyhow::anyhow!("Failed to hash one-time code: {}", e))
        })?;

        Ok((code, OtpEntry::new(code_hash, purpose, self.ttl_minutes)))
    }

    pub fn ttl_minutes(&self) -> i64 {
        self.ttl_minutes
    }
}

/// Validate a supplied code against the first unexpired entry of the given
/// purpose. Expired and foreign-purpose entries are never consulted.
pub fn check_code(
    entries: &[OtpEntry],
    purpose: OtpPurpose,
    supplied: &str,
    now: DateTime<Utc>,
) -> OtpOutcome {
    let live = entries
        .iter()
        .find(|e| e.purpose == purpose && !e.is_expired(now));

    match live {
        None => OtpOutcome::NoLiveEntry,
        Some(entry) => match bcrypt::verify(supplied, &entry.code_hash) {
            Ok(true) => OtpOutcome::Valid,
            _ => OtpOutcome::Mismatch,
        },
    }
}
