use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use mongodb::bson;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::otp::OtpEntry;

/// Closed set of roles. Wire representation matches the stored strings, so
/// an unknown role fails deserialization instead of silently passing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Role {
    User,
    Admin,
    #[serde(rename = "CompanyHR")]
    CompanyHr,
    CompanyOwner,
}

/// How the account authenticates: locally held credentials, or a federated
/// identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Local,
    Federated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub provider: Provider,
    pub role: Role,
    pub gender: Gender,
    pub date_of_birth: bson::DateTime,
    /// Field-encrypted at rest; decrypted only for display.
    pub mobile_number: Option<String>,
    pub company_id: Option<String>,
    pub is_confirmed: bool,
    pub banned_at: Option<bson::DateTime>,
    pub deleted_at: Option<bson::DateTime>,
    /// Credential epoch: tokens issued before this moment are rejected.
    pub change_credential_time: Option<bson::DateTime>,
    #[serde(default)]
    pub otp: Vec<OtpEntry>,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

impl User {
    #[allow(clippy::too_many_arguments)]
    pub fn new_local(
        first_name: String,
        last_name: String,
        email: String,
        password_hash: String,
        gender: Gender,
        date_of_birth: NaiveDate,
        mobile_number: Option<String>,
        otp: Vec<OtpEntry>,
    ) -> Self {
        let now = bson::DateTime::now();
        Self {
            id: Uuid::new_v4().to_string(),
            first_name,
            last_name,
            email,
            password_hash,
            provider: Provider::Local,
            role: Role::User,
            gender,
            date_of_birth: date_to_bson(date_of_birth),
            mobile_number,
            company_id: None,
            is_confirmed: false,
            banned_at: None,
            deleted_at: None,
            change_credential_time: None,
            otp,
            created_at: now,
            updated_at: now,
        }
    }

    /// Federated accounts arrive with a provider-verified email, so they are
    /// created confirmed.
    pub fn new_federated(
        first_name: String,
        last_name: String,
        email: String,
        password_hash: String,
        gender: Gender,
        date_of_birth: NaiveDate,
    ) -> Self {
        let now = bson::DateTime::now();
        Self {
            id: Uuid::new_v4().to_string(),
            first_name,
            last_name,
            email,
            password_hash,
            provider: Provider::Federated,
            role: Role::User,
            gender,
            date_of_birth: date_to_bson(date_of_birth),
            mobile_number: None,
            company_id: None,
            is_confirmed: true,
            banned_at: None,
            deleted_at: None,
            change_credential_time: None,
            otp: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn username(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Confirmed, not banned, not deleted.
    pub fn is_active(&self) -> bool {
        self.is_confirmed && self.banned_at.is_none() && self.deleted_at.is_none()
    }

    /// True when the credential epoch post-dates a token's issue time (both
    /// compared at second precision, strictly greater).
    pub fn credentials_changed_since(&self, iat: i64) -> bool {
        match self.change_credential_time {
            Some(changed_at) => changed_at.timestamp_millis() / 1000 > iat,
            None => false,
        }
    }
}

fn date_to_bson(date: NaiveDate) -> bson::DateTime {
    bson::DateTime::from_chrono(date.and_time(NaiveTime::MIN).and_utc())
}

/// Account view safe to return to clients. No password hash, no OTP entries.
#[derive(Debug, Serialize, ToSchema)]
pub struct SanitizedUser {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub provider: Provider,
    pub gender: Gender,
    pub is_confirmed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
    pub created_at: DateTime<Utc>,
}
