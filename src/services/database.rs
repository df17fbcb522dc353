use chrono::{DateTime, Utc};
use mongodb::{
    bson::{self, doc},
    options::IndexOptions,
    Client as MongoClient, Collection, Database, IndexModel,
};

use crate::error::AppError;
use crate::models::{OtpEntry, OtpPurpose, User};
use crate::utils::password::PasswordHashString;

/// MongoDB access layer. Every state transition is a single conditional
/// update so concurrent requests cannot interleave a read-then-write.
#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(uri = %uri, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB at {}: {}", uri, e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes");

        let users = self.users();

        // Unique index backstops the application-level duplicate check.
        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("email_unique".to_string())
                    .build(),
            )
            .build();

        users.create_index(email_index, None).await.map_err(|e| {
            tracing::error!("Failed to create email index on users collection: {}", e);
            AppError::from(e)
        })?;
        tracing::info!("Created unique index on users.email");

        let otp_expiry_index = IndexModel::builder()
            .keys(doc! { "otp.expires_at": 1 })
            .options(
                IndexOptions::builder()
                    .name("otp_expiry_lookup".to_string())
                    .build(),
            )
            .build();

        users
            .create_index(otp_expiry_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create otp expiry index on users collection: {}", e);
                AppError::from(e)
            })?;
        tracing::info!("Created index on users.otp.expires_at");

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, mongodb::error::Error> {
        self.users().find_one(doc! { "_id": id }, None).await
    }

    /// Lookup by email regardless of provider or state (used for duplicate
    /// checks and confirmation, where the account may not be live yet).
    pub async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<User>, mongodb::error::Error> {
        self.users().find_one(doc! { "email": email }, None).await
    }

    /// Local-credential account that has not been soft-deleted.
    pub async fn find_local_user(
        &self,
        email: &str,
    ) -> Result<Option<User>, mongodb::error::Error> {
        self.users()
            .find_one(
                doc! { "email": email, "provider": "local", "deleted_at": null },
                None,
            )
            .await
    }

    /// Sign-in lookup: local, confirmed, not deleted. Anything narrower than
    /// that collapses into the same invalid-credentials answer upstream.
    pub async fn find_confirmed_local_user(
        &self,
        email: &str,
    ) -> Result<Option<User>, mongodb::error::Error> {
        self.users()
            .find_one(
                doc! {
                    "email": email,
                    "provider": "local",
                    "is_confirmed": true,
                    "deleted_at": null,
                },
                None,
            )
            .await
    }

    pub async fn insert_user(&self, user: &User) -> Result<(), mongodb::error::Error> {
        self.users().insert_one(user, None).await.map(|_| ())
    }

    pub async fn push_otp_entry(
        &self,
        user_id: &str,
        entry: &OtpEntry,
    ) -> Result<bool, mongodb::error::Error> {
        let entry_doc = bson::to_document(entry)?;
        let result = self
            .users()
            .update_one(
                doc! { "_id": user_id },
                doc! {
                    "$push": { "otp": entry_doc },
                    "$set": { "updated_at": bson::DateTime::now() },
                },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    /// Atomically confirm the email: the filter demands an unexpired
    /// confirm-email entry, so of two concurrent confirms exactly one
    /// matches. All confirm-email entries are consumed in the same update.
    pub async fn confirm_email(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, mongodb::error::Error> {
        let now_bson = bson::DateTime::from_chrono(now);
        let result = self
            .users()
            .update_one(
                doc! {
                    "_id": user_id,
                    "is_confirmed": false,
                    "otp": { "$elemMatch": {
                        "purpose": OtpPurpose::ConfirmEmail.as_str(),
                        "expires_at": { "$gt": now_bson },
                    } },
                },
                doc! {
                    "$set": { "is_confirmed": true, "updated_at": now_bson },
                    "$pull": { "otp": { "purpose": OtpPurpose::ConfirmEmail.as_str() } },
                },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    /// Atomically reset the password: requires a live reset entry, swaps the
    /// hash, stamps the credential epoch and consumes all reset entries.
    pub async fn reset_password(
        &self,
        user_id: &str,
        password_hash: &PasswordHashString,
        now: DateTime<Utc>,
    ) -> Result<bool, mongodb::error::Error> {
        let now_bson = bson::DateTime::from_chrono(now);
        let result = self
            .users()
            .update_one(
                doc! {
                    "_id": user_id,
                    "otp": { "$elemMatch": {
                        "purpose": OtpPurpose::ResetPassword.as_str(),
                        "expires_at": { "$gt": now_bson },
                    } },
                },
                doc! {
                    "$set": {
                        "password_hash": password_hash.as_str(),
                        "change_credential_time": now_bson,
                        "updated_at": now_bson,
                    },
                    "$pull": { "otp": { "purpose": OtpPurpose::ResetPassword.as_str() } },
                },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    /// Authenticated password change. Also stamps the credential epoch.
    pub async fn set_password(
        &self,
        user_id: &str,
        password_hash: &PasswordHashString,
        now: DateTime<Utc>,
    ) -> Result<bool, mongodb::error::Error> {
        let now_bson = bson::DateTime::from_chrono(now);
        let result = self
            .users()
            .update_one(
                doc! { "_id": user_id },
                doc! {
                    "$set": {
                        "password_hash": password_hash.as_str(),
                        "change_credential_time": now_bson,
                        "updated_at": now_bson,
                    },
                },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    /// Promote a local account to its federated identity.
    pub async fn promote_provider(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, mongodb::error::Error> {
        let now_bson = bson::DateTime::from_chrono(now);
        let result = self
            .users()
            .update_one(
                doc! { "_id": user_id, "provider": "local" },
                doc! { "$set": { "provider": "federated", "updated_at": now_bson } },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    pub async fn soft_delete_user(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, mongodb::error::Error> {
        let now_bson = bson::DateTime::from_chrono(now);
        let result = self
            .users()
            .update_one(
                doc! { "_id": user_id, "deleted_at": null },
                doc! { "$set": { "deleted_at": now_bson, "updated_at": now_bson } },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    /// Toggle the soft-ban timestamp. Each direction is a conditional update,
    /// so racing toggles never lose a write. Returns `Some(true)` when the
    /// account is now banned, `Some(false)` when unbanned, `None` when the
    /// account does not exist.
    pub async fn toggle_ban(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<bool>, mongodb::error::Error> {
        let now_bson = bson::DateTime::from_chrono(now);
        let banned = self
            .users()
            .update_one(
                doc! { "_id": user_id, "banned_at": null },
                doc! { "$set": { "banned_at": now_bson, "updated_at": now_bson } },
                None,
            )
            .await?;
        if banned.matched_count > 0 {
            return Ok(Some(true));
        }

        let unbanned = self
            .users()
            .update_one(
                doc! { "_id": user_id, "banned_at": { "$ne": null } },
                doc! { "$set": { "banned_at": null, "updated_at": now_bson } },
                None,
            )
            .await?;
        if unbanned.matched_count > 0 {
            Ok(Some(false))
        } else {
            Ok(None)
        }
    }

    /// Consume every entry of a purpose. Idempotent: a second call matches
    /// the account but modifies nothing.
    pub async fn pull_otp_entries(
        &self,
        user_id: &str,
        purpose: OtpPurpose,
    ) -> Result<u64, mongodb::error::Error> {
        let result = self
            .users()
            .update_one(
                doc! { "_id": user_id },
                doc! { "$pull": { "otp": { "purpose": purpose.as_str() } } },
                None,
            )
            .await?;
        Ok(result.modified_count)
    }

    /// Bulk-purge expired one-time codes across all accounts. Returns the
    /// number of accounts touched.
    pub async fn purge_expired_otps(
        &self,
        now: DateTime<Utc>,
    ) -> Result<u64, mongodb::error::Error> {
        let now_bson = bson::DateTime::from_chrono(now);
        let result = self
            .users()
            .update_many(
                doc! { "otp.expires_at": { "$lt": now_bson } },
                doc! { "$pull": { "otp": { "expires_at": { "$lt": now_bson } } } },
                None,
            )
            .await?;
        Ok(result.modified_count)
    }
}
