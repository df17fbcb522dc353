use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rand::{distributions::Alphanumeric, Rng};

use super::database::MongoDb;
use super::email::EmailNotification;
use super::error::ServiceError;
use super::google::IdentityProvider;
use super::notifier::Notifier;
use super::otp::{check_code, OtpManager, OtpOutcome};
use super::tokens::{TokenKind, TokenPair, TokenService, TrustDomain};
use crate::dtos::auth::{GoogleAuthRequest, SignupRequest};
use crate::models::{OtpPurpose, Provider, SanitizedUser, User};
use crate::utils::crypto::FieldCipher;
use crate::utils::password::{hash_password, verify_password, Password, PasswordHashString};

const MINIMUM_AGE_YEARS: i64 = 18;
const FEDERATED_PASSWORD_LEN: usize = 16;

/// Account lifecycle operations: registration, confirmation, sign-in,
/// credential recovery and soft-state transitions.
#[derive(Clone)]
pub struct AccountService {
    db: MongoDb,
    tokens: TokenService,
    otp: OtpManager,
    notifier: Notifier,
    cipher: FieldCipher,
    identity: Arc<dyn IdentityProvider>,
    bcrypt_cost: u32,
}

impl AccountService {
    pub fn new(
        db: MongoDb,
        tokens: TokenService,
        otp: OtpManager,
        notifier: Notifier,
        cipher: FieldCipher,
        identity: Arc<dyn IdentityProvider>,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            db,
            tokens,
            otp,
            notifier,
            cipher,
            identity,
            bcrypt_cost,
        }
    }

    /// Register a local account and queue the confirmation email.
    pub async fn signup(&self, req: SignupRequest) -> Result<(), ServiceError> {
        let email = normalize_email(&req.email);
        validate_date_of_birth(req.date_of_birth)?;

        if self.db.find_user_by_email(&email).await?.is_some() {
            return Err(ServiceError::EmailExists);
        }

        let password_hash = hash_password(&Password::new(req.password), self.bcrypt_cost)?;
        let mobile_number = match req.mobile_number {
            Some(mobile) => Some(self.cipher.encrypt(&mobile)?),
            None => None,
        };

        let (code, entry) = self.otp.generate(OtpPurpose::ConfirmEmail)?;
        let user = User::new_local(
            req.first_name,
            req.last_name,
            email,
            password_hash.into_string(),
            req.gender,
            req.date_of_birth,
            mobile_number,
            vec![entry],
        );

        if let Err(e) = self.db.insert_user(&user).await {
            // The unique email index backstops the lookup above.
            if is_duplicate_key_error(&e) {
                return Err(ServiceError::EmailExists);
            }
            return Err(e.into());
        }

        self.notifier.enqueue(EmailNotification::email_confirmation(
            &user.email,
            &user.username(),
            &code,
            self.otp.ttl_minutes(),
        ));

        tracing::info!(user_id = %user.id, "New account registered");
        Ok(())
    }

    /// Confirm the account email with a one-time code. The state transition
    /// is a single conditional update, so a concurrent confirm with the same
    /// code succeeds exactly once.
    pub async fn confirm_email(&self, email: &str, code: &str) -> Result<(), ServiceError> {
        let email = normalize_email(email);
        let user = self
            .db
            .find_user_by_email(&email)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        let now = Utc::now();
        match check_code(&user.otp, OtpPurpose::ConfirmEmail, code, now) {
            OtpOutcome::NoLiveEntry => Err(ServiceError::OtpExpired),
            OtpOutcome::Mismatch => Err(ServiceError::InvalidOtp),
            OtpOutcome::Valid => {
                if !self.db.confirm_email(&user.id, now).await? {
                    // Lost the race against another confirm.
                    return Err(ServiceError::OtpExpired);
                }
                tracing::info!(user_id = %user.id, "Email confirmed");
                Ok(())
            }
        }
    }

    /// Local sign-in. Unknown email, unconfirmed account, federated-only
    /// account and wrong password all collapse into one answer.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<TokenPair, ServiceError> {
        let email = normalize_email(email);
        let user = self
            .db
            .find_confirmed_local_user(&email)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        verify_password(
            &Password::new(password.to_string()),
            &PasswordHashString::new(user.password_hash.clone()),
        )
        .map_err(|_| ServiceError::InvalidCredentials)?;

        let pair = self.tokens.issue_pair(&user.id, TrustDomain::User)?;
        tracing::info!(user_id = %user.id, "User signed in");
        Ok(pair)
    }

    /// Federated sign-in. An existing local account is promoted to the
    /// federated provider; a new account is created already confirmed.
    /// Returns the pair and whether an account was created.
    pub async fn sign_in_federated(
        &self,
        req: GoogleAuthRequest,
    ) -> Result<(TokenPair, bool), ServiceError> {
        let identity = self.identity.verify(&req.id_token).await?;
        let now = Utc::now();

        if let Some(user) = self.db.find_user_by_email(&identity.email).await? {
            if user.deleted_at.is_some() {
                return Err(ServiceError::AccountInactive);
            }
            if user.provider == Provider::Local {
                self.db.promote_provider(&user.id, now).await?;
                tracing::info!(user_id = %user.id, "Account promoted to federated provider");
            }
            let pair = self.tokens.issue_pair(&user.id, TrustDomain::User)?;
            tracing::info!(user_id = %user.id, "User signed in via federated identity");
            return Ok((pair, false));
        }

        let (gender, date_of_birth) = match (req.gender, req.date_of_birth) {
            (Some(gender), Some(dob)) => (gender, dob),
            _ => {
                return Err(ServiceError::Validation(
                    "Gender and date of birth are required for new accounts".to_string(),
                ))
            }
        };
        validate_date_of_birth(date_of_birth)?;

        // The account never signs in with this password; it only exists so
        // the credential slot is not empty.
        let password_hash =
            hash_password(&Password::new(random_token(FEDERATED_PASSWORD_LEN)), self.bcrypt_cost)?;

        let user = User::new_federated(
            identity.given_name.unwrap_or_else(|| "User".to_string()),
            identity.family_name.unwrap_or_default(),
            identity.email,
            password_hash.into_string(),
            gender,
            date_of_birth,
        );

        if let Err(e) = self.db.insert_user(&user).await {
            if is_duplicate_key_error(&e) {
                return Err(ServiceError::EmailExists);
            }
            return Err(e.into());
        }

        let pair = self.tokens.issue_pair(&user.id, TrustDomain::User)?;
        tracing::info!(user_id = %user.id, "Federated account created");
        Ok((pair, true))
    }

    /// Request a password-reset code for a local account.
    pub async fn forgot_password(&self, email: &str) -> Result<(), ServiceError> {
        let email = normalize_email(email);
        // Absent accounts get a distinct 404; clients key off it.
        let user = self
            .db
            .find_local_user(&email)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        let (code, entry) = self.otp.generate(OtpPurpose::ResetPassword)?;
        if !self.db.push_otp_entry(&user.id, &entry).await? {
            return Err(ServiceError::UserNotFound);
        }

        self.notifier.enqueue(EmailNotification::password_reset(
            &user.email,
            &user.username(),
            &code,
            self.otp.ttl_minutes(),
        ));

        tracing::info!(user_id = %user.id, "Password reset code issued");
        Ok(())
    }

    /// Redeem a reset code for a new password. Swapping the hash, stamping
    /// the credential epoch and consuming the codes is one atomic update.
    pub async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        let email = normalize_email(email);
        let user = self
            .db
            .find_local_user(&email)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        let now = Utc::now();
        match check_code(&user.otp, OtpPurpose::ResetPassword, code, now) {
            OtpOutcome::NoLiveEntry => Err(ServiceError::OtpExpired),
            OtpOutcome::Mismatch => Err(ServiceError::InvalidOtp),
            OtpOutcome::Valid => {
                let password_hash =
                    hash_password(&Password::new(new_password.to_string()), self.bcrypt_cost)?;
                if !self.db.reset_password(&user.id, &password_hash, now).await? {
                    return Err(ServiceError::OtpExpired);
                }
                tracing::info!(user_id = %user.id, "Password reset");
                Ok(())
            }
        }
    }

    /// Authenticated password change. Stamps the credential epoch, so every
    /// previously issued token dies with the old password.
    pub async fn change_password(
        &self,
        user: &User,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        verify_password(
            &Password::new(old_password.to_string()),
            &PasswordHashString::new(user.password_hash.clone()),
        )
        .map_err(|_| ServiceError::InvalidOldPassword)?;

        let password_hash =
            hash_password(&Password::new(new_password.to_string()), self.bcrypt_cost)?;
        if !self.db.set_password(&user.id, &password_hash, Utc::now()).await? {
            return Err(ServiceError::UserNotFound);
        }

        tracing::info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    /// Exchange a refresh token for a new access token. The refresh token is
    /// not rotated.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<String, ServiceError> {
        let claims = self.tokens.verify(refresh_token, TrustDomain::User)?;

        let user = self
            .db
            .find_user_by_id(&claims.sub)
            .await?
            .ok_or(ServiceError::AccountInactive)?;

        if !user.is_active() {
            return Err(ServiceError::AccountInactive);
        }
        if user.credentials_changed_since(claims.iat) {
            return Err(ServiceError::TokenExpired);
        }

        self.tokens.issue(&user.id, TrustDomain::User, TokenKind::Access)
    }

    /// Soft delete: the account stops authenticating on the next request.
    pub async fn delete_account(&self, user_id: &str) -> Result<(), ServiceError> {
        if !self.db.soft_delete_user(user_id, Utc::now()).await? {
            return Err(ServiceError::UserNotFound);
        }
        tracing::info!(user_id = %user_id, "Account soft-deleted");
        Ok(())
    }

    /// Sanitized profile view with the mobile number decrypted for display.
    pub fn profile(&self, user: &User) -> Result<SanitizedUser, ServiceError> {
        let mobile_number = match &user.mobile_number {
            Some(encrypted) => Some(self.cipher.decrypt(encrypted)?),
            None => None,
        };

        Ok(SanitizedUser {
            id: user.id.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            username: user.username(),
            email: user.email.clone(),
            role: user.role,
            provider: user.provider,
            gender: user.gender,
            is_confirmed: user.is_confirmed,
            mobile_number,
            created_at: user.created_at.to_chrono(),
        })
    }

    /// Toggle the soft ban. Returns whether the account is now banned.
    pub async fn toggle_ban(&self, user_id: &str) -> Result<bool, ServiceError> {
        match self.db.toggle_ban(user_id, Utc::now()).await? {
            Some(banned) => {
                tracing::info!(user_id = %user_id, banned, "Ban toggled");
                Ok(banned)
            }
            None => Err(ServiceError::UserNotFound),
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Age counted as whole 365-day years since the date of birth.
fn age_in_years(date_of_birth: NaiveDate, today: NaiveDate) -> i64 {
    (today - date_of_birth).num_days() / 365
}

fn validate_date_of_birth(date_of_birth: NaiveDate) -> Result<(), ServiceError> {
    let today = Utc::now().date_naive();
    if date_of_birth > today {
        return Err(ServiceError::Validation(
            "Date of birth cannot be in the future".to_string(),
        ));
    }
    if age_in_years(date_of_birth, today) < MINIMUM_AGE_YEARS {
        return Err(ServiceError::Validation(
            "User must be at least 18 years old".to_string(),
        ));
    }
    Ok(())
}

fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn is_duplicate_key_error(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(write_error))
            if write_error.code == 11000
    )
}
