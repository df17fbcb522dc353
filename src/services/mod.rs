pub mod account;
pub mod database;
pub mod email;
pub mod error;
pub mod google;
pub mod notifier;
pub mod otp;
pub mod sweeper;
pub mod tokens;

pub use account::AccountService;
pub use database::MongoDb;
pub use email::{EmailNotification, EmailProvider, MockEmailService, SmtpEmailService};
pub use error::ServiceError;
pub use google::{GoogleIdentityProvider, IdentityProvider, MockIdentityProvider, VerifiedIdentity};
pub use notifier::Notifier;
pub use otp::{check_code, OtpManager, OtpOutcome};
pub use sweeper::OtpSweeper;
pub use tokens::{Claims, TokenKind, TokenPair, TokenService, TrustDomain};
