pub mod otp;
pub mod user;

pub use otp::{OtpEntry, OtpPurpose};
pub use user::{Gender, Provider, Role, SanitizedUser, User};
