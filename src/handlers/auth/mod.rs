pub mod password;
pub mod registration;
pub mod session;
pub mod social;

pub use password::{forgot_password, reset_password};
pub use registration::{confirm_otp, signup};
pub use session::{refresh_token, signin};
pub use social::google_signin;
