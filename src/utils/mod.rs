pub mod crypto;
pub mod password;
pub mod validation;

pub use validation::ValidatedJson;
