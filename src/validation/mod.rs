//! Checks a calculation setup against the registry before any matrix is built.
pub mod error;
mod rules;
pub mod validator;

pub use error::{ValidationError, ValidationErrorType};
pub use validator::Validator;
