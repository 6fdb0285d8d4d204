pub mod auth;
pub mod error;
pub mod response;
pub mod users;

pub use error::{ApiError, ApiErrorKind, Detail};
