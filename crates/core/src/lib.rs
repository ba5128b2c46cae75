pub mod config;
pub mod domain;
pub mod errors;

pub use domain::user::{NewUser, User, UserId, UserPatch};
pub use errors::DomainError;
