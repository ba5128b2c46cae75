use async_trait::async_trait;
use thiserror::Error;

use roster_core::domain::user::{NewUser, User, UserId, UserPatch};

pub mod memory;
pub mod user;

pub use memory::InMemoryUserRepository;
pub use user::SqlUserRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("{entity} with {key} not found")]
    NotFound { entity: &'static str, key: String },
    #[error("{entity} with {key} already exists")]
    Conflict { entity: &'static str, key: String },
}

impl RepositoryError {
    pub fn user_not_found_by_id(id: UserId) -> Self {
        Self::NotFound { entity: "user", key: format!("id {id}") }
    }

    pub fn user_not_found_by_email(email: &str) -> Self {
        Self::NotFound { entity: "user", key: format!("email {email}") }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Record-store capability handed to the dispatcher.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;
    async fn find_by_id(&self, id: UserId) -> Result<User, RepositoryError>;
    async fn find_by_email(&self, email: &str) -> Result<User, RepositoryError>;
    /// Applies the patch and refreshes `updated_at`, even when the patch is empty.
    async fn update(&self, id: UserId, patch: UserPatch) -> Result<User, RepositoryError>;
    async fn delete(&self, id: UserId) -> Result<(), RepositoryError>;
    async fn list(&self) -> Result<Vec<User>, RepositoryError>;
}
