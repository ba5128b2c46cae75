use std::collections::BTreeMap;

use chrono::Utc;
use tokio::sync::RwLock;

use roster_core::domain::user::{NewUser, User, UserId, UserPatch};

use super::{RepositoryError, UserRepository};

#[derive(Default)]
struct MemoryState {
    last_id: i64,
    users: BTreeMap<i64, User>,
}

impl MemoryState {
    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.users.values().any(|user| user.email == email && Some(user.id) != except)
    }
}

/// Map-backed store with the same contract as the SQL repository.
#[derive(Default)]
pub struct InMemoryUserRepository {
    state: RwLock<MemoryState>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut state = self.state.write().await;
        if state.email_taken(&user.email, None) {
            return Err(RepositoryError::Conflict {
                entity: "user",
                key: format!("email {}", user.email),
            });
        }

        state.last_id += 1;
        let now = Utc::now();
        let record = User {
            id: UserId(state.last_id),
            name: user.name,
            email: user.email,
            age: user.age,
            phone_number: user.phone_number,
            address: user.address,
            role: user.role,
            is_active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(record.id.0, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: UserId) -> Result<User, RepositoryError> {
        let state = self.state.read().await;
        state.users.get(&id.0).cloned().ok_or_else(|| RepositoryError::user_not_found_by_id(id))
    }

    async fn find_by_email(&self, email: &str) -> Result<User, RepositoryError> {
        let state = self.state.read().await;
        state
            .users
            .values()
            .find(|user| user.email == email)
            .cloned()
            .ok_or_else(|| RepositoryError::user_not_found_by_email(email))
    }

    async fn update(&self, id: UserId, patch: UserPatch) -> Result<User, RepositoryError> {
        let mut state = self.state.write().await;
        if let Some(email) = patch.email.as_deref() {
            if state.email_taken(email, Some(id)) && state.users.contains_key(&id.0) {
                return Err(RepositoryError::Conflict {
                    entity: "user",
                    key: format!("email {email}"),
                });
            }
        }

        let user =
            state.users.get_mut(&id.0).ok_or_else(|| RepositoryError::user_not_found_by_id(id))?;
        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        state
            .users
            .remove(&id.0)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::user_not_found_by_id(id))
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.users.values().cloned().collect())
    }
}
