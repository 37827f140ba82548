use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::{StoreError, UserStore};
use super::repo_types::{NewUser, User};

/// Process-local store used by tests. Every operation runs inside one lock
/// section, so the email check and the insert are atomic.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count_by_email(&self, email: &str) -> usize {
        let users = self.users.lock().unwrap();
        users.values().filter(|u| u.email == email).count()
    }

    /// Inserts a row verbatim, bypassing the usual provider defaults.
    pub fn insert_raw(&self, user: User) {
        self.users.lock().unwrap().insert(user.id, user);
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == new.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            provider: new.provider,
            provider_id: new.provider_id,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let users = self.users.lock().unwrap();
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by_key(|u| u.created_at);
        Ok(all)
    }

    async fn link_provider(
        &self,
        id: Uuid,
        provider: &str,
        provider_id: &str,
    ) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&id).ok_or(StoreError::NotFound)?;
        if user.provider.is_empty() {
            user.provider = provider.to_string();
            user.provider_id = provider_id.to_string();
            user.updated_at = OffsetDateTime::now_utc();
        }
        Ok(user.clone())
    }

    async fn update_name(&self, id: Uuid, name: &str) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.name = name.to_string();
        user.updated_at = OffsetDateTime::now_utc();
        Ok(user.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.users
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}
