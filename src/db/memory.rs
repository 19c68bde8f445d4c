use async_trait::async_trait;
use crate::db::directory::{GuestStore, UserDirectory};
use crate::db::models::{GuestId, User, UserId};
use crate::error::DirectoryError;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Process-local users and guests, for development and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    users: Arc<RwLock<HashMap<UserId, User>>>,
    guests: Arc<RwLock<HashSet<GuestId>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_guest(&self, guest_id: GuestId) {
        self.guests.write().await.insert(guest_id);
    }

    pub async fn has_guest(&self, guest_id: GuestId) -> bool {
        self.guests.read().await.contains(&guest_id)
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    /// Soft-deletes the user with `phone`.
    pub async fn deactivate(&self, phone: &str) -> Result<(), DirectoryError> {
        let mut users = self.users.write().await;
        let user = users
            .values_mut()
            .find(|u| u.phone == phone)
            .ok_or(DirectoryError::NotFound)?;
        user.deleted_at = Some(Utc::now());
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn find_by_phone(&self, phone: &str) -> Result<User, DirectoryError> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.phone == phone)
            .cloned()
            .ok_or(DirectoryError::NotFound)
    }

    async fn find_by_refresh_token(&self, token: &str) -> Result<User, DirectoryError> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.refresh_token.as_deref() == Some(token))
            .cloned()
            .ok_or(DirectoryError::NotFound)
    }

    async fn create(&self, user: &User) -> Result<User, DirectoryError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.phone == user.phone) {
            return Err(DirectoryError::Duplicate);
        }

        let mut created = user.clone();
        created.id = users.keys().max().copied().unwrap_or(0) + 1;
        users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, user: &User) -> Result<(), DirectoryError> {
        let mut users = self.users.write().await;
        let stored = users.get_mut(&user.id).ok_or(DirectoryError::NotFound)?;
        *stored = user.clone();
        stored.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl GuestStore for MemoryStore {
    /// Removing an unknown guest is not an error.
    async fn remove(&self, guest_id: GuestId) -> Result<(), DirectoryError> {
        self.guests.write().await.remove(&guest_id);
        Ok(())
    }
}
