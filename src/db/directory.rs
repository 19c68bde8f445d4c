use async_trait::async_trait;
use crate::db::models::{GuestId, User};
use crate::error::DirectoryError;

#[cfg(test)]
use mockall::automock;

/// Persistent user records. Lookups take canonical phone numbers.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_phone(&self, phone: &str) -> Result<User, DirectoryError>;

    async fn find_by_refresh_token(&self, token: &str) -> Result<User, DirectoryError>;

    /// Inserts `user` and returns it with its assigned id.
    async fn create(&self, user: &User) -> Result<User, DirectoryError>;

    async fn update(&self, user: &User) -> Result<(), DirectoryError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait GuestStore: Send + Sync {
    async fn remove(&self, guest_id: GuestId) -> Result<(), DirectoryError>;
}
