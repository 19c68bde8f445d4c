//! User directory and guest storage.
//!
//! The auth service only sees the `UserDirectory` and `GuestStore` traits;
//! `DbOperations` backs them with Postgres, `MemoryStore` with process memory.

pub mod directory;
pub mod memory;
pub mod models;
pub mod operations;

pub use directory::{GuestStore, UserDirectory};
pub use memory::MemoryStore;
pub use models::{GuestId, User, UserId};
pub use operations::{DbOperations, DbPoolStatus};
