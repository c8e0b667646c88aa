//! Persistence targets for tasks and contact messages.

use crate::error::AppError;
use crate::model::{ContactMessage, NewContactMessage, Task};
use async_trait::async_trait;

pub mod json_store;
pub mod memory;
pub mod rest_store;

pub use json_store::JsonTaskStore;
pub use memory::{MemoryMessageStore, MemoryTaskStore};
pub use rest_store::{RestConfig, RestMessageStore};

/// Append-only task collection listed in insertion order.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn append(&self, task: Task) -> Result<(), AppError>;

    async fn list_all(&self) -> Result<Vec<Task>, AppError>;
}

/// Hosted message table: one insert, one ordered select.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Inserts the message, returning the row with its assigned id and timestamp.
    async fn insert(&self, message: NewContactMessage) -> Result<ContactMessage, AppError>;

    /// All rows, newest `created_at` first.
    async fn select_ordered(&self) -> Result<Vec<ContactMessage>, AppError>;
}
