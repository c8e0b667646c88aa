//! In-process stores. Used when no hosted table is configured and as fakes in tests.

use crate::error::AppError;
use crate::model::{ContactMessage, NewContactMessage, Task};
use crate::storage::{MessageStore, TaskStore};
use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: Mutex<Vec<Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn append(&self, task: Task) -> Result<(), AppError> {
        self.tasks.lock().await.push(task);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Task>, AppError> {
        Ok(self.tasks.lock().await.clone())
    }
}

#[derive(Debug, Default)]
struct MessageRows {
    rows: Vec<ContactMessage>,
    last_id: i64,
}

/// Assigns sequential ids and `created_at = now`, like the hosted table does.
#[derive(Debug, Default)]
pub struct MemoryMessageStore {
    inner: Mutex<MessageRows>,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preloads rows as they would come back from the table.
    pub fn with_rows(rows: Vec<ContactMessage>) -> Self {
        let last_id = rows.iter().map(|row| row.id).max().unwrap_or(0);
        Self {
            inner: Mutex::new(MessageRows { rows, last_id }),
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn insert(&self, message: NewContactMessage) -> Result<ContactMessage, AppError> {
        let mut inner = self.inner.lock().await;
        inner.last_id += 1;
        let row = message.into_message(inner.last_id, OffsetDateTime::now_utc());
        inner.rows.push(row.clone());
        Ok(row)
    }

    async fn select_ordered(&self) -> Result<Vec<ContactMessage>, AppError> {
        let mut rows = self.inner.lock().await.rows.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryMessageStore, MemoryTaskStore};
    use crate::model::{ContactMessage, MessageType, NewContactMessage, Task};
    use crate::storage::{MessageStore, TaskStore};
    use time::macros::datetime;

    fn row(id: i64, created_at: time::OffsetDateTime) -> ContactMessage {
        ContactMessage {
            id,
            name: format!("sender {id}"),
            email: "a@b.com".to_string(),
            message: "hi".to_string(),
            message_type: MessageType::Correspondence,
            created_at,
        }
    }

    #[tokio::test]
    async fn task_store_lists_in_insertion_order() {
        let store = MemoryTaskStore::new();
        for (id, text) in [(2, "b"), (1, "a"), (3, "c")] {
            store
                .append(Task {
                    id,
                    text: text.to_string(),
                })
                .await
                .unwrap();
        }

        let ids: Vec<_> = store.list_all().await.unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, [2, 1, 3]);
    }

    #[tokio::test]
    async fn select_orders_newest_first_regardless_of_insert_order() {
        let store = MemoryMessageStore::with_rows(vec![
            row(1, datetime!(2024-10-02 08:00 UTC)),
            row(2, datetime!(2024-10-01 08:00 UTC)),
            row(3, datetime!(2024-10-03 08:00 UTC)),
        ]);

        let ids: Vec<_> = store
            .select_ordered()
            .await
            .unwrap()
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, [3, 1, 2]);
    }

    #[tokio::test]
    async fn insert_assigns_next_id_and_timestamp() {
        let store = MemoryMessageStore::with_rows(vec![row(41, datetime!(2024-10-01 08:00 UTC))]);

        let inserted = store
            .insert(NewContactMessage {
                name: "A".to_string(),
                email: "a@b.com".to_string(),
                message: "hi".to_string(),
                message_type: MessageType::Inquiry,
            })
            .await
            .unwrap();

        assert_eq!(inserted.id, 42);
        assert!(inserted.created_at > datetime!(2024-10-01 08:00 UTC));
        assert_eq!(store.len().await, 2);
        assert_eq!(store.select_ordered().await.unwrap()[0].id, 42);
    }
}
