//! Server actions: validate a submitted form, write it, report back.

use crate::error::AppError;
use crate::form::{ContactSchema, FormFields, TaskSchema};
use crate::ids::TaskIdGenerator;
use crate::model::{ContactMessage, Task};
use crate::storage::{MessageStore, TaskStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

pub const TASKS_ROUTE: &str = "/";
pub const CONTACT_ROUTE: &str = "/contact";
pub const CONFIRMATION_ROUTE: &str = "/contact/thank-you";

pub const TASK_CREATED: &str = "Task created";
pub const TASK_FAILED: &str = "An error occurred while creating your task.";
pub const MESSAGE_FAILED: &str = "An error occurred while sending your message.";
pub const INVALID_SUBMISSION: &str = "Please fill in every field with a valid value.";
pub const TASKS_UNAVAILABLE: &str = "An error occurred while fetching tasks.";
pub const MESSAGES_UNAVAILABLE: &str = "An error occurred while fetching messages.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    Success,
    Invalid,
    Failed,
}

/// What the form shows after a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionState {
    pub status: ActionStatus,
    pub message: String,
}

impl ActionState {
    fn new(status: ActionStatus, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Re-render the originating form with this state.
    Render(ActionState),
    /// Navigate to another route.
    Redirect(&'static str),
}

/// A collection read for display. A failed read degrades to no items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub error: Option<String>,
}

impl<T> Listing<T> {
    fn from_result(result: Result<Vec<T>, AppError>, what: &str, unavailable: &str) -> Self {
        match result {
            Ok(items) => Self { items, error: None },
            Err(err) => {
                error!(error = %err, "failed to read {what}");
                Self {
                    items: Vec::new(),
                    error: Some(unavailable.to_string()),
                }
            }
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

pub struct FormActions {
    tasks: Arc<dyn TaskStore>,
    messages: Arc<dyn MessageStore>,
    ids: TaskIdGenerator,
    write_delay: Duration,
}

impl FormActions {
    pub fn new(tasks: Arc<dyn TaskStore>, messages: Arc<dyn MessageStore>) -> Self {
        Self {
            tasks,
            messages,
            ids: TaskIdGenerator::new(),
            write_delay: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn with_ids(mut self, ids: TaskIdGenerator) -> Self {
        self.ids = ids;
        self
    }

    /// Pause inserted before every write, simulating a slow backend.
    #[must_use]
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = delay;
        self
    }

    async fn pause_before_write(&self) {
        if !self.write_delay.is_zero() {
            tokio::time::sleep(self.write_delay).await;
        }
    }

    pub async fn create_task(&self, fields: &FormFields) -> ActionOutcome {
        let new_task = match TaskSchema::parse(fields) {
            Ok(task) => task,
            Err(err) => {
                warn!(error = %err, "rejected task submission");
                return ActionOutcome::Render(ActionState::new(
                    ActionStatus::Invalid,
                    INVALID_SUBMISSION,
                ));
            }
        };

        self.pause_before_write().await;

        let task = new_task.with_id(self.ids.next_id());
        let id = task.id;
        if let Err(err) = self.tasks.append(task).await {
            error!(error = %err, "failed to store task");
            return ActionOutcome::Render(ActionState::new(ActionStatus::Failed, TASK_FAILED));
        }

        info!(id, "task created");
        ActionOutcome::Render(ActionState::new(ActionStatus::Success, TASK_CREATED))
    }

    pub async fn send_contact_message(&self, fields: &FormFields) -> ActionOutcome {
        let submission = match ContactSchema::parse(fields) {
            Ok(submission) => submission,
            Err(err) => {
                warn!(error = %err, "rejected contact submission");
                return ActionOutcome::Render(ActionState::new(
                    ActionStatus::Invalid,
                    INVALID_SUBMISSION,
                ));
            }
        };

        self.pause_before_write().await;

        match self.messages.insert(submission).await {
            Ok(row) => {
                info!(id = row.id, kind = %row.message_type, "contact message stored");
                ActionOutcome::Redirect(CONFIRMATION_ROUTE)
            }
            Err(err) => {
                error!(error = %err, "failed to insert contact message");
                ActionOutcome::Render(ActionState::new(ActionStatus::Failed, MESSAGE_FAILED))
            }
        }
    }

    pub async fn list_tasks(&self) -> Listing<Task> {
        Listing::from_result(self.tasks.list_all().await, "tasks", TASKS_UNAVAILABLE)
    }

    pub async fn list_messages(&self) -> Listing<ContactMessage> {
        Listing::from_result(
            self.messages.select_ordered().await,
            "messages",
            MESSAGES_UNAVAILABLE,
        )
    }
}
