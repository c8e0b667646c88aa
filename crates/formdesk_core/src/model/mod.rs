mod contact;
mod task;

pub use contact::{ContactMessage, MessageType, NewContactMessage};
pub use task::{NewTask, Task};
