use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub text: String,
}

/// A validated task submission that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub text: String,
}

impl NewTask {
    pub fn with_id(self, id: i64) -> Task {
        Task { id, text: self.text }
    }
}
