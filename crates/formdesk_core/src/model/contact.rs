use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    #[serde(rename = "correspondence")]
    Correspondence,
    #[serde(rename = "bug report")]
    BugReport,
    #[serde(rename = "inquiry")]
    Inquiry,
}

impl MessageType {
    pub const ALL: [MessageType; 3] = [Self::Correspondence, Self::BugReport, Self::Inquiry];

    /// Wire value, as stored in the `type` column and posted by the form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Correspondence => "correspondence",
            Self::BugReport => "bug report",
            Self::Inquiry => "inquiry",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Correspondence => "Correspondence",
            Self::BugReport => "Bug Report",
            Self::Inquiry => "Inquiry",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(trimmed))
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub message: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A validated contact submission; `id` and `created_at` are assigned on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
}

impl NewContactMessage {
    pub fn into_message(self, id: i64, created_at: OffsetDateTime) -> ContactMessage {
        ContactMessage {
            id,
            name: self.name,
            email: self.email,
            message: self.message,
            message_type: self.message_type,
            created_at,
        }
    }
}
