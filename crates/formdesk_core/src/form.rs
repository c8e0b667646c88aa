//! Submitted form fields and the schemas that turn them into typed records.
//!
//! A schema either yields a fully valid record or fails as a whole; partially
//! valid submissions never reach a store.

use crate::error::AppError;
use crate::model::{MessageType, NewContactMessage, NewTask};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9_'+\-]+(\.[A-Za-z0-9_'+\-]+)*@([A-Za-z0-9]([A-Za-z0-9\-]*[A-Za-z0-9])?\.)+[A-Za-z]{2,}$",
    )
    .expect("email pattern compiles")
});

/// Raw string fields keyed by input name, as decoded from a form post.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    values: HashMap<String, String>,
}

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Trimmed value of a required field; blank counts as missing.
    pub fn required(&self, key: &str) -> Result<String, AppError> {
        match self.get(key).map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value.to_string()),
            _ => Err(AppError::invalid_input(format!("{key} is required"))),
        }
    }
}

impl From<HashMap<String, String>> for FormFields {
    fn from(values: HashMap<String, String>) -> Self {
        Self { values }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

pub fn is_valid_email(value: &str) -> bool {
    value.len() <= 254 && EMAIL_PATTERN.is_match(value)
}

/// Field names posted by the task form.
pub struct TaskSchema;

impl TaskSchema {
    pub const TODO: &'static str = "todo";

    pub fn parse(fields: &FormFields) -> Result<NewTask, AppError> {
        let text = fields.required(Self::TODO)?;
        Ok(NewTask { text })
    }
}

/// Field names posted by the contact form.
pub struct ContactSchema;

impl ContactSchema {
    pub const NAME: &'static str = "name";
    pub const EMAIL: &'static str = "email";
    pub const MESSAGE: &'static str = "message";
    pub const TYPE: &'static str = "type";

    pub fn parse(fields: &FormFields) -> Result<NewContactMessage, AppError> {
        let name = fields.required(Self::NAME)?;
        let email = fields.required(Self::EMAIL)?;
        if !is_valid_email(&email) {
            return Err(AppError::invalid_input("email is not a valid address"));
        }
        let message = fields.required(Self::MESSAGE)?;
        let raw_type = fields.required(Self::TYPE)?;
        let message_type = MessageType::parse(&raw_type)
            .ok_or_else(|| AppError::invalid_input(format!("unknown message type '{raw_type}'")))?;

        Ok(NewContactMessage {
            name,
            email,
            message,
            message_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ContactSchema, FormFields, TaskSchema, is_valid_email};
    use crate::model::MessageType;

    fn contact_fields() -> FormFields {
        FormFields::new()
            .with("name", "A")
            .with("email", "a@b.com")
            .with("message", "hi")
            .with("type", "inquiry")
    }

    #[test]
    fn task_schema_trims_text() {
        let fields = FormFields::new().with("todo", "  buy milk ");
        let task = TaskSchema::parse(&fields).unwrap();
        assert_eq!(task.text, "buy milk");
    }

    #[test]
    fn task_schema_rejects_missing_and_blank() {
        let err = TaskSchema::parse(&FormFields::new()).unwrap_err();
        assert_eq!(err.code(), "invalid_input");

        let err = TaskSchema::parse(&FormFields::new().with("todo", "   ")).unwrap_err();
        assert!(err.message().contains("todo is required"));
    }

    #[test]
    fn contact_schema_accepts_valid_submission() {
        let parsed = ContactSchema::parse(&contact_fields()).unwrap();
        assert_eq!(parsed.name, "A");
        assert_eq!(parsed.email, "a@b.com");
        assert_eq!(parsed.message, "hi");
        assert_eq!(parsed.message_type, MessageType::Inquiry);
    }

    #[test]
    fn contact_schema_rejects_malformed_email() {
        let fields = contact_fields().with("email", "not-an-email");
        let err = ContactSchema::parse(&fields).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn contact_schema_rejects_unknown_type() {
        let fields = contact_fields().with("type", "complaint");
        let err = ContactSchema::parse(&fields).unwrap_err();
        assert!(err.message().contains("complaint"));
    }

    #[test]
    fn contact_schema_requires_every_field() {
        for key in ["name", "email", "message", "type"] {
            let fields = contact_fields().with(key, "");
            assert!(ContactSchema::parse(&fields).is_err(), "{key} accepted blank");
        }
    }

    #[test]
    fn email_syntax() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("first.last+tag@mail.example.org"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.com"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("a..b@c.com"));
    }
}
