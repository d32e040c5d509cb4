pub mod admin_dto;
pub mod announcement_dto;
pub mod auth_dto;
pub mod event_dto;
pub mod job_dto;
pub mod pagination;
pub mod user_dto;

use serde::Deserialize;
use validator::ValidationError;

use crate::util::sms::normalize_phone;

/// Delivery channel for reminders and broadcasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
    Both,
}

impl Channel {
    pub fn includes_email(self) -> bool {
        matches!(self, Channel::Email | Channel::Both)
    }

    pub fn includes_sms(self) -> bool {
        matches!(self, Channel::Sms | Channel::Both)
    }
}

pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

pub fn phone_number(value: &str) -> Result<(), ValidationError> {
    match normalize_phone(value) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("phone")),
    }
}

/// Trims optional text, turning whitespace-only input into `None`.
pub fn clean(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
