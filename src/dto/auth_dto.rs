use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::dto::{not_blank, phone_number};
use crate::model::user::UserView;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(
        custom(function = "not_blank", message = "First name is required"),
        length(max = 50, message = "First name must be at most 50 characters")
    )]
    pub first_name: String,
    #[validate(
        custom(function = "not_blank", message = "Last name is required"),
        length(max = 50, message = "Last name must be at most 50 characters")
    )]
    pub last_name: String,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(custom(function = "phone_number", message = "Please provide a valid phone number"))]
    pub phone: Option<String>,
    #[validate(range(min = 1950, max = 2100, message = "Please provide a valid graduation year"))]
    pub graduation_year: Option<i32>,
}

/// `identifier` is either an email address or a phone number.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(custom(function = "not_blank", message = "Email or phone is required"))]
    pub identifier: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserView>,
}
