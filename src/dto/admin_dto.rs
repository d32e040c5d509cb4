use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::dto::{not_blank, Channel};
use crate::model::payment::{PaymentStatus, PaymentType};
use crate::model::user::Role;
use crate::repository::{DateRange, UserFilter};

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    #[serde(default, with = "crate::util::time::rfc3339::option")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, with = "crate::util::time::rfc3339::option")]
    pub end_date: Option<DateTime<Utc>>,
}

impl DashboardQuery {
    /// A window applies only when both ends are given.
    pub fn range(&self) -> Option<DateRange> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some(DateRange { start, end }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountState {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AdminUserQuery {
    #[validate(range(min = 1, message = "Page must be a positive integer"))]
    pub page: Option<u64>,
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<u64>,
    pub role: Option<Role>,
    pub status: Option<AccountState>,
    pub search: Option<String>,
}

impl AdminUserQuery {
    pub fn filter(&self) -> UserFilter {
        UserFilter {
            active: self.status.map(|s| s == AccountState::Active),
            roles: self.role.into_iter().collect(),
            search: crate::dto::clean(self.search.clone()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PaymentListQuery {
    #[validate(range(min = 1, message = "Page must be a positive integer"))]
    pub page: Option<u64>,
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<u64>,
    pub status: Option<PaymentStatus>,
    #[serde(rename = "type")]
    pub payment_type: Option<PaymentType>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: ExportFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportType {
    Users,
    Events,
    Payments,
}

impl ExportType {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportType::Users => "users",
            ExportType::Events => "events",
            ExportType::Payments => "payments",
        }
    }
}

impl fmt::Display for ExportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "users" => Ok(ExportType::Users),
            "events" => Ok(ExportType::Events),
            "payments" => Ok(ExportType::Payments),
            _ => Err("Invalid export type".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Audience {
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub graduation_years: Vec<i32>,
    #[serde(default)]
    pub locations: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BulkNotificationRequest {
    #[serde(rename = "type")]
    pub channel: Channel,
    #[validate(length(max = 200, message = "Subject must be at most 200 characters"))]
    pub subject: Option<String>,
    #[validate(custom(function = "not_blank", message = "Message is required"))]
    pub message: String,
    #[validate(nested)]
    pub audience: Option<Audience>,
}

impl BulkNotificationRequest {
    /// Active users inside the audience; no audience means every active user.
    pub fn recipient_filter(&self) -> UserFilter {
        let mut filter = UserFilter::active();
        if let Some(audience) = &self.audience {
            filter.roles = audience.roles.clone();
            filter.graduation_years = audience.graduation_years.clone();
            filter.locations = audience.locations.iter().filter(|l| !l.trim().is_empty()).cloned().collect();
        }
        filter
    }
}
