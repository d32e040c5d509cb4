use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::dto::{clean, not_blank};
use crate::model::announcement::{
    check_window, Announcement, AnnouncementCategory, AnnouncementStatus, Engagement, Priority,
    TargetAudience,
};
use crate::model::DomainError;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementListQuery {
    #[validate(range(min = 1, message = "Page must be a positive integer"))]
    pub page: Option<u64>,
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<u64>,
    pub category: Option<AnnouncementCategory>,
    pub priority: Option<Priority>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnnouncementRequest {
    #[validate(
        custom(function = "not_blank", message = "Title is required"),
        length(max = 200, message = "Title must be at most 200 characters")
    )]
    pub title: String,
    #[validate(custom(function = "not_blank", message = "Content is required"))]
    pub content: String,
    pub category: AnnouncementCategory,
    pub priority: Option<Priority>,
    pub status: Option<AnnouncementStatus>,
    pub is_pinned: Option<bool>,
    #[serde(default, with = "crate::util::time::rfc3339::option")]
    pub publish_date: Option<DateTime<Utc>>,
    #[serde(default, with = "crate::util::time::rfc3339::option")]
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub target_audience: Option<TargetAudience>,
}

impl CreateAnnouncementRequest {
    /// Publish date defaults to `now`; expiry must come after it.
    pub fn into_announcement(self, author: ObjectId, now: DateTime<Utc>) -> Result<Announcement, DomainError> {
        let publish_date = self.publish_date.unwrap_or(now);
        check_window(publish_date, self.expiry_date)?;
        Ok(Announcement {
            id: None,
            title: self.title.trim().to_string(),
            content: self.content,
            author,
            category: self.category,
            priority: self.priority.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            is_pinned: self.is_pinned.unwrap_or(false),
            publish_date,
            expiry_date: self.expiry_date,
            tags: self.tags,
            target_audience: self.target_audience.unwrap_or_default(),
            engagement: Engagement::default(),
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAnnouncementRequest {
    #[validate(
        custom(function = "not_blank", message = "Title cannot be empty"),
        length(max = 200, message = "Title must be at most 200 characters")
    )]
    pub title: Option<String>,
    #[validate(custom(function = "not_blank", message = "Content cannot be empty"))]
    pub content: Option<String>,
    pub category: Option<AnnouncementCategory>,
    pub priority: Option<Priority>,
    pub status: Option<AnnouncementStatus>,
    pub is_pinned: Option<bool>,
    #[serde(default, with = "crate::util::time::rfc3339::option")]
    pub publish_date: Option<DateTime<Utc>>,
    #[serde(default, with = "crate::util::time::rfc3339::option")]
    pub expiry_date: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
    pub target_audience: Option<TargetAudience>,
}

impl UpdateAnnouncementRequest {
    pub fn apply(self, announcement: &mut Announcement, now: DateTime<Utc>) -> Result<(), DomainError> {
        let publish_date = self.publish_date.unwrap_or(announcement.publish_date);
        let expiry_date = self.expiry_date.or(announcement.expiry_date);
        check_window(publish_date, expiry_date)?;
        announcement.publish_date = publish_date;
        announcement.expiry_date = expiry_date;

        if let Some(title) = clean(self.title) {
            announcement.title = title;
        }
        if let Some(content) = self.content {
            announcement.content = content;
        }
        if let Some(category) = self.category {
            announcement.category = category;
        }
        if let Some(priority) = self.priority {
            announcement.priority = priority;
        }
        if let Some(status) = self.status {
            announcement.status = status;
        }
        if let Some(is_pinned) = self.is_pinned {
            announcement.is_pinned = is_pinned;
        }
        if let Some(tags) = self.tags {
            announcement.tags = tags;
        }
        if let Some(audience) = self.target_audience {
            announcement.target_audience = audience;
        }
        announcement.updated_at = now;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(
        custom(function = "not_blank", message = "Content is required"),
        length(max = 1000, message = "Content must be at most 1000 characters")
    )]
    pub content: String,
}
