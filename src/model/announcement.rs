use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::user::Role;
use crate::model::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementCategory {
    General,
    Jobs,
    News,
    Scholarships,
    Events,
    Achievements,
    Obituary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementStatus {
    Draft,
    #[default]
    Published,
    Archived,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub user: ObjectId,
    #[serde(with = "crate::util::time::rfc3339")]
    pub liked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user: ObjectId,
    pub content: String,
    #[serde(with = "crate::util::time::rfc3339")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user: ObjectId,
    pub content: String,
    #[serde(with = "crate::util::time::rfc3339")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub replies: Vec<Reply>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Engagement {
    pub views: u64,
    pub likes: Vec<Like>,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TargetAudience {
    pub is_public: bool,
    pub graduation_years: Vec<i32>,
    pub locations: Vec<String>,
    pub roles: Vec<Role>,
}

impl Default for TargetAudience {
    fn default() -> Self {
        TargetAudience {
            is_public: true,
            graduation_years: Vec::new(),
            locations: Vec::new(),
            roles: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub content: String,
    pub author: ObjectId,
    pub category: AnnouncementCategory,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: AnnouncementStatus,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(with = "crate::util::time::rfc3339")]
    pub publish_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "crate::util::time::rfc3339::option")]
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub target_audience: TargetAudience,
    #[serde(default)]
    pub engagement: Engagement,
    #[serde(with = "crate::util::time::rfc3339")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::util::time::rfc3339")]
    pub updated_at: DateTime<Utc>,
}

/// Publish/expiry window check shared by create and update.
pub fn check_window(publish: DateTime<Utc>, expiry: Option<DateTime<Utc>>) -> Result<(), DomainError> {
    match expiry {
        Some(expiry) if expiry <= publish => Err(DomainError::ExpiryBeforePublish),
        _ => Ok(()),
    }
}

impl Announcement {
    pub fn like_count(&self) -> usize {
        self.engagement.likes.len()
    }

    /// Likes or unlikes on behalf of `user_id`; returns whether the user now likes it.
    pub fn toggle_like(&mut self, user_id: ObjectId, now: DateTime<Utc>) -> bool {
        let likes = &mut self.engagement.likes;
        let liked = match likes.iter().position(|like| like.user == user_id) {
            Some(index) => {
                likes.remove(index);
                false
            }
            None => {
                likes.push(Like { user: user_id, liked_at: now });
                true
            }
        };
        self.updated_at = now;
        liked
    }

    pub fn add_comment(&mut self, user_id: ObjectId, content: String, now: DateTime<Utc>) -> Comment {
        let comment = Comment {
            id: ObjectId::new(),
            user: user_id,
            content,
            created_at: now,
            replies: Vec::new(),
        };
        self.engagement.comments.push(comment.clone());
        self.updated_at = now;
        comment
    }

    pub fn add_reply(
        &mut self,
        comment_id: &ObjectId,
        user_id: ObjectId,
        content: String,
        now: DateTime<Utc>,
    ) -> Result<Reply, DomainError> {
        let comment = self
            .engagement
            .comments
            .iter_mut()
            .find(|c| &c.id == comment_id)
            .ok_or(DomainError::CommentNotFound)?;
        let reply = Reply {
            id: ObjectId::new(),
            user: user_id,
            content,
            created_at: now,
        };
        comment.replies.push(reply.clone());
        self.updated_at = now;
        Ok(reply)
    }

    pub fn find_comment(&self, comment_id: &ObjectId) -> Option<&Comment> {
        self.engagement.comments.iter().find(|c| &c.id == comment_id)
    }

    pub fn remove_comment(&mut self, comment_id: &ObjectId, now: DateTime<Utc>) -> Result<Comment, DomainError> {
        let index = self
            .engagement
            .comments
            .iter()
            .position(|c| &c.id == comment_id)
            .ok_or(DomainError::CommentNotFound)?;
        self.updated_at = now;
        Ok(self.engagement.comments.remove(index))
    }

    /// Visible in public listings at `now`
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.status == AnnouncementStatus::Published
            && (self.target_audience.is_public || self.publish_date <= now)
            && self.expiry_date.map_or(true, |expiry| expiry >= now)
    }

    pub fn referenced_user_ids(&self) -> Vec<ObjectId> {
        let mut ids = vec![self.author];
        for comment in &self.engagement.comments {
            ids.push(comment.user);
            ids.extend(comment.replies.iter().map(|r| r.user));
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap()
    }

    fn sample() -> Announcement {
        Announcement {
            id: Some(ObjectId::new()),
            title: "Scholarship round open".into(),
            content: "Apply before June".into(),
            author: ObjectId::new(),
            category: AnnouncementCategory::Scholarships,
            priority: Priority::High,
            status: AnnouncementStatus::Published,
            is_pinned: false,
            publish_date: now(),
            expiry_date: None,
            tags: Vec::new(),
            target_audience: TargetAudience::default(),
            engagement: Engagement::default(),
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn test_double_like_restores_count() {
        let mut a = sample();
        a.toggle_like(ObjectId::new(), now());
        let before = a.like_count();
        let user = ObjectId::new();
        assert!(a.toggle_like(user, now()));
        assert_eq!(a.like_count(), before + 1);
        assert!(!a.toggle_like(user, now()));
        assert_eq!(a.like_count(), before);
    }

    #[test]
    fn test_reply_requires_existing_comment() {
        let mut a = sample();
        let comment = a.add_comment(ObjectId::new(), "Congrats".into(), now());
        let reply = a.add_reply(&comment.id, ObjectId::new(), "Thanks".into(), now()).unwrap();
        assert_eq!(a.engagement.comments[0].replies, vec![reply]);
        assert_eq!(
            a.add_reply(&ObjectId::new(), ObjectId::new(), "?".into(), now()),
            Err(DomainError::CommentNotFound)
        );
    }

    #[test]
    fn test_window_check() {
        assert!(check_window(now(), None).is_ok());
        assert!(check_window(now(), Some(now() + Duration::days(1))).is_ok());
        assert_eq!(check_window(now(), Some(now())), Err(DomainError::ExpiryBeforePublish));
    }

    #[test]
    fn test_is_live() {
        let mut a = sample();
        assert!(a.is_live(now()));
        a.expiry_date = Some(now() - Duration::seconds(1));
        assert!(!a.is_live(now()));
        a.expiry_date = None;
        a.status = AnnouncementStatus::Draft;
        assert!(!a.is_live(now()));
        a.status = AnnouncementStatus::Published;
        a.target_audience.is_public = false;
        a.publish_date = now() + Duration::days(1);
        assert!(!a.is_live(now()));
    }
}
