use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{error, info, instrument, warn};

use crate::dto::announcement_dto::{AnnouncementListQuery, CreateAnnouncementRequest, UpdateAnnouncementRequest};
use crate::dto::pagination::{page_of, Pagination, DEFAULT_LIMIT};
use crate::dto::clean;
use crate::model::announcement::{Announcement, AnnouncementStatus};
use crate::model::user::{Role, User, UserSummary};
use crate::repository::{AnnouncementFilter, AnnouncementRepository, UserRepository};
use crate::service::{ensure_owner_or_admin, user_id, user_lookup};
use crate::util::error::ServiceError;
use crate::util::json::{populate, to_api_value};

/// Outcome of a like toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeState {
    pub liked: bool,
    pub like_count: usize,
}

#[async_trait]
pub trait AnnouncementService: Send + Sync {
    async fn list_announcements(&self, query: AnnouncementListQuery, now: DateTime<Utc>) -> Result<Value, ServiceError>;
    /// Counts a view on every successful read.
    async fn get_announcement(&self, viewer: Option<&User>, id: &ObjectId) -> Result<Value, ServiceError>;
    async fn create_announcement(&self, actor: &User, request: CreateAnnouncementRequest) -> Result<Value, ServiceError>;
    async fn editable_announcement(&self, actor: &User, id: &ObjectId) -> Result<Announcement, ServiceError>;
    async fn update_announcement(
        &self,
        announcement: Announcement,
        request: UpdateAnnouncementRequest,
    ) -> Result<Value, ServiceError>;
    async fn delete_announcement(&self, announcement: Announcement) -> Result<(), ServiceError>;
    async fn toggle_like(&self, actor: &User, id: &ObjectId) -> Result<LikeState, ServiceError>;
    async fn add_comment(&self, actor: &User, id: &ObjectId, content: String) -> Result<Value, ServiceError>;
    async fn add_reply(
        &self,
        actor: &User,
        id: &ObjectId,
        comment_id: &ObjectId,
        content: String,
    ) -> Result<Value, ServiceError>;
    /// Comment author or admin only.
    async fn delete_comment(&self, actor: &User, id: &ObjectId, comment_id: &ObjectId) -> Result<(), ServiceError>;
}

pub struct AnnouncementServiceImpl {
    pub announcement_repo: Arc<dyn AnnouncementRepository>,
    pub user_repo: Arc<dyn UserRepository>,
}

impl AnnouncementServiceImpl {
    pub fn new(announcement_repo: Arc<dyn AnnouncementRepository>, user_repo: Arc<dyn UserRepository>) -> Self {
        Self { announcement_repo, user_repo }
    }

    async fn find(&self, id: &ObjectId) -> Result<Announcement, ServiceError> {
        self.announcement_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Announcement not found"))
    }

    async fn shape(&self, announcement: &Announcement) -> Result<Value, ServiceError> {
        let mut ids = announcement.referenced_user_ids();
        ids.extend(announcement.engagement.likes.iter().map(|l| l.user));
        let lookup = user_lookup(self.user_repo.as_ref(), ids, UserSummary::brief).await?;
        let mut value = to_api_value(announcement)?;
        populate(&mut value, &["author"], &lookup);
        populate(&mut value, &["engagement", "likes", "user"], &lookup);
        populate(&mut value, &["engagement", "comments", "user"], &lookup);
        populate(&mut value, &["engagement", "comments", "replies", "user"], &lookup);
        Ok(value)
    }

    /// Serializes one embedded entry with its `user` resolved.
    async fn shape_entry<T: serde::Serialize>(&self, entry: &T, user: ObjectId) -> Result<Value, ServiceError> {
        let lookup = user_lookup(self.user_repo.as_ref(), vec![user], UserSummary::brief).await?;
        let mut value = to_api_value(entry)?;
        populate(&mut value, &["user"], &lookup);
        Ok(value)
    }
}

#[async_trait]
impl AnnouncementService for AnnouncementServiceImpl {
    #[instrument(skip(self))]
    async fn list_announcements(&self, query: AnnouncementListQuery, now: DateTime<Utc>) -> Result<Value, ServiceError> {
        let page = page_of(query.page, query.limit, DEFAULT_LIMIT);
        let filter = AnnouncementFilter {
            category: query.category,
            priority: query.priority,
            search: clean(query.search),
            ..AnnouncementFilter::live_at(now)
        };
        let found = self.announcement_repo.find_page(&filter, page).await.map_err(|e| {
            error!("Failed to list announcements: {}", e);
            ServiceError::from(e)
        })?;

        let authors = found.items.iter().map(|a| a.author).collect();
        let lookup = user_lookup(self.user_repo.as_ref(), authors, UserSummary::brief).await?;
        let mut announcements = to_api_value(&found.items)?;
        populate(&mut announcements, &["author"], &lookup);
        info!(count = found.items.len(), total = found.total, "Listed announcements");
        Ok(json!({ "announcements": announcements, "pagination": Pagination::new(page, found.total) }))
    }

    #[instrument(skip(self, viewer))]
    async fn get_announcement(&self, viewer: Option<&User>, id: &ObjectId) -> Result<Value, ServiceError> {
        let mut announcement = self.find(id).await?;
        if announcement.status != AnnouncementStatus::Published && !viewer.is_some_and(|v| v.role == Role::Admin) {
            warn!("Unpublished announcement requested without admin role");
            return Err(ServiceError::forbidden("Access denied"));
        }
        self.announcement_repo.increment_views(id).await?;
        announcement.engagement.views += 1;
        self.shape(&announcement).await
    }

    #[instrument(skip(self, actor, request), fields(title = %request.title))]
    async fn create_announcement(&self, actor: &User, request: CreateAnnouncementRequest) -> Result<Value, ServiceError> {
        let announcement = request.into_announcement(user_id(actor)?, Utc::now())?;
        let created = self.announcement_repo.insert(announcement).await.map_err(|e| {
            error!("Failed to create announcement: {}", e);
            ServiceError::from(e)
        })?;
        info!(announcement_id = ?created.id, "Announcement created");
        self.shape(&created).await
    }

    async fn editable_announcement(&self, actor: &User, id: &ObjectId) -> Result<Announcement, ServiceError> {
        let announcement = self.find(id).await?;
        ensure_owner_or_admin(actor, &announcement.author)?;
        Ok(announcement)
    }

    #[instrument(skip(self, announcement, request), fields(announcement_id = ?announcement.id))]
    async fn update_announcement(
        &self,
        mut announcement: Announcement,
        request: UpdateAnnouncementRequest,
    ) -> Result<Value, ServiceError> {
        request.apply(&mut announcement, Utc::now())?;
        self.announcement_repo.save(&announcement).await?;
        info!("Announcement updated");
        self.shape(&announcement).await
    }

    #[instrument(skip(self, announcement), fields(announcement_id = ?announcement.id))]
    async fn delete_announcement(&self, announcement: Announcement) -> Result<(), ServiceError> {
        let id = announcement.id.ok_or_else(|| ServiceError::not_found("Announcement not found"))?;
        self.announcement_repo.delete(&id).await?;
        info!("Announcement deleted");
        Ok(())
    }

    #[instrument(skip(self, actor), fields(user_id = ?actor.id))]
    async fn toggle_like(&self, actor: &User, id: &ObjectId) -> Result<LikeState, ServiceError> {
        let mut announcement = self.find(id).await?;
        let liked = announcement.toggle_like(user_id(actor)?, Utc::now());
        self.announcement_repo.save(&announcement).await?;
        let state = LikeState { liked, like_count: announcement.like_count() };
        info!(liked = state.liked, like_count = state.like_count, "Like toggled");
        Ok(state)
    }

    #[instrument(skip(self, actor, content), fields(user_id = ?actor.id))]
    async fn add_comment(&self, actor: &User, id: &ObjectId, content: String) -> Result<Value, ServiceError> {
        let mut announcement = self.find(id).await?;
        let author = user_id(actor)?;
        let comment = announcement.add_comment(author, content.trim().to_string(), Utc::now());
        self.announcement_repo.save(&announcement).await?;
        info!(comment_id = %comment.id, "Comment added");
        self.shape_entry(&comment, author).await
    }

    #[instrument(skip(self, actor, content), fields(user_id = ?actor.id))]
    async fn add_reply(
        &self,
        actor: &User,
        id: &ObjectId,
        comment_id: &ObjectId,
        content: String,
    ) -> Result<Value, ServiceError> {
        let mut announcement = self.find(id).await?;
        let author = user_id(actor)?;
        let reply = announcement.add_reply(comment_id, author, content.trim().to_string(), Utc::now())?;
        self.announcement_repo.save(&announcement).await?;
        info!(reply_id = %reply.id, "Reply added");
        self.shape_entry(&reply, author).await
    }

    #[instrument(skip(self, actor), fields(user_id = ?actor.id))]
    async fn delete_comment(&self, actor: &User, id: &ObjectId, comment_id: &ObjectId) -> Result<(), ServiceError> {
        let mut announcement = self.find(id).await?;
        let comment = announcement
            .find_comment(comment_id)
            .ok_or_else(|| ServiceError::not_found("Comment not found"))?;
        ensure_owner_or_admin(actor, &comment.user)?;
        announcement.remove_comment(comment_id, Utc::now())?;
        self.announcement_repo.save(&announcement).await?;
        info!("Comment deleted");
        Ok(())
    }
}
