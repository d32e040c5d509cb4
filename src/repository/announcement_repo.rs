use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use chrono::{DateTime, Utc};
use futures::stream::TryStreamExt;
use mongodb::options::FindOptions;
use mongodb::{Collection, Database};
use std::collections::BTreeMap;
use tracing::{debug, error, info, instrument};

use crate::model::announcement::{Announcement, AnnouncementCategory, Priority};
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use crate::repository::{all_of, count_by, search_any, Page, Paged};
use crate::util::time;

/// Public listing query; always restricted to what is live at `now`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnouncementFilter {
    pub now: DateTime<Utc>,
    pub category: Option<AnnouncementCategory>,
    pub priority: Option<Priority>,
    pub search: Option<String>,
}

impl AnnouncementFilter {
    pub fn live_at(now: DateTime<Utc>) -> Self {
        AnnouncementFilter { now, category: None, priority: None, search: None }
    }

    pub fn to_document(&self) -> RepositoryResult<Document> {
        let now = time::format(&self.now);
        let mut conditions = vec![
            doc! { "status": "published" },
            doc! { "$or": [
                { "targetAudience.isPublic": true },
                { "publishDate": { "$lte": now.as_str() } },
            ] },
            doc! { "$or": [
                { "expiryDate": null },
                { "expiryDate": { "$gte": now.as_str() } },
            ] },
        ];
        if let Some(category) = self.category {
            conditions.push(doc! { "category": bson::to_bson(&category)? });
        }
        if let Some(priority) = self.priority {
            conditions.push(doc! { "priority": bson::to_bson(&priority)? });
        }
        if let Some(search) = &self.search {
            conditions.push(search_any(&["title", "content", "tags"], search));
        }
        Ok(all_of(conditions))
    }
}

#[async_trait]
pub trait AnnouncementRepository: Send + Sync {
    async fn insert(&self, announcement: Announcement) -> RepositoryResult<Announcement>;
    async fn save(&self, announcement: &Announcement) -> RepositoryResult<()>;
    async fn delete(&self, id: &ObjectId) -> RepositoryResult<()>;
    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<Announcement>>;
    async fn increment_views(&self, id: &ObjectId) -> RepositoryResult<()>;
    /// Pinned first, then newest publish date
    async fn find_page(&self, filter: &AnnouncementFilter, page: Page) -> RepositoryResult<Paged<Announcement>>;
    async fn count_published(&self) -> RepositoryResult<u64>;
    async fn count_by_category(&self) -> RepositoryResult<BTreeMap<String, u64>>;
}

pub struct MongoAnnouncementRepository {
    collection: Collection<Announcement>,
}

impl MongoAnnouncementRepository {
    pub fn new(db: &Database) -> Self {
        MongoAnnouncementRepository { collection: db.collection::<Announcement>("announcements") }
    }
}

#[async_trait]
impl AnnouncementRepository for MongoAnnouncementRepository {
    #[instrument(skip(self, announcement), fields(title = %announcement.title))]
    async fn insert(&self, mut announcement: Announcement) -> RepositoryResult<Announcement> {
        announcement.id = Some(ObjectId::new());
        match self.collection.insert_one(&announcement, None).await {
            Ok(_) => {
                info!("Announcement inserted");
                Ok(announcement)
            }
            Err(e) => {
                error!("Failed to insert announcement: {}", e);
                Err(e.into())
            }
        }
    }

    #[instrument(skip(self, announcement), fields(id = ?announcement.id))]
    async fn save(&self, announcement: &Announcement) -> RepositoryResult<()> {
        let id = announcement
            .id
            .ok_or_else(|| RepositoryError::validation("Cannot save an announcement without an id"))?;
        let result = self.collection.replace_one(doc! { "_id": id }, announcement, None).await?;
        if result.matched_count == 0 {
            return Err(RepositoryError::not_found(format!("No announcement found for ID: {}", id)));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &ObjectId) -> RepositoryResult<()> {
        let result = self.collection.delete_one(doc! { "_id": id }, None).await?;
        if result.deleted_count == 0 {
            return Err(RepositoryError::not_found(format!("No announcement found for ID: {}", id)));
        }
        info!("Announcement deleted");
        Ok(())
    }

    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<Announcement>> {
        Ok(self.collection.find_one(doc! { "_id": id }, None).await?)
    }

    async fn increment_views(&self, id: &ObjectId) -> RepositoryResult<()> {
        self.collection
            .update_one(doc! { "_id": id }, doc! { "$inc": { "engagement.views": 1_i64 } }, None)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_page(&self, filter: &AnnouncementFilter, page: Page) -> RepositoryResult<Paged<Announcement>> {
        let query = filter.to_document()?;
        let options = FindOptions::builder()
            .sort(doc! { "isPinned": -1, "publishDate": -1 })
            .skip(page.skip())
            .limit(page.limit as i64)
            .build();
        let items: Vec<Announcement> = self.collection.find(query.clone(), options).await?.try_collect().await?;
        let total = self.collection.count_documents(query, None).await?;
        debug!(returned = items.len(), total, "Announcement page fetched");
        Ok(Paged { items, total })
    }

    async fn count_published(&self) -> RepositoryResult<u64> {
        Ok(self.collection.count_documents(doc! { "status": "published" }, None).await?)
    }

    async fn count_by_category(&self) -> RepositoryResult<BTreeMap<String, u64>> {
        count_by(&self.collection, doc! { "status": "published" }, "category").await
    }
}
