use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use chrono::{DateTime, Utc};
use futures::stream::TryStreamExt;
use mongodb::options::FindOptions;
use mongodb::{Collection, Database};
use std::collections::BTreeMap;
use tracing::{debug, error, info, instrument};

use crate::model::event::{Event, EventStatus, EventType};
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use crate::repository::{all_of, count_by, search_any, Page, Paged};
use crate::util::time;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    pub public_only: bool,
    pub status: Option<EventStatus>,
    pub event_type: Option<EventType>,
    /// Only events starting at or after this instant
    pub starts_after: Option<DateTime<Utc>>,
    pub search: Option<String>,
}

impl EventFilter {
    pub fn to_document(&self) -> RepositoryResult<Document> {
        let mut conditions = Vec::new();
        if self.public_only {
            conditions.push(doc! { "isPublic": true });
        }
        if let Some(status) = self.status {
            conditions.push(doc! { "status": bson::to_bson(&status)? });
        }
        if let Some(event_type) = self.event_type {
            conditions.push(doc! { "type": bson::to_bson(&event_type)? });
        }
        if let Some(after) = self.starts_after {
            conditions.push(doc! { "date.start": { "$gte": time::format(&after) } });
        }
        if let Some(search) = &self.search {
            conditions.push(search_any(&["title", "description", "tags"], search));
        }
        Ok(all_of(conditions))
    }
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn insert(&self, event: Event) -> RepositoryResult<Event>;
    async fn save(&self, event: &Event) -> RepositoryResult<()>;
    async fn delete(&self, id: &ObjectId) -> RepositoryResult<()>;
    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<Event>>;
    /// Soonest first
    async fn find_page(&self, filter: &EventFilter, page: Page) -> RepositoryResult<Paged<Event>>;
    async fn find_all(&self, filter: &EventFilter) -> RepositoryResult<Vec<Event>>;
    async fn count(&self, filter: &EventFilter) -> RepositoryResult<u64>;
    async fn count_by_type(&self) -> RepositoryResult<BTreeMap<String, u64>>;
    /// Most recently created
    async fn recent(&self, limit: u64) -> RepositoryResult<Vec<Event>>;
}

pub struct MongoEventRepository {
    collection: Collection<Event>,
}

impl MongoEventRepository {
    pub fn new(db: &Database) -> Self {
        MongoEventRepository { collection: db.collection::<Event>("events") }
    }
}

#[async_trait]
impl EventRepository for MongoEventRepository {
    #[instrument(skip(self, event), fields(title = %event.title))]
    async fn insert(&self, mut event: Event) -> RepositoryResult<Event> {
        event.id = Some(ObjectId::new());
        match self.collection.insert_one(&event, None).await {
            Ok(_) => {
                info!("Event inserted");
                Ok(event)
            }
            Err(e) => {
                error!("Failed to insert event: {}", e);
                Err(e.into())
            }
        }
    }

    #[instrument(skip(self, event), fields(id = ?event.id))]
    async fn save(&self, event: &Event) -> RepositoryResult<()> {
        let id = event
            .id
            .ok_or_else(|| RepositoryError::validation("Cannot save an event without an id"))?;
        let result = self.collection.replace_one(doc! { "_id": id }, event, None).await?;
        if result.matched_count == 0 {
            return Err(RepositoryError::not_found(format!("No event found for ID: {}", id)));
        }
        debug!("Event saved");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &ObjectId) -> RepositoryResult<()> {
        let result = self.collection.delete_one(doc! { "_id": id }, None).await?;
        if result.deleted_count == 0 {
            error!("No event found to delete for ID: {}", id);
            return Err(RepositoryError::not_found(format!("No event found for ID: {}", id)));
        }
        info!("Event deleted");
        Ok(())
    }

    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<Event>> {
        Ok(self.collection.find_one(doc! { "_id": id }, None).await?)
    }

    #[instrument(skip(self))]
    async fn find_page(&self, filter: &EventFilter, page: Page) -> RepositoryResult<Paged<Event>> {
        let query = filter.to_document()?;
        let options = FindOptions::builder()
            .sort(doc! { "date.start": 1 })
            .skip(page.skip())
            .limit(page.limit as i64)
            .build();
        let items: Vec<Event> = self.collection.find(query.clone(), options).await?.try_collect().await?;
        let total = self.collection.count_documents(query, None).await?;
        debug!(returned = items.len(), total, "Event page fetched");
        Ok(Paged { items, total })
    }

    async fn find_all(&self, filter: &EventFilter) -> RepositoryResult<Vec<Event>> {
        let options = FindOptions::builder().sort(doc! { "date.start": 1 }).build();
        let cursor = self.collection.find(filter.to_document()?, options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count(&self, filter: &EventFilter) -> RepositoryResult<u64> {
        Ok(self.collection.count_documents(filter.to_document()?, None).await?)
    }

    async fn count_by_type(&self) -> RepositoryResult<BTreeMap<String, u64>> {
        count_by(&self.collection, Document::new(), "type").await
    }

    async fn recent(&self, limit: u64) -> RepositoryResult<Vec<Event>> {
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1 })
            .limit(limit as i64)
            .build();
        Ok(self.collection.find(None, options).await?.try_collect().await?)
    }
}
