use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use chrono::{DateTime, Utc};
use futures::stream::TryStreamExt;
use mongodb::options::FindOptions;
use mongodb::{Collection, Database};
use std::collections::BTreeMap;
use tracing::{debug, error, info, instrument};

use crate::model::job::{ExperienceLevel, Job, JobCategory, JobType};
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use crate::repository::{all_of, contains_ci, count_by, search_any, Page, Paged};
use crate::util::time;

/// Board query: active postings that have not expired at `now`.
#[derive(Debug, Clone, PartialEq)]
pub struct JobFilter {
    pub now: DateTime<Utc>,
    pub job_type: Option<JobType>,
    pub category: Option<JobCategory>,
    pub experience_level: Option<ExperienceLevel>,
    /// City or country substring
    pub location: Option<String>,
    pub remote_only: bool,
    pub search: Option<String>,
}

impl JobFilter {
    pub fn open_at(now: DateTime<Utc>) -> Self {
        JobFilter {
            now,
            job_type: None,
            category: None,
            experience_level: None,
            location: None,
            remote_only: false,
            search: None,
        }
    }

    pub fn to_document(&self) -> RepositoryResult<Document> {
        let mut conditions = vec![
            doc! { "status": "active" },
            doc! { "$or": [
                { "expiresAt": null },
                { "expiresAt": { "$gte": time::format(&self.now) } },
            ] },
        ];
        if let Some(job_type) = self.job_type {
            conditions.push(doc! { "type": bson::to_bson(&job_type)? });
        }
        if let Some(category) = self.category {
            conditions.push(doc! { "category": bson::to_bson(&category)? });
        }
        if let Some(level) = self.experience_level {
            conditions.push(doc! { "experienceLevel": bson::to_bson(&level)? });
        }
        if let Some(location) = &self.location {
            conditions.push(doc! { "$or": [
                { "company.location.city": contains_ci(location) },
                { "company.location.country": contains_ci(location) },
            ] });
        }
        if self.remote_only {
            conditions.push(doc! { "company.location.isRemote": true });
        }
        if let Some(search) = &self.search {
            conditions.push(search_any(&["title", "description", "company.name", "skills"], search));
        }
        Ok(all_of(conditions))
    }
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn insert(&self, job: Job) -> RepositoryResult<Job>;
    async fn save(&self, job: &Job) -> RepositoryResult<()>;
    async fn delete(&self, id: &ObjectId) -> RepositoryResult<()>;
    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<Job>>;
    async fn increment_views(&self, id: &ObjectId) -> RepositoryResult<()>;
    /// Featured first, then newest; applications are left out.
    async fn find_page(&self, filter: &JobFilter, page: Page) -> RepositoryResult<Paged<Job>>;
    async fn find_by_applicant(&self, user_id: &ObjectId) -> RepositoryResult<Vec<Job>>;
    async fn count_active(&self) -> RepositoryResult<u64>;
    async fn count_by_category(&self) -> RepositoryResult<BTreeMap<String, u64>>;
}

pub struct MongoJobRepository {
    collection: Collection<Job>,
}

impl MongoJobRepository {
    pub fn new(db: &Database) -> Self {
        MongoJobRepository { collection: db.collection::<Job>("jobs") }
    }
}

#[async_trait]
impl JobRepository for MongoJobRepository {
    #[instrument(skip(self, job), fields(title = %job.title))]
    async fn insert(&self, mut job: Job) -> RepositoryResult<Job> {
        job.id = Some(ObjectId::new());
        match self.collection.insert_one(&job, None).await {
            Ok(_) => {
                info!("Job inserted");
                Ok(job)
            }
            Err(e) => {
                error!("Failed to insert job: {}", e);
                Err(e.into())
            }
        }
    }

    #[instrument(skip(self, job), fields(id = ?job.id))]
    async fn save(&self, job: &Job) -> RepositoryResult<()> {
        let id = job
            .id
            .ok_or_else(|| RepositoryError::validation("Cannot save a job without an id"))?;
        let result = self.collection.replace_one(doc! { "_id": id }, job, None).await?;
        if result.matched_count == 0 {
            return Err(RepositoryError::not_found(format!("No job found for ID: {}", id)));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &ObjectId) -> RepositoryResult<()> {
        let result = self.collection.delete_one(doc! { "_id": id }, None).await?;
        if result.deleted_count == 0 {
            return Err(RepositoryError::not_found(format!("No job found for ID: {}", id)));
        }
        info!("Job deleted");
        Ok(())
    }

    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<Job>> {
        Ok(self.collection.find_one(doc! { "_id": id }, None).await?)
    }

    async fn increment_views(&self, id: &ObjectId) -> RepositoryResult<()> {
        self.collection
            .update_one(doc! { "_id": id }, doc! { "$inc": { "views": 1_i64 } }, None)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_page(&self, filter: &JobFilter, page: Page) -> RepositoryResult<Paged<Job>> {
        let query = filter.to_document()?;
        let options = FindOptions::builder()
            .sort(doc! { "featured": -1, "createdAt": -1 })
            .projection(doc! { "applications": 0 })
            .skip(page.skip())
            .limit(page.limit as i64)
            .build();
        let items: Vec<Job> = self.collection.find(query.clone(), options).await?.try_collect().await?;
        let total = self.collection.count_documents(query, None).await?;
        debug!(returned = items.len(), total, "Job page fetched");
        Ok(Paged { items, total })
    }

    async fn find_by_applicant(&self, user_id: &ObjectId) -> RepositoryResult<Vec<Job>> {
        let options = FindOptions::builder().sort(doc! { "createdAt": -1 }).build();
        let cursor = self
            .collection
            .find(doc! { "applications.applicant": user_id }, options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count_active(&self) -> RepositoryResult<u64> {
        Ok(self.collection.count_documents(doc! { "status": "active" }, None).await?)
    }

    async fn count_by_category(&self) -> RepositoryResult<BTreeMap<String, u64>> {
        count_by(&self.collection, doc! { "status": "active" }, "category").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_location_does_not_clobber_expiry() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let filter = JobFilter {
            job_type: Some(JobType::PartTime),
            location: Some("Nairobi".into()),
            remote_only: true,
            ..JobFilter::open_at(now)
        };
        let doc = filter.to_document().unwrap();
        let parts = doc.get_array("$and").unwrap();
        assert_eq!(parts.len(), 5);
        assert_eq!(parts[2].as_document().unwrap(), &doc! { "type": "part-time" });
        assert!(parts[1].as_document().unwrap().contains_key("$or"));
        assert!(parts[3].as_document().unwrap().contains_key("$or"));
        assert_eq!(parts[4].as_document().unwrap(), &doc! { "company.location.isRemote": true });
    }
}
