use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{error, info, instrument, warn};

use crate::dto::job_dto::{ApplicationStatusRequest, ApplyRequest, CreateJobRequest, JobListQuery, UpdateJobRequest};
use crate::dto::pagination::{page_of, Pagination, DEFAULT_LIMIT};
use crate::dto::clean;
use crate::model::job::{Job, JobStatus};
use crate::model::user::{Role, User, UserSummary};
use crate::repository::{JobFilter, JobRepository, UserRepository};
use crate::service::{ensure_owner_or_admin, user_id, user_lookup};
use crate::util::error::ServiceError;
use crate::util::json::{normalize_object_ids, populate, strip, to_api_value};

#[async_trait]
pub trait JobService: Send + Sync {
    /// Open postings, featured first; applications never included
    async fn list_jobs(&self, query: JobListQuery, now: DateTime<Utc>) -> Result<Value, ServiceError>;
    async fn my_applications(&self, actor: &User) -> Result<Value, ServiceError>;
    /// Counts a view; applications only for the poster and admins.
    async fn get_job(&self, viewer: Option<&User>, id: &ObjectId) -> Result<Value, ServiceError>;
    async fn create_job(&self, actor: &User, request: CreateJobRequest) -> Result<Value, ServiceError>;
    /// Poster or admin, else 403
    async fn managed_job(&self, actor: &User, id: &ObjectId) -> Result<Job, ServiceError>;
    async fn update_job(&self, job: Job, request: UpdateJobRequest) -> Result<Value, ServiceError>;
    async fn delete_job(&self, job: Job) -> Result<(), ServiceError>;
    async fn apply(&self, actor: &User, id: &ObjectId, request: ApplyRequest) -> Result<Value, ServiceError>;
    async fn applications(&self, job: Job) -> Result<Value, ServiceError>;
    async fn update_application(
        &self,
        job: Job,
        application_id: &ObjectId,
        request: ApplicationStatusRequest,
    ) -> Result<Value, ServiceError>;
}

pub struct JobServiceImpl {
    pub job_repo: Arc<dyn JobRepository>,
    pub user_repo: Arc<dyn UserRepository>,
}

impl JobServiceImpl {
    pub fn new(job_repo: Arc<dyn JobRepository>, user_repo: Arc<dyn UserRepository>) -> Self {
        Self { job_repo, user_repo }
    }

    async fn find(&self, id: &ObjectId) -> Result<Job, ServiceError> {
        self.job_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Job not found"))
    }

    async fn shape(&self, job: &Job, with_applications: bool) -> Result<Value, ServiceError> {
        let ids = if with_applications { job.referenced_user_ids() } else { vec![job.posted_by] };
        let lookup = user_lookup(self.user_repo.as_ref(), ids, UserSummary::contact).await?;
        let mut value = to_api_value(job)?;
        populate(&mut value, &["postedBy"], &lookup);
        if with_applications {
            populate(&mut value, &["applications", "applicant"], &lookup);
        } else {
            strip(&mut value, "applications");
        }
        Ok(value)
    }
}

#[async_trait]
impl JobService for JobServiceImpl {
    #[instrument(skip(self))]
    async fn list_jobs(&self, query: JobListQuery, now: DateTime<Utc>) -> Result<Value, ServiceError> {
        let page = page_of(query.page, query.limit, DEFAULT_LIMIT);
        let filter = JobFilter {
            job_type: query.job_type,
            category: query.category,
            experience_level: query.experience_level,
            location: clean(query.location),
            remote_only: query.remote == Some(true),
            search: clean(query.search),
            ..JobFilter::open_at(now)
        };
        let found = self.job_repo.find_page(&filter, page).await.map_err(|e| {
            error!("Failed to list jobs: {}", e);
            ServiceError::from(e)
        })?;

        let posters = found.items.iter().map(|j| j.posted_by).collect();
        let lookup = user_lookup(self.user_repo.as_ref(), posters, UserSummary::brief).await?;
        let mut jobs = to_api_value(&found.items)?;
        strip(&mut jobs, "applications");
        populate(&mut jobs, &["postedBy"], &lookup);
        info!(count = found.items.len(), total = found.total, "Listed jobs");
        Ok(json!({ "jobs": jobs, "pagination": Pagination::new(page, found.total) }))
    }

    #[instrument(skip(self, actor), fields(user_id = ?actor.id))]
    async fn my_applications(&self, actor: &User) -> Result<Value, ServiceError> {
        let me = user_id(actor)?;
        let jobs = self.job_repo.find_by_applicant(&me).await?;
        let posters = jobs.iter().map(|j| j.posted_by).collect();
        let lookup = user_lookup(self.user_repo.as_ref(), posters, UserSummary::brief).await?;

        let mut entries = Vec::with_capacity(jobs.len());
        for job in &jobs {
            let Some(application) = job.application_for(&me) else {
                continue;
            };
            let mut entry = json!({
                "job": {
                    "_id": job.id,
                    "title": job.title,
                    "company": job.company,
                    "type": job.job_type,
                    "postedBy": job.posted_by,
                },
                "application": application,
            });
            normalize_object_ids(&mut entry);
            populate(&mut entry, &["job", "postedBy"], &lookup);
            entries.push(entry);
        }
        Ok(Value::Array(entries))
    }

    #[instrument(skip(self, viewer))]
    async fn get_job(&self, viewer: Option<&User>, id: &ObjectId) -> Result<Value, ServiceError> {
        let mut job = self.find(id).await?;
        if job.status != JobStatus::Active {
            return Err(ServiceError::not_found("Job not available"));
        }
        self.job_repo.increment_views(id).await?;
        job.views += 1;
        let privileged = viewer.is_some_and(|v| v.role == Role::Admin || v.id.as_ref().is_some_and(|me| job.is_poster(me)));
        self.shape(&job, privileged).await
    }

    #[instrument(skip(self, actor, request), fields(title = %request.title))]
    async fn create_job(&self, actor: &User, request: CreateJobRequest) -> Result<Value, ServiceError> {
        let job = request.into_job(user_id(actor)?, Utc::now());
        let created = self.job_repo.insert(job).await.map_err(|e| {
            error!("Failed to post job: {}", e);
            ServiceError::from(e)
        })?;
        info!(job_id = ?created.id, "Job posted");
        self.shape(&created, false).await
    }

    async fn managed_job(&self, actor: &User, id: &ObjectId) -> Result<Job, ServiceError> {
        let job = self.find(id).await?;
        ensure_owner_or_admin(actor, &job.posted_by)?;
        Ok(job)
    }

    #[instrument(skip(self, job, request), fields(job_id = ?job.id))]
    async fn update_job(&self, mut job: Job, request: UpdateJobRequest) -> Result<Value, ServiceError> {
        request.apply(&mut job, Utc::now());
        self.job_repo.save(&job).await?;
        info!("Job updated");
        self.shape(&job, false).await
    }

    #[instrument(skip(self, job), fields(job_id = ?job.id))]
    async fn delete_job(&self, job: Job) -> Result<(), ServiceError> {
        let id = job.id.ok_or_else(|| ServiceError::not_found("Job not found"))?;
        self.job_repo.delete(&id).await?;
        info!("Job deleted");
        Ok(())
    }

    #[instrument(skip(self, actor, request), fields(user_id = ?actor.id))]
    async fn apply(&self, actor: &User, id: &ObjectId, request: ApplyRequest) -> Result<Value, ServiceError> {
        let mut job = self.find(id).await?;
        let application = job
            .apply(user_id(actor)?, clean(request.cover_letter), clean(request.resume), Utc::now())
            .map_err(|e| {
                warn!("Application rejected: {}", e);
                ServiceError::from(e)
            })?;
        self.job_repo.save(&job).await?;
        info!(application_id = %application.id, "Application submitted");
        Ok(to_api_value(&application)?)
    }

    #[instrument(skip(self, job), fields(job_id = ?job.id))]
    async fn applications(&self, job: Job) -> Result<Value, ServiceError> {
        let ids = job.applications.iter().map(|a| a.applicant).collect();
        let lookup = user_lookup(self.user_repo.as_ref(), ids, UserSummary::contact).await?;
        let mut applications = to_api_value(&job.applications)?;
        populate(&mut applications, &["applicant"], &lookup);
        Ok(json!({ "applications": applications, "totalCount": job.applications.len() }))
    }

    #[instrument(skip(self, job, request), fields(job_id = ?job.id, status = ?request.status))]
    async fn update_application(
        &self,
        mut job: Job,
        application_id: &ObjectId,
        request: ApplicationStatusRequest,
    ) -> Result<Value, ServiceError> {
        let updated = job.update_application_status(application_id, request.status, request.notes, Utc::now())?;
        self.job_repo.save(&job).await?;
        info!("Application status updated");
        Ok(to_api_value(&updated)?)
    }
}
