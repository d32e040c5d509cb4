use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::dto::{clean, not_blank};
use crate::model::job::{
    default_expiry, ApplicationMethod, ApplicationStatus, Company, CompanyLocation, ExperienceLevel, Job,
    JobCategory, JobStatus, JobType, Salary,
};

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JobListQuery {
    #[validate(range(min = 1, message = "Page must be a positive integer"))]
    pub page: Option<u64>,
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<u64>,
    #[serde(rename = "type")]
    pub job_type: Option<JobType>,
    pub category: Option<JobCategory>,
    pub experience_level: Option<ExperienceLevel>,
    pub location: Option<String>,
    pub remote: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompanyLocationInput {
    pub city: Option<String>,
    pub country: Option<String>,
    pub is_remote: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CompanyInput {
    #[validate(custom(function = "not_blank", message = "Company name is required"))]
    pub name: String,
    #[validate(url(message = "Company logo must be a valid URL"))]
    pub logo: Option<String>,
    #[validate(url(message = "Company website must be a valid URL"))]
    pub website: Option<String>,
    #[validate(nested)]
    pub location: Option<CompanyLocationInput>,
}

impl CompanyInput {
    fn merge_into(self, company: &mut Company) {
        company.name = self.name.trim().to_string();
        if let Some(logo) = clean(self.logo) {
            company.logo = Some(logo);
        }
        if let Some(website) = clean(self.website) {
            company.website = Some(website);
        }
        if let Some(location) = self.location {
            let target = &mut company.location;
            if let Some(city) = clean(location.city) {
                target.city = Some(city);
            }
            if let Some(country) = clean(location.country) {
                target.country = Some(country);
            }
            if let Some(is_remote) = location.is_remote {
                target.is_remote = is_remote;
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SalaryInput {
    #[validate(range(min = 0.0, message = "Salary cannot be negative"))]
    pub min: Option<f64>,
    #[validate(range(min = 0.0, message = "Salary cannot be negative"))]
    pub max: Option<f64>,
    pub currency: Option<String>,
    pub period: Option<String>,
}

impl From<SalaryInput> for Salary {
    fn from(input: SalaryInput) -> Self {
        Salary {
            min: input.min,
            max: input.max,
            currency: clean(input.currency).map(|c| c.to_uppercase()).unwrap_or_else(|| "USD".to_string()),
            period: clean(input.period),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    #[validate(
        custom(function = "not_blank", message = "Job title is required"),
        length(max = 200, message = "Job title must be at most 200 characters")
    )]
    pub title: String,
    #[validate(nested)]
    pub company: CompanyInput,
    #[validate(custom(function = "not_blank", message = "Job description is required"))]
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub category: JobCategory,
    pub experience_level: ExperienceLevel,
    #[validate(nested)]
    pub salary: Option<SalaryInput>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub application_method: ApplicationMethod,
    pub application_contact: Option<String>,
    #[serde(default, with = "crate::util::time::rfc3339::option")]
    pub application_deadline: Option<DateTime<Utc>>,
    #[serde(default, with = "crate::util::time::rfc3339::option")]
    pub expires_at: Option<DateTime<Utc>>,
    pub featured: Option<bool>,
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CreateJobRequest {
    pub fn into_job(self, poster: ObjectId, now: DateTime<Utc>) -> Job {
        let mut company = Company {
            name: String::new(),
            logo: None,
            website: None,
            location: CompanyLocation::default(),
        };
        self.company.merge_into(&mut company);
        Job {
            id: None,
            title: self.title.trim().to_string(),
            company,
            description: self.description,
            requirements: self.requirements,
            responsibilities: self.responsibilities,
            job_type: self.job_type,
            category: self.category,
            experience_level: self.experience_level,
            salary: self.salary.map(Salary::from),
            skills: self.skills,
            application_method: self.application_method,
            application_contact: clean(self.application_contact),
            application_deadline: self.application_deadline,
            expires_at: Some(self.expires_at.unwrap_or_else(|| default_expiry(now))),
            featured: self.featured.unwrap_or(false),
            posted_by: poster,
            views: 0,
            status: self.status.unwrap_or_default(),
            applications: Vec::new(),
            tags: self.tags,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobRequest {
    #[validate(
        custom(function = "not_blank", message = "Job title cannot be empty"),
        length(max = 200, message = "Job title must be at most 200 characters")
    )]
    pub title: Option<String>,
    #[validate(nested)]
    pub company: Option<CompanyInput>,
    #[validate(custom(function = "not_blank", message = "Job description cannot be empty"))]
    pub description: Option<String>,
    pub requirements: Option<Vec<String>>,
    pub responsibilities: Option<Vec<String>>,
    #[serde(rename = "type")]
    pub job_type: Option<JobType>,
    pub category: Option<JobCategory>,
    pub experience_level: Option<ExperienceLevel>,
    #[validate(nested)]
    pub salary: Option<SalaryInput>,
    pub skills: Option<Vec<String>>,
    pub application_method: Option<ApplicationMethod>,
    pub application_contact: Option<String>,
    #[serde(default, with = "crate::util::time::rfc3339::option")]
    pub application_deadline: Option<DateTime<Utc>>,
    #[serde(default, with = "crate::util::time::rfc3339::option")]
    pub expires_at: Option<DateTime<Utc>>,
    pub featured: Option<bool>,
    pub status: Option<JobStatus>,
    pub tags: Option<Vec<String>>,
}

impl UpdateJobRequest {
    pub fn apply(self, job: &mut Job, now: DateTime<Utc>) {
        if let Some(title) = clean(self.title) {
            job.title = title;
        }
        if let Some(company) = self.company {
            company.merge_into(&mut job.company);
        }
        if let Some(description) = self.description {
            job.description = description;
        }
        if let Some(requirements) = self.requirements {
            job.requirements = requirements;
        }
        if let Some(responsibilities) = self.responsibilities {
            job.responsibilities = responsibilities;
        }
        if let Some(job_type) = self.job_type {
            job.job_type = job_type;
        }
        if let Some(category) = self.category {
            job.category = category;
        }
        if let Some(level) = self.experience_level {
            job.experience_level = level;
        }
        if let Some(salary) = self.salary {
            job.salary = Some(salary.into());
        }
        if let Some(skills) = self.skills {
            job.skills = skills;
        }
        if let Some(method) = self.application_method {
            job.application_method = method;
        }
        if let Some(contact) = clean(self.application_contact) {
            job.application_contact = Some(contact);
        }
        if self.application_deadline.is_some() {
            job.application_deadline = self.application_deadline;
        }
        if self.expires_at.is_some() {
            job.expires_at = self.expires_at;
        }
        if let Some(featured) = self.featured {
            job.featured = featured;
        }
        if let Some(status) = self.status {
            job.status = status;
        }
        if let Some(tags) = self.tags {
            job.tags = tags;
        }
        job.updated_at = now;
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    #[validate(length(max = 2000, message = "Cover letter must be at most 2000 characters"))]
    pub cover_letter: Option<String>,
    #[validate(url(message = "Resume must be a valid URL"))]
    pub resume: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ApplicationStatusRequest {
    pub status: ApplicationStatus,
    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}
