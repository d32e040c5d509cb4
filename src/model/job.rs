use bson::oid::ObjectId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::DomainError;

/// Postings without an explicit expiry close after this many days.
pub const DEFAULT_POSTING_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Internship,
    Volunteer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobCategory {
    Technology,
    Healthcare,
    Finance,
    Education,
    Marketing,
    Sales,
    Operations,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Entry,
    Mid,
    Senior,
    Executive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationMethod {
    Email,
    Website,
    Phone,
    InPerson,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Active,
    Closed,
    Draft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Applied,
    Reviewed,
    Shortlisted,
    Interviewed,
    Offered,
    Rejected,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyLocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub is_remote: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default)]
    pub location: CompanyLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Salary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub applicant: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume: Option<String>,
    #[serde(default)]
    pub status: ApplicationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(with = "crate::util::time::rfc3339")]
    pub applied_at: DateTime<Utc>,
    #[serde(with = "crate::util::time::rfc3339")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub company: Company,
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub category: JobCategory,
    pub experience_level: ExperienceLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<Salary>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub application_method: ApplicationMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "crate::util::time::rfc3339::option")]
    pub application_deadline: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "crate::util::time::rfc3339::option")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub featured: bool,
    pub posted_by: ObjectId,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub applications: Vec<Application>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(with = "crate::util::time::rfc3339")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::util::time::rfc3339")]
    pub updated_at: DateTime<Utc>,
}

pub fn default_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(DEFAULT_POSTING_DAYS)
}

impl Job {
    pub fn is_poster(&self, user_id: &ObjectId) -> bool {
        &self.posted_by == user_id
    }

    pub fn application_for(&self, user_id: &ObjectId) -> Option<&Application> {
        self.applications.iter().find(|a| &a.applicant == user_id)
    }

    /// Checks status, deadline and duplicates before appending an `applied` entry.
    pub fn apply(
        &mut self,
        applicant: ObjectId,
        cover_letter: Option<String>,
        resume: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Application, DomainError> {
        if self.status != JobStatus::Active {
            return Err(DomainError::JobNotActive);
        }
        if matches!(self.application_deadline, Some(deadline) if now > deadline) {
            return Err(DomainError::ApplicationDeadlinePassed);
        }
        if self.application_for(&applicant).is_some() {
            return Err(DomainError::AlreadyApplied);
        }

        let application = Application {
            id: ObjectId::new(),
            applicant,
            cover_letter,
            resume,
            status: ApplicationStatus::Applied,
            notes: None,
            applied_at: now,
            updated_at: now,
        };
        self.applications.push(application.clone());
        self.updated_at = now;
        Ok(application)
    }

    /// Any status may follow any other; notes are only replaced when given.
    pub fn update_application_status(
        &mut self,
        application_id: &ObjectId,
        status: ApplicationStatus,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Application, DomainError> {
        let application = self
            .applications
            .iter_mut()
            .find(|a| &a.id == application_id)
            .ok_or(DomainError::ApplicationNotFound)?;
        application.status = status;
        if let Some(notes) = notes.filter(|n| !n.is_empty()) {
            application.notes = Some(notes);
        }
        application.updated_at = now;
        let updated = application.clone();
        self.updated_at = now;
        Ok(updated)
    }

    pub fn referenced_user_ids(&self) -> Vec<ObjectId> {
        let mut ids = vec![self.posted_by];
        ids.extend(self.applications.iter().map(|a| a.applicant));
        ids
    }
}
