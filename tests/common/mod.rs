#![allow(dead_code)]

//! In-memory repositories and request helpers shared by the API tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, OnceLock};

use alumni_backend::app::{build_router, AppState, Repositories};
use alumni_backend::config::{JwtConfig, SiteSettings};
use alumni_backend::model::announcement::{Announcement, AnnouncementStatus};
use alumni_backend::model::event::Event;
use alumni_backend::model::job::{Job, JobStatus};
use alumni_backend::model::payment::Payment;
use alumni_backend::model::user::{Role, User};
use alumni_backend::repository::repository_error::RepositoryResult;
use alumni_backend::repository::{
    AnnouncementFilter, AnnouncementRepository, DateRange, EventFilter, EventRepository, JobFilter, JobRepository,
    MonthlyRevenue, Page, Paged, PaymentFilter, PaymentRepository, RepositoryError, UserFilter, UserRepository,
};
use alumni_backend::service::{BulkResult, NotificationService};
use alumni_backend::util::jwt::{JwtTokenUtils, JwtTokenUtilsImpl};
use alumni_backend::util::password::{PasswordUtils, PasswordUtilsImpl};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tower::ServiceExt;

pub const PASSWORD: &str = "secret123";

/// Hashing is slow, so every seeded account shares one hash of [`PASSWORD`].
fn password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| PasswordUtilsImpl::hash_password(PASSWORD).unwrap()).clone()
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.trim().to_lowercase()))
}

fn in_range(at: DateTime<Utc>, range: &Option<DateRange>) -> bool {
    range.as_ref().map_or(true, |r| at >= r.start && at <= r.end)
}

fn enum_key<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_value(value).unwrap().as_str().unwrap_or_default().to_string()
}

fn paginate<T: Clone>(items: Vec<T>, page: Page) -> Paged<T> {
    let total = items.len() as u64;
    let items = items.into_iter().skip(page.skip() as usize).take(page.limit as usize).collect();
    Paged { items, total }
}

fn tally(keys: impl Iterator<Item = String>) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

#[derive(Default)]
pub struct MemoryUsers {
    pub items: Mutex<Vec<User>>,
}

impl MemoryUsers {
    fn matches(filter: &UserFilter, user: &User) -> bool {
        filter.active.map_or(true, |a| user.is_active == a)
            && (filter.roles.is_empty() || filter.roles.contains(&user.role))
            && (filter.graduation_years.is_empty()
                || user.profile.graduation_year.is_some_and(|y| filter.graduation_years.contains(&y)))
            && (filter.locations.is_empty()
                || filter.locations.iter().any(|l| {
                    contains_ci(user.profile.location.as_ref().and_then(|loc| loc.city.as_deref()), l)
                }))
            && filter.profession.as_ref().map_or(true, |p| contains_ci(user.profile.profession.as_deref(), p))
            && filter.search.as_ref().map_or(true, |s| {
                contains_ci(Some(&user.first_name), s)
                    || contains_ci(Some(&user.last_name), s)
                    || contains_ci(Some(&user.email), s)
                    || contains_ci(user.profile.profession.as_deref(), s)
                    || contains_ci(user.profile.company.as_deref(), s)
            })
            && in_range(user.created_at, &filter.created)
    }

    fn matching(&self, filter: &UserFilter) -> Vec<User> {
        let mut users: Vec<User> = self.items.lock().unwrap().iter().filter(|u| Self::matches(filter, u)).cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        users
    }
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn insert(&self, mut user: User) -> RepositoryResult<User> {
        let mut items = self.items.lock().unwrap();
        let taken = items
            .iter()
            .any(|u| u.email == user.email || (user.phone.is_some() && u.phone == user.phone));
        if taken {
            return Err(RepositoryError::already_exists("duplicate email or phone"));
        }
        user.id.get_or_insert_with(ObjectId::new);
        items.push(user.clone());
        Ok(user)
    }

    async fn save(&self, user: &User) -> RepositoryResult<()> {
        let mut items = self.items.lock().unwrap();
        let slot = items
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| RepositoryError::not_found("user"))?;
        *slot = user.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<User>> {
        Ok(self.items.lock().unwrap().iter().find(|u| u.id.as_ref() == Some(id)).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let email = email.trim().to_lowercase();
        Ok(self.items.lock().unwrap().iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_phone(&self, phone: &str) -> RepositoryResult<Option<User>> {
        Ok(self.items.lock().unwrap().iter().find(|u| u.phone.as_deref() == Some(phone)).cloned())
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> RepositoryResult<Vec<User>> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.id.is_some_and(|id| ids.contains(&id)))
            .cloned()
            .collect())
    }

    async fn find_page(&self, filter: &UserFilter, page: Page) -> RepositoryResult<Paged<User>> {
        Ok(paginate(self.matching(filter), page))
    }

    async fn find_all(&self, filter: &UserFilter) -> RepositoryResult<Vec<User>> {
        Ok(self.matching(filter))
    }

    async fn count(&self, filter: &UserFilter) -> RepositoryResult<u64> {
        Ok(self.matching(filter).len() as u64)
    }

    async fn count_by_role(&self) -> RepositoryResult<BTreeMap<String, u64>> {
        let users = self.matching(&UserFilter::active());
        Ok(tally(users.iter().map(|u| u.role.as_str().to_string())))
    }

    async fn graduation_years(&self) -> RepositoryResult<Vec<i32>> {
        let years: BTreeSet<i32> = self
            .matching(&UserFilter::active())
            .iter()
            .filter_map(|u| u.profile.graduation_year)
            .collect();
        Ok(years.into_iter().rev().collect())
    }

    async fn cities(&self) -> RepositoryResult<Vec<String>> {
        let cities: BTreeSet<String> = self
            .matching(&UserFilter::active())
            .iter()
            .filter_map(|u| u.profile.location.as_ref().and_then(|l| l.city.clone()))
            .filter(|c| !c.trim().is_empty())
            .collect();
        Ok(cities.into_iter().collect())
    }
}

#[derive(Default)]
pub struct MemoryEvents {
    pub items: Mutex<Vec<Event>>,
}

impl MemoryEvents {
    fn matching(&self, filter: &EventFilter) -> Vec<Event> {
        let mut events: Vec<Event> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|e| {
                (!filter.public_only || e.is_public)
                    && filter.status.map_or(true, |s| e.status == s)
                    && filter.event_type.map_or(true, |t| e.event_type == t)
                    && filter.starts_after.map_or(true, |after| e.date.start >= after)
                    && filter.search.as_ref().map_or(true, |s| {
                        contains_ci(Some(&e.title), s)
                            || contains_ci(Some(&e.description), s)
                            || e.tags.iter().any(|t| contains_ci(Some(t), s))
                    })
            })
            .cloned()
            .collect();
        events.sort_by(|a, b| a.date.start.cmp(&b.date.start));
        events
    }
}

#[async_trait]
impl EventRepository for MemoryEvents {
    async fn insert(&self, mut event: Event) -> RepositoryResult<Event> {
        event.id.get_or_insert_with(ObjectId::new);
        self.items.lock().unwrap().push(event.clone());
        Ok(event)
    }

    async fn save(&self, event: &Event) -> RepositoryResult<()> {
        let mut items = self.items.lock().unwrap();
        let slot = items
            .iter_mut()
            .find(|e| e.id == event.id)
            .ok_or_else(|| RepositoryError::not_found("event"))?;
        *slot = event.clone();
        Ok(())
    }

    async fn delete(&self, id: &ObjectId) -> RepositoryResult<()> {
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|e| e.id.as_ref() != Some(id));
        if items.len() == before {
            return Err(RepositoryError::not_found("event"));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<Event>> {
        Ok(self.items.lock().unwrap().iter().find(|e| e.id.as_ref() == Some(id)).cloned())
    }

    async fn find_page(&self, filter: &EventFilter, page: Page) -> RepositoryResult<Paged<Event>> {
        Ok(paginate(self.matching(filter), page))
    }

    async fn find_all(&self, filter: &EventFilter) -> RepositoryResult<Vec<Event>> {
        Ok(self.matching(filter))
    }

    async fn count(&self, filter: &EventFilter) -> RepositoryResult<u64> {
        Ok(self.matching(filter).len() as u64)
    }

    async fn count_by_type(&self) -> RepositoryResult<BTreeMap<String, u64>> {
        Ok(tally(self.items.lock().unwrap().iter().map(|e| enum_key(&e.event_type))))
    }

    async fn recent(&self, limit: u64) -> RepositoryResult<Vec<Event>> {
        let mut events = self.items.lock().unwrap().clone();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        events.truncate(limit as usize);
        Ok(events)
    }
}

#[derive(Default)]
pub struct MemoryAnnouncements {
    pub items: Mutex<Vec<Announcement>>,
}

#[async_trait]
impl AnnouncementRepository for MemoryAnnouncements {
    async fn insert(&self, mut announcement: Announcement) -> RepositoryResult<Announcement> {
        announcement.id.get_or_insert_with(ObjectId::new);
        self.items.lock().unwrap().push(announcement.clone());
        Ok(announcement)
    }

    async fn save(&self, announcement: &Announcement) -> RepositoryResult<()> {
        let mut items = self.items.lock().unwrap();
        let slot = items
            .iter_mut()
            .find(|a| a.id == announcement.id)
            .ok_or_else(|| RepositoryError::not_found("announcement"))?;
        *slot = announcement.clone();
        Ok(())
    }

    async fn delete(&self, id: &ObjectId) -> RepositoryResult<()> {
        self.items.lock().unwrap().retain(|a| a.id.as_ref() != Some(id));
        Ok(())
    }

    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<Announcement>> {
        Ok(self.items.lock().unwrap().iter().find(|a| a.id.as_ref() == Some(id)).cloned())
    }

    async fn increment_views(&self, id: &ObjectId) -> RepositoryResult<()> {
        if let Some(a) = self.items.lock().unwrap().iter_mut().find(|a| a.id.as_ref() == Some(id)) {
            a.engagement.views += 1;
        }
        Ok(())
    }

    async fn find_page(&self, filter: &AnnouncementFilter, page: Page) -> RepositoryResult<Paged<Announcement>> {
        let mut live: Vec<Announcement> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|a| {
                a.is_live(filter.now)
                    && filter.category.map_or(true, |c| a.category == c)
                    && filter.priority.map_or(true, |p| a.priority == p)
                    && filter.search.as_ref().map_or(true, |s| {
                        contains_ci(Some(&a.title), s) || contains_ci(Some(&a.content), s)
                    })
            })
            .cloned()
            .collect();
        live.sort_by(|a, b| b.is_pinned.cmp(&a.is_pinned).then(b.publish_date.cmp(&a.publish_date)));
        Ok(paginate(live, page))
    }

    async fn count_published(&self) -> RepositoryResult<u64> {
        let items = self.items.lock().unwrap();
        Ok(items.iter().filter(|a| a.status == AnnouncementStatus::Published).count() as u64)
    }

    async fn count_by_category(&self) -> RepositoryResult<BTreeMap<String, u64>> {
        let items = self.items.lock().unwrap();
        Ok(tally(
            items
                .iter()
                .filter(|a| a.status == AnnouncementStatus::Published)
                .map(|a| enum_key(&a.category)),
        ))
    }
}

#[derive(Default)]
pub struct MemoryJobs {
    pub items: Mutex<Vec<Job>>,
}

#[async_trait]
impl JobRepository for MemoryJobs {
    async fn insert(&self, mut job: Job) -> RepositoryResult<Job> {
        job.id.get_or_insert_with(ObjectId::new);
        self.items.lock().unwrap().push(job.clone());
        Ok(job)
    }

    async fn save(&self, job: &Job) -> RepositoryResult<()> {
        let mut items = self.items.lock().unwrap();
        let slot = items
            .iter_mut()
            .find(|j| j.id == job.id)
            .ok_or_else(|| RepositoryError::not_found("job"))?;
        *slot = job.clone();
        Ok(())
    }

    async fn delete(&self, id: &ObjectId) -> RepositoryResult<()> {
        self.items.lock().unwrap().retain(|j| j.id.as_ref() != Some(id));
        Ok(())
    }

    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<Job>> {
        Ok(self.items.lock().unwrap().iter().find(|j| j.id.as_ref() == Some(id)).cloned())
    }

    async fn increment_views(&self, id: &ObjectId) -> RepositoryResult<()> {
        if let Some(j) = self.items.lock().unwrap().iter_mut().find(|j| j.id.as_ref() == Some(id)) {
            j.views += 1;
        }
        Ok(())
    }

    async fn find_page(&self, filter: &JobFilter, page: Page) -> RepositoryResult<Paged<Job>> {
        let mut open: Vec<Job> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|j| {
                j.status == JobStatus::Active
                    && j.expires_at.map_or(true, |at| at >= filter.now)
                    && filter.job_type.map_or(true, |t| j.job_type == t)
                    && filter.category.map_or(true, |c| j.category == c)
                    && filter.experience_level.map_or(true, |l| j.experience_level == l)
                    && filter.location.as_ref().map_or(true, |l| {
                        contains_ci(j.company.location.city.as_deref(), l)
                            || contains_ci(j.company.location.country.as_deref(), l)
                    })
                    && (!filter.remote_only || j.company.location.is_remote)
                    && filter.search.as_ref().map_or(true, |s| {
                        contains_ci(Some(&j.title), s)
                            || contains_ci(Some(&j.description), s)
                            || contains_ci(Some(&j.company.name), s)
                            || j.skills.iter().any(|k| contains_ci(Some(k), s))
                    })
            })
            .cloned()
            .map(|mut j| {
                j.applications.clear();
                j
            })
            .collect();
        open.sort_by(|a, b| b.featured.cmp(&a.featured).then(b.created_at.cmp(&a.created_at)));
        Ok(paginate(open, page))
    }

    async fn find_by_applicant(&self, user_id: &ObjectId) -> RepositoryResult<Vec<Job>> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|j| j.application_for(user_id).is_some())
            .cloned()
            .collect())
    }

    async fn count_active(&self) -> RepositoryResult<u64> {
        Ok(self.items.lock().unwrap().iter().filter(|j| j.status == JobStatus::Active).count() as u64)
    }

    async fn count_by_category(&self) -> RepositoryResult<BTreeMap<String, u64>> {
        let items = self.items.lock().unwrap();
        Ok(tally(items.iter().filter(|j| j.status == JobStatus::Active).map(|j| enum_key(&j.category))))
    }
}

#[derive(Default)]
pub struct MemoryPayments {
    pub items: Mutex<Vec<Payment>>,
}

impl MemoryPayments {
    fn matching(&self, filter: &PaymentFilter) -> Vec<Payment> {
        let mut payments: Vec<Payment> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|p| {
                filter.status.map_or(true, |s| p.status == s)
                    && filter.payment_type.map_or(true, |t| p.payment_type == t)
                    && in_range(p.created_at, &filter.created)
            })
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        payments
    }
}

#[async_trait]
impl PaymentRepository for MemoryPayments {
    async fn insert(&self, mut payment: Payment) -> RepositoryResult<Payment> {
        payment.id.get_or_insert_with(ObjectId::new);
        self.items.lock().unwrap().push(payment.clone());
        Ok(payment)
    }

    async fn find_page(&self, filter: &PaymentFilter, page: Page) -> RepositoryResult<Paged<Payment>> {
        Ok(paginate(self.matching(filter), page))
    }

    async fn find_all(&self, filter: &PaymentFilter) -> RepositoryResult<Vec<Payment>> {
        Ok(self.matching(filter))
    }

    async fn total_revenue(&self, range: Option<DateRange>) -> RepositoryResult<f64> {
        let filter = PaymentFilter { created: range, ..PaymentFilter::completed() };
        Ok(self.matching(&filter).iter().map(|p| p.amount).sum())
    }

    async fn monthly_revenue(&self, range: Option<DateRange>) -> RepositoryResult<Vec<MonthlyRevenue>> {
        let filter = PaymentFilter { created: range, ..PaymentFilter::completed() };
        let mut months: BTreeMap<String, (f64, i64)> = BTreeMap::new();
        for payment in self.matching(&filter) {
            let entry = months.entry(payment.created_at.format("%Y-%m").to_string()).or_default();
            entry.0 += payment.amount;
            entry.1 += 1;
        }
        Ok(months
            .into_iter()
            .map(|(month, (revenue, transactions))| MonthlyRevenue { month, revenue, transactions })
            .collect())
    }
}

/// Records every send and reports each recipient as delivered.
#[derive(Default)]
pub struct RecordingNotifier {
    pub emails: Mutex<Vec<(Vec<String>, String)>>,
    pub sms: Mutex<Vec<(Vec<String>, String)>>,
}

#[async_trait]
impl NotificationService for RecordingNotifier {
    async fn send_bulk_email(&self, recipients: &[String], subject: &str, _message: &str) -> BulkResult {
        self.emails.lock().unwrap().push((recipients.to_vec(), subject.to_string()));
        BulkResult { successful: recipients.len(), failed: 0 }
    }

    async fn send_bulk_sms(&self, recipients: &[String], message: &str) -> BulkResult {
        self.sms.lock().unwrap().push((recipients.to_vec(), message.to_string()));
        BulkResult { successful: recipients.len(), failed: 0 }
    }

    fn email_enabled(&self) -> bool {
        true
    }

    fn sms_enabled(&self) -> bool {
        false
    }
}

pub struct TestApp {
    pub router: Router,
    pub users: Arc<MemoryUsers>,
    pub events: Arc<MemoryEvents>,
    pub announcements: Arc<MemoryAnnouncements>,
    pub jobs: Arc<MemoryJobs>,
    pub payments: Arc<MemoryPayments>,
    pub notifier: Arc<RecordingNotifier>,
    pub jwt: Arc<JwtTokenUtilsImpl>,
}

impl TestApp {
    pub fn new() -> Self {
        let users = Arc::new(MemoryUsers::default());
        let events = Arc::new(MemoryEvents::default());
        let announcements = Arc::new(MemoryAnnouncements::default());
        let jobs = Arc::new(MemoryJobs::default());
        let payments = Arc::new(MemoryPayments::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let jwt = Arc::new(JwtTokenUtilsImpl::new(JwtConfig::default()));

        let repos = Repositories {
            users: users.clone(),
            events: events.clone(),
            announcements: announcements.clone(),
            jobs: jobs.clone(),
            payments: payments.clone(),
        };
        let state = AppState::new(repos, jwt.clone(), notifier.clone(), SiteSettings::default());
        TestApp {
            router: build_router(state, None),
            users,
            events,
            announcements,
            jobs,
            payments,
            notifier,
            jwt,
        }
    }

    /// Stores an active account whose password is [`PASSWORD`].
    pub fn seed_user(&self, first_name: &str, email: &str, role: Role) -> User {
        let mut user = User::new(first_name.into(), "Test".into(), email.into(), password_hash(), role, Utc::now());
        user.id = Some(ObjectId::new());
        self.users.items.lock().unwrap().push(user.clone());
        user
    }

    /// Edits a stored user in place.
    pub fn edit_user(&self, user: &User, edit: impl FnOnce(&mut User)) {
        let mut items = self.users.items.lock().unwrap();
        let stored = items.iter_mut().find(|u| u.id == user.id).unwrap();
        edit(stored);
    }

    pub fn stored_user(&self, user: &User) -> User {
        self.users.items.lock().unwrap().iter().find(|u| u.id == user.id).cloned().unwrap()
    }

    pub fn token_for(&self, user: &User) -> String {
        let id = user.id.unwrap().to_hex();
        self.jwt.generate_token_pair(&id, &user.email, user.role.as_str()).unwrap().access_token
    }

    /// Seeds a user and returns it with a valid access token.
    pub fn login_as(&self, first_name: &str, role: Role) -> (User, String) {
        let email = format!("{}@example.com", first_name.to_lowercase());
        let user = self.seed_user(first_name, &email, role);
        let token = self.token_for(&user);
        (user, token)
    }

    pub async fn call(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = self.call_raw(method, uri, token, body.map(|b| b.to_string())).await;
        let json = serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()));
        (status, json)
    }

    pub async fn call_raw(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<String>,
    ) -> (StatusCode, Vec<u8>) {
        let resp = self.send(method, uri, token, body).await;
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), 4 * 1024 * 1024).await.unwrap();
        (status, bytes.to_vec())
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<String>,
    ) -> axum::response::Response {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header("authorization", format!("Bearer {}", token));
        }
        let body = match body {
            Some(body) => {
                req = req.header("content-type", "application/json");
                Body::from(body)
            }
            None => Body::empty(),
        };
        self.router.clone().oneshot(req.body(body).unwrap()).await.unwrap()
    }
}
