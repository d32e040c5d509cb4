use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{error, info, instrument, warn};

use crate::config::SiteSettings;
use crate::dto::admin_dto::{AdminUserQuery, BulkNotificationRequest, ExportFormat, ExportType, PaymentListQuery};
use crate::dto::clean;
use crate::dto::pagination::{page_of, Pagination, ADMIN_DEFAULT_LIMIT};
use crate::model::event::EventStatus;
use crate::model::payment::Payment;
use crate::model::user::{Role, User, UserSummary, UserView};
use crate::repository::{
    AnnouncementRepository, DateRange, EventFilter, EventRepository, JobRepository, Page, PaymentFilter,
    PaymentRepository, UserFilter, UserRepository,
};
use crate::service::notification_service::{deliver, ChannelResults, NotificationService};
use crate::service::user_lookup;
use crate::util::csv_export::to_csv;
use crate::util::error::ServiceError;
use crate::util::json::{populate, to_api_value};
use crate::util::time;

const RECENT_COUNT: u64 = 5;

/// A rendered export ready to be sent as an attachment
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub body: String,
}

#[async_trait]
pub trait AdminService: Send + Sync {
    /// Independent aggregate reads merged into one document; `range` narrows
    /// the "new users" and "recent revenue" figures.
    async fn dashboard(&self, range: Option<DateRange>) -> Result<Value, ServiceError>;
    async fn list_users(&self, query: AdminUserQuery) -> Result<Value, ServiceError>;
    async fn update_role(&self, id: &ObjectId, role: Role) -> Result<Value, ServiceError>;
    async fn update_status(&self, id: &ObjectId, is_active: bool) -> Result<Value, ServiceError>;
    async fn list_payments(&self, query: PaymentListQuery) -> Result<Value, ServiceError>;
    fn settings(&self) -> Value;
    async fn export(&self, export_type: ExportType, format: ExportFormat) -> Result<ExportFile, ServiceError>;
    async fn bulk_notification(&self, request: BulkNotificationRequest) -> Result<ChannelResults, ServiceError>;
}

pub struct AdminServiceImpl {
    pub user_repo: Arc<dyn UserRepository>,
    pub event_repo: Arc<dyn EventRepository>,
    pub announcement_repo: Arc<dyn AnnouncementRepository>,
    pub job_repo: Arc<dyn JobRepository>,
    pub payment_repo: Arc<dyn PaymentRepository>,
    pub notifier: Arc<dyn NotificationService>,
    pub site: SiteSettings,
}

impl AdminServiceImpl {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        event_repo: Arc<dyn EventRepository>,
        announcement_repo: Arc<dyn AnnouncementRepository>,
        job_repo: Arc<dyn JobRepository>,
        payment_repo: Arc<dyn PaymentRepository>,
        notifier: Arc<dyn NotificationService>,
        site: SiteSettings,
    ) -> Self {
        Self { user_repo, event_repo, announcement_repo, job_repo, payment_repo, notifier, site }
    }

    async fn find_user(&self, id: &ObjectId) -> Result<User, ServiceError> {
        self.user_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))
    }

    /// Payments without provider details, each `user` resolved to contact data.
    async fn shape_payments(&self, payments: &[Payment]) -> Result<Value, ServiceError> {
        let payers = payments.iter().map(|p| p.user).collect();
        let lookup = user_lookup(self.user_repo.as_ref(), payers, UserSummary::contact).await?;
        let redacted: Vec<Payment> = payments.iter().map(Payment::redacted).collect();
        let mut value = to_api_value(&redacted)?;
        populate(&mut value, &["user"], &lookup);
        Ok(value)
    }

    async fn export_rows(&self, export_type: ExportType) -> Result<Value, ServiceError> {
        match export_type {
            ExportType::Users => {
                let users = self.user_repo.find_all(&UserFilter::active()).await?;
                let views: Vec<UserView> = users.iter().map(UserView::full).collect();
                Ok(to_api_value(&views)?)
            }
            ExportType::Events => {
                let events = self.event_repo.find_all(&EventFilter::default()).await?;
                let organizers = events.iter().map(|e| e.organizer).collect();
                let lookup = user_lookup(self.user_repo.as_ref(), organizers, UserSummary::contact).await?;
                let mut value = to_api_value(&events)?;
                populate(&mut value, &["organizer"], &lookup);
                Ok(value)
            }
            ExportType::Payments => {
                let payments = self.payment_repo.find_all(&PaymentFilter::completed()).await?;
                self.shape_payments(&payments).await
            }
        }
    }
}

fn recent_user(user: &User) -> Value {
    json!({
        "_id": user.id.map(|id| id.to_hex()),
        "firstName": user.first_name,
        "lastName": user.last_name,
        "email": user.email,
        "role": user.role,
        "createdAt": time::format(&user.created_at),
    })
}

#[async_trait]
impl AdminService for AdminServiceImpl {
    #[instrument(skip(self))]
    async fn dashboard(&self, range: Option<DateRange>) -> Result<Value, ServiceError> {
        let now = Utc::now();
        let active = UserFilter::active();
        let all_events = EventFilter::default();
        let new_users = UserFilter { created: range, ..UserFilter::active() };
        let upcoming = EventFilter {
            status: Some(EventStatus::Published),
            starts_after: Some(now),
            ..EventFilter::default()
        };

        let (
            (total_users, fresh_users, users_by_role, recent_users),
            (total_events, upcoming_events, events_by_type, recent_events),
            (total_revenue, recent_revenue, monthly_revenue),
            (total_announcements, announcements_by_category, total_jobs, jobs_by_category),
        ) = futures::try_join!(
            async {
                futures::try_join!(
                    self.user_repo.count(&active),
                    self.user_repo.count(&new_users),
                    self.user_repo.count_by_role(),
                    self.user_repo.find_page(&active, Page::new(1, RECENT_COUNT)),
                )
            },
            async {
                futures::try_join!(
                    self.event_repo.count(&all_events),
                    self.event_repo.count(&upcoming),
                    self.event_repo.count_by_type(),
                    self.event_repo.recent(RECENT_COUNT),
                )
            },
            async {
                futures::try_join!(
                    self.payment_repo.total_revenue(None),
                    self.payment_repo.total_revenue(range),
                    self.payment_repo.monthly_revenue(range),
                )
            },
            async {
                futures::try_join!(
                    self.announcement_repo.count_published(),
                    self.announcement_repo.count_by_category(),
                    self.job_repo.count_active(),
                    self.job_repo.count_by_category(),
                )
            },
        )
        .map_err(|e| {
            error!("Dashboard aggregation failed: {}", e);
            ServiceError::from(e)
        })?;

        let organizers = recent_events.iter().map(|e| e.organizer).collect();
        let lookup = user_lookup(self.user_repo.as_ref(), organizers, UserSummary::brief).await?;
        let mut recent_events = to_api_value(&recent_events)?;
        populate(&mut recent_events, &["organizer"], &lookup);
        let recent_users: Vec<Value> = recent_users.items.iter().map(recent_user).collect();

        info!(total_users, total_events, "Dashboard assembled");
        Ok(json!({
            "users": {
                "total": total_users,
                "new": fresh_users,
                "byRole": users_by_role,
                "recent": recent_users,
            },
            "events": {
                "total": total_events,
                "upcoming": upcoming_events,
                "byType": events_by_type,
                "recent": recent_events,
            },
            "payments": {
                "totalRevenue": total_revenue,
                "recentRevenue": recent_revenue,
                "monthlyRevenue": monthly_revenue,
            },
            "announcements": {
                "total": total_announcements,
                "byCategory": announcements_by_category,
            },
            "jobs": {
                "total": total_jobs,
                "byCategory": jobs_by_category,
            },
        }))
    }

    #[instrument(skip(self))]
    async fn list_users(&self, query: AdminUserQuery) -> Result<Value, ServiceError> {
        let page = page_of(query.page, query.limit, ADMIN_DEFAULT_LIMIT);
        let found = self.user_repo.find_page(&query.filter(), page).await.map_err(|e| {
            error!("Failed to list users: {}", e);
            ServiceError::from(e)
        })?;
        let users: Vec<UserView> = found.items.iter().map(UserView::full).collect();
        Ok(json!({ "users": to_api_value(&users)?, "pagination": Pagination::new(page, found.total) }))
    }

    #[instrument(skip(self), fields(role = %role))]
    async fn update_role(&self, id: &ObjectId, role: Role) -> Result<Value, ServiceError> {
        let mut user = self.find_user(id).await?;
        user.role = role;
        user.updated_at = Utc::now();
        self.user_repo.save(&user).await?;
        info!("User role updated");
        Ok(json!({
            "id": id.to_hex(),
            "firstName": user.first_name,
            "lastName": user.last_name,
            "email": user.email,
            "role": user.role,
        }))
    }

    #[instrument(skip(self))]
    async fn update_status(&self, id: &ObjectId, is_active: bool) -> Result<Value, ServiceError> {
        let mut user = self.find_user(id).await?;
        user.is_active = is_active;
        user.updated_at = Utc::now();
        self.user_repo.save(&user).await?;
        info!("User status updated");
        Ok(json!({
            "id": id.to_hex(),
            "firstName": user.first_name,
            "lastName": user.last_name,
            "email": user.email,
            "isActive": user.is_active,
        }))
    }

    #[instrument(skip(self))]
    async fn list_payments(&self, query: PaymentListQuery) -> Result<Value, ServiceError> {
        let page = page_of(query.page, query.limit, ADMIN_DEFAULT_LIMIT);
        let filter = PaymentFilter { status: query.status, payment_type: query.payment_type, created: None };
        let found = self.payment_repo.find_page(&filter, page).await.map_err(|e| {
            error!("Failed to list payments: {}", e);
            ServiceError::from(e)
        })?;
        let payments = self.shape_payments(&found.items).await?;
        Ok(json!({ "payments": payments, "pagination": Pagination::new(page, found.total) }))
    }

    fn settings(&self) -> Value {
        json!({
            "general": {
                "siteName": self.site.site_name,
                "siteDescription": self.site.site_description,
                "contactEmail": self.site.contact_email,
                "supportPhone": self.site.support_phone,
            },
            "notifications": {
                "emailEnabled": self.notifier.email_enabled(),
                "smsEnabled": self.notifier.sms_enabled(),
                "pushEnabled": false,
            },
            "payments": {
                "defaultCurrency": self.site.default_currency,
            },
            "features": {
                "jobBoardEnabled": true,
                "eventsEnabled": true,
                "announcementsEnabled": true,
                "messagingEnabled": false,
                "maxUploadMb": self.site.max_upload_mb,
            },
        })
    }

    #[instrument(skip(self), fields(export_type = %export_type))]
    async fn export(&self, export_type: ExportType, format: ExportFormat) -> Result<ExportFile, ServiceError> {
        let rows = self.export_rows(export_type).await.map_err(|e| {
            error!("Export failed: {}", e);
            e
        })?;
        let body = match format {
            ExportFormat::Json => serde_json::to_string_pretty(&rows)?,
            ExportFormat::Csv => {
                let rows = match rows {
                    Value::Array(rows) => rows,
                    other => vec![other],
                };
                to_csv(&rows).map_err(|e| ServiceError::internal(format!("CSV error: {}", e)))?
            }
        };
        let filename = format!(
            "{}_export_{}.{}",
            export_type,
            Utc::now().timestamp_millis(),
            format.extension()
        );
        info!(%filename, bytes = body.len(), "Export generated");
        Ok(ExportFile { filename, content_type: format.content_type(), body })
    }

    #[instrument(skip(self, request), fields(channel = ?request.channel))]
    async fn bulk_notification(&self, request: BulkNotificationRequest) -> Result<ChannelResults, ServiceError> {
        let recipients = self.user_repo.find_all(&request.recipient_filter()).await?;
        if recipients.is_empty() {
            warn!("Bulk notification matched no users");
            return Err(ServiceError::invalid("No recipients match the selected audience"));
        }
        let subject = clean(request.subject).unwrap_or_else(|| self.site.site_name.clone());
        let results = deliver(
            self.notifier.as_ref(),
            request.channel,
            &recipients,
            &subject,
            &request.message,
            &request.message,
        )
        .await;
        info!(recipients = recipients.len(), ?results, "Bulk notification sent");
        Ok(results)
    }
}
