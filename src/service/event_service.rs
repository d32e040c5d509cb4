use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{error, info, instrument, warn};

use crate::dto::event_dto::{CreateEventRequest, EventListQuery, SendRemindersRequest, UpdateEventRequest};
use crate::dto::pagination::{page_of, Pagination, DEFAULT_LIMIT};
use crate::dto::clean;
use crate::model::event::{Event, EventStatus};
use crate::model::user::{Role, User, UserSummary};
use crate::repository::{EventFilter, EventRepository, UserRepository};
use crate::service::notification_service::{deliver, ChannelResults, NotificationService};
use crate::service::{ensure_owner_or_admin, user_id, user_lookup};
use crate::util::error::ServiceError;
use crate::util::json::{populate, to_api_value};

#[async_trait]
pub trait EventService: Send + Sync {
    /// Public events, soonest first, organizer populated
    async fn list_events(&self, query: EventListQuery, now: DateTime<Utc>) -> Result<Value, ServiceError>;
    async fn get_event(&self, viewer: Option<&User>, id: &ObjectId) -> Result<Value, ServiceError>;
    async fn create_event(&self, actor: &User, request: CreateEventRequest) -> Result<Value, ServiceError>;
    /// Loads an event the actor may modify: 404 when missing, 403 when not theirs.
    async fn editable_event(&self, actor: &User, id: &ObjectId) -> Result<Event, ServiceError>;
    async fn update_event(&self, event: Event, request: UpdateEventRequest) -> Result<Value, ServiceError>;
    async fn delete_event(&self, event: Event) -> Result<(), ServiceError>;
    /// Returns the new attendee count.
    async fn rsvp(&self, actor: &User, id: &ObjectId) -> Result<u32, ServiceError>;
    async fn cancel_rsvp(&self, actor: &User, id: &ObjectId) -> Result<u32, ServiceError>;
    async fn attendees(&self, id: &ObjectId) -> Result<Value, ServiceError>;
    async fn send_reminders(&self, id: &ObjectId, request: SendRemindersRequest) -> Result<ChannelResults, ServiceError>;
}

pub struct EventServiceImpl {
    pub event_repo: Arc<dyn EventRepository>,
    pub user_repo: Arc<dyn UserRepository>,
    pub notifier: Arc<dyn NotificationService>,
}

impl EventServiceImpl {
    pub fn new(
        event_repo: Arc<dyn EventRepository>,
        user_repo: Arc<dyn UserRepository>,
        notifier: Arc<dyn NotificationService>,
    ) -> Self {
        Self { event_repo, user_repo, notifier }
    }

    async fn find(&self, id: &ObjectId) -> Result<Event, ServiceError> {
        self.event_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Event not found"))
    }

    /// Serializes `event` with organizer and attendee users resolved.
    async fn shape(&self, event: &Event) -> Result<Value, ServiceError> {
        let lookup = user_lookup(self.user_repo.as_ref(), event.referenced_user_ids(), UserSummary::brief).await?;
        let mut value = to_api_value(event)?;
        populate(&mut value, &["organizer"], &lookup);
        populate(&mut value, &["attendees", "user"], &lookup);
        Ok(value)
    }
}

#[async_trait]
impl EventService for EventServiceImpl {
    #[instrument(skip(self))]
    async fn list_events(&self, query: EventListQuery, now: DateTime<Utc>) -> Result<Value, ServiceError> {
        let page = page_of(query.page, query.limit, DEFAULT_LIMIT);
        let filter = EventFilter {
            public_only: true,
            status: Some(query.status.unwrap_or(EventStatus::Published)),
            event_type: query.event_type,
            starts_after: (query.upcoming == Some(true)).then_some(now),
            search: clean(query.search),
        };
        let found = self.event_repo.find_page(&filter, page).await.map_err(|e| {
            error!("Failed to list events: {}", e);
            ServiceError::from(e)
        })?;

        let organizers = found.items.iter().map(|e| e.organizer).collect();
        let lookup = user_lookup(self.user_repo.as_ref(), organizers, UserSummary::brief).await?;
        let mut events = to_api_value(&found.items)?;
        populate(&mut events, &["organizer"], &lookup);
        info!(count = found.items.len(), total = found.total, "Listed events");
        Ok(json!({ "events": events, "pagination": Pagination::new(page, found.total) }))
    }

    #[instrument(skip(self, viewer))]
    async fn get_event(&self, viewer: Option<&User>, id: &ObjectId) -> Result<Value, ServiceError> {
        let event = self.find(id).await?;
        if !event.is_public && !viewer.is_some_and(|v| v.role == Role::Admin) {
            warn!("Private event requested without admin role");
            return Err(ServiceError::forbidden("Access denied"));
        }
        self.shape(&event).await
    }

    #[instrument(skip(self, actor, request), fields(title = %request.title))]
    async fn create_event(&self, actor: &User, request: CreateEventRequest) -> Result<Value, ServiceError> {
        let event = request.into_event(user_id(actor)?, Utc::now())?;
        let created = self.event_repo.insert(event).await.map_err(|e| {
            error!("Failed to create event: {}", e);
            ServiceError::from(e)
        })?;
        info!(event_id = ?created.id, "Event created");
        self.shape(&created).await
    }

    async fn editable_event(&self, actor: &User, id: &ObjectId) -> Result<Event, ServiceError> {
        let event = self.find(id).await?;
        ensure_owner_or_admin(actor, &event.organizer)?;
        Ok(event)
    }

    #[instrument(skip(self, event, request), fields(event_id = ?event.id))]
    async fn update_event(&self, mut event: Event, request: UpdateEventRequest) -> Result<Value, ServiceError> {
        request.apply(&mut event, Utc::now())?;
        self.event_repo.save(&event).await?;
        info!("Event updated");
        self.shape(&event).await
    }

    #[instrument(skip(self, event), fields(event_id = ?event.id))]
    async fn delete_event(&self, event: Event) -> Result<(), ServiceError> {
        let id = event.id.ok_or_else(|| ServiceError::not_found("Event not found"))?;
        self.event_repo.delete(&id).await?;
        info!("Event deleted");
        Ok(())
    }

    #[instrument(skip(self, actor), fields(user_id = ?actor.id))]
    async fn rsvp(&self, actor: &User, id: &ObjectId) -> Result<u32, ServiceError> {
        let mut event = self.find(id).await?;
        event.rsvp(user_id(actor)?, Utc::now()).map_err(|e| {
            warn!("RSVP rejected: {}", e);
            ServiceError::from(e)
        })?;
        self.event_repo.save(&event).await?;
        info!(attendee_count = event.attendee_count, "RSVP recorded");
        Ok(event.attendee_count)
    }

    #[instrument(skip(self, actor), fields(user_id = ?actor.id))]
    async fn cancel_rsvp(&self, actor: &User, id: &ObjectId) -> Result<u32, ServiceError> {
        let mut event = self.find(id).await?;
        event.cancel_rsvp(&user_id(actor)?, Utc::now())?;
        self.event_repo.save(&event).await?;
        info!(attendee_count = event.attendee_count, "RSVP cancelled");
        Ok(event.attendee_count)
    }

    #[instrument(skip(self))]
    async fn attendees(&self, id: &ObjectId) -> Result<Value, ServiceError> {
        let event = self.find(id).await?;
        let ids = event.attendees.iter().map(|a| a.user).collect();
        let lookup = user_lookup(self.user_repo.as_ref(), ids, UserSummary::contact).await?;
        let mut attendees = to_api_value(&event.attendees)?;
        populate(&mut attendees, &["user"], &lookup);
        Ok(json!({ "attendees": attendees, "totalCount": event.attendees.len() }))
    }

    #[instrument(skip(self, request), fields(channel = ?request.channel))]
    async fn send_reminders(&self, id: &ObjectId, request: SendRemindersRequest) -> Result<ChannelResults, ServiceError> {
        let event = self.find(id).await?;
        let registered = event.registered_user_ids();
        if registered.is_empty() {
            return Err(ServiceError::invalid("No registered attendees to notify"));
        }
        let recipients = self.user_repo.find_by_ids(&registered).await?;

        let day = event.date.start.format("%Y-%m-%d").to_string();
        let time = event.date.start.format("%H:%M UTC").to_string();
        let subject = clean(request.subject).unwrap_or_else(|| format!("Reminder: {}", event.title));
        let email_body = format!("{}\n\nDate: {}\nTime: {}\n\n{}", event.title, day, time, request.message);
        let sms_body = format!("Reminder: {} on {}. {}", event.title, day, request.message);

        let results = deliver(
            self.notifier.as_ref(),
            request.channel,
            &recipients,
            &subject,
            &email_body,
            &sms_body,
        )
        .await;
        info!(?results, "Reminders sent");
        Ok(results)
    }
}
