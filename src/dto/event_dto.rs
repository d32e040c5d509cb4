use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::dto::{clean, not_blank, Channel};
use crate::model::event::{
    Event, EventDate, EventLocation, EventStatus, EventType, Fee, LocationType, Registration,
};
use crate::model::DomainError;
use bson::oid::ObjectId;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EventListQuery {
    #[validate(range(min = 1, message = "Page must be a positive integer"))]
    pub page: Option<u64>,
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<u64>,
    pub status: Option<EventStatus>,
    #[serde(rename = "type")]
    pub event_type: Option<EventType>,
    pub upcoming: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DateInput {
    #[serde(with = "crate::util::time::rfc3339")]
    pub start: DateTime<Utc>,
    #[serde(with = "crate::util::time::rfc3339")]
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LocationInput {
    #[serde(rename = "type")]
    pub kind: Option<LocationType>,
    pub venue: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    #[validate(url(message = "Virtual link must be a valid URL"))]
    pub virtual_link: Option<String>,
}

impl LocationInput {
    fn merge_into(self, location: &mut EventLocation) {
        if let Some(kind) = self.kind {
            location.kind = kind;
        }
        let fields = [
            (&mut location.venue, self.venue),
            (&mut location.address, self.address),
            (&mut location.city, self.city),
            (&mut location.country, self.country),
            (&mut location.virtual_link, self.virtual_link),
        ];
        for (target, value) in fields {
            if let Some(value) = clean(value) {
                *target = Some(value);
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FeeInput {
    #[validate(range(min = 0.0, message = "Fee amount cannot be negative"))]
    pub amount: f64,
    #[validate(length(equal = 3, message = "Currency must be a 3-letter code"))]
    pub currency: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationInput {
    pub is_required: Option<bool>,
    #[serde(default, with = "crate::util::time::rfc3339::option")]
    pub deadline: Option<DateTime<Utc>>,
    #[validate(nested)]
    pub fee: Option<FeeInput>,
}

impl RegistrationInput {
    fn merge_into(self, registration: &mut Registration) {
        if let Some(is_required) = self.is_required {
            registration.is_required = is_required;
        }
        if self.deadline.is_some() {
            registration.deadline = self.deadline;
        }
        if let Some(fee) = self.fee {
            registration.fee = Some(Fee { amount: fee.amount, currency: fee.currency.to_uppercase() });
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[validate(
        custom(function = "not_blank", message = "Title is required"),
        length(max = 200, message = "Title must be at most 200 characters")
    )]
    pub title: String,
    #[validate(custom(function = "not_blank", message = "Description is required"))]
    pub description: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[validate(nested)]
    pub date: DateInput,
    #[validate(nested)]
    pub location: Option<LocationInput>,
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub capacity: Option<u32>,
    #[validate(nested)]
    pub registration: Option<RegistrationInput>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[validate(url(message = "Image must be a valid URL"))]
    pub image: Option<String>,
    pub is_public: Option<bool>,
    pub status: Option<EventStatus>,
}

impl CreateEventRequest {
    pub fn into_event(self, organizer: ObjectId, now: DateTime<Utc>) -> Result<Event, DomainError> {
        let date = EventDate::new(self.date.start, self.date.end)?;
        let mut location = EventLocation::default();
        if let Some(input) = self.location {
            if input.kind.is_none() {
                return Err(DomainError::LocationTypeRequired);
            }
            input.merge_into(&mut location);
        }
        let mut registration = Registration::default();
        if let Some(input) = self.registration {
            input.merge_into(&mut registration);
        }
        Ok(Event {
            id: None,
            title: self.title.trim().to_string(),
            description: self.description,
            event_type: self.event_type,
            date,
            location,
            organizer,
            capacity: self.capacity,
            attendee_count: 0,
            registration,
            attendees: Vec::new(),
            tags: self.tags,
            image: clean(self.image),
            is_public: self.is_public.unwrap_or(true),
            status: self.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct DatePatch {
    #[serde(default, with = "crate::util::time::rfc3339::option")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, with = "crate::util::time::rfc3339::option")]
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    #[validate(
        custom(function = "not_blank", message = "Title cannot be empty"),
        length(max = 200, message = "Title must be at most 200 characters")
    )]
    pub title: Option<String>,
    #[validate(custom(function = "not_blank", message = "Description cannot be empty"))]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<EventType>,
    #[validate(nested)]
    pub date: Option<DatePatch>,
    #[validate(nested)]
    pub location: Option<LocationInput>,
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub capacity: Option<u32>,
    #[validate(nested)]
    pub registration: Option<RegistrationInput>,
    pub tags: Option<Vec<String>>,
    #[validate(url(message = "Image must be a valid URL"))]
    pub image: Option<String>,
    pub is_public: Option<bool>,
    pub status: Option<EventStatus>,
}

impl UpdateEventRequest {
    /// Merges the patch; a date change is checked against the merged range.
    pub fn apply(self, event: &mut Event, now: DateTime<Utc>) -> Result<(), DomainError> {
        if matches!(self.capacity, Some(capacity) if capacity < event.attendee_count) {
            return Err(DomainError::CapacityBelowAttendees);
        }
        if let Some(patch) = self.date {
            let start = patch.start.unwrap_or(event.date.start);
            let end = patch.end.unwrap_or(event.date.end);
            event.date = EventDate::new(start, end)?;
        }
        if let Some(title) = clean(self.title) {
            event.title = title;
        }
        if let Some(description) = self.description {
            event.description = description;
        }
        if let Some(event_type) = self.event_type {
            event.event_type = event_type;
        }
        if let Some(location) = self.location {
            location.merge_into(&mut event.location);
        }
        if self.capacity.is_some() {
            event.capacity = self.capacity;
        }
        if let Some(registration) = self.registration {
            registration.merge_into(&mut event.registration);
        }
        if let Some(tags) = self.tags {
            event.tags = tags;
        }
        if let Some(image) = clean(self.image) {
            event.image = Some(image);
        }
        if let Some(is_public) = self.is_public {
            event.is_public = is_public;
        }
        if let Some(status) = self.status {
            event.status = status;
        }
        event.updated_at = now;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendRemindersRequest {
    #[serde(rename = "type")]
    pub channel: Channel,
    #[validate(length(max = 200, message = "Subject must be at most 200 characters"))]
    pub subject: Option<String>,
    #[validate(custom(function = "not_blank", message = "Message is required"))]
    pub message: String,
}
