use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Reunion,
    Webinar,
    Fundraiser,
    Networking,
    Workshop,
    Social,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Draft,
    Published,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    #[default]
    Physical,
    Virtual,
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendeeStatus {
    Registered,
    Attended,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDate {
    #[serde(with = "crate::util::time::rfc3339")]
    pub start: DateTime<Utc>,
    #[serde(with = "crate::util::time::rfc3339")]
    pub end: DateTime<Utc>,
}

impl EventDate {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, DomainError> {
        if end <= start {
            return Err(DomainError::EndBeforeStart);
        }
        Ok(EventDate { start, end })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventLocation {
    #[serde(rename = "type")]
    pub kind: LocationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fee {
    pub amount: f64,
    pub currency: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[serde(default)]
    pub is_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "crate::util::time::rfc3339::option")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<Fee>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user: ObjectId,
    pub status: AttendeeStatus,
    #[serde(with = "crate::util::time::rfc3339")]
    pub registered_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub date: EventDate,
    #[serde(default)]
    pub location: EventLocation,
    pub organizer: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub attendee_count: u32,
    #[serde(default)]
    pub registration: Registration,
    #[serde(default)]
    pub attendees: Vec<Attendee>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(with = "crate::util::time::rfc3339")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::util::time::rfc3339")]
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn is_attending(&self, user_id: &ObjectId) -> bool {
        self.attendees.iter().any(|a| &a.user == user_id)
    }

    /// Recomputes `attendee_count` from the non-cancelled attendees.
    pub fn refresh_attendee_count(&mut self) {
        self.attendee_count = self
            .attendees
            .iter()
            .filter(|a| a.status != AttendeeStatus::Cancelled)
            .count() as u32;
    }

    /// Registers `user_id`, applying the publication, deadline, capacity and
    /// duplicate checks in that order.
    pub fn rsvp(&mut self, user_id: ObjectId, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status != EventStatus::Published {
            return Err(DomainError::EventNotPublished);
        }
        if matches!(self.registration.deadline, Some(deadline) if now > deadline) {
            return Err(DomainError::RegistrationClosed);
        }
        if matches!(self.capacity, Some(capacity) if self.attendee_count >= capacity) {
            return Err(DomainError::EventFull);
        }
        if self.is_attending(&user_id) {
            return Err(DomainError::AlreadyRegistered);
        }

        self.attendees.push(Attendee {
            id: ObjectId::new(),
            user: user_id,
            status: AttendeeStatus::Registered,
            registered_at: now,
        });
        self.refresh_attendee_count();
        self.updated_at = now;
        Ok(())
    }

    pub fn cancel_rsvp(&mut self, user_id: &ObjectId, now: DateTime<Utc>) -> Result<(), DomainError> {
        let index = self
            .attendees
            .iter()
            .position(|a| &a.user == user_id)
            .ok_or(DomainError::NotRegistered)?;
        self.attendees.remove(index);
        self.refresh_attendee_count();
        self.updated_at = now;
        Ok(())
    }

    /// Users whose attendance is still `registered`
    pub fn registered_user_ids(&self) -> Vec<ObjectId> {
        self.attendees
            .iter()
            .filter(|a| a.status == AttendeeStatus::Registered)
            .map(|a| a.user)
            .collect()
    }

    pub fn referenced_user_ids(&self) -> Vec<ObjectId> {
        let mut ids = vec![self.organizer];
        ids.extend(self.attendees.iter().map(|a| a.user));
        ids
    }
}
