use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use serde_json::json;

use crate::app::state::AppState;
use crate::dto::event_dto::{CreateEventRequest, EventListQuery, SendRemindersRequest, UpdateEventRequest};
use crate::handler::{api_json, parse_id};
use crate::middlewares::{parse_json, require_role, CurrentUser, MaybeUser, ValidatedJson, ValidatedQuery};
use crate::model::user::Role;
use crate::util::error::HandlerError;

const STAFF: [Role; 2] = [Role::Admin, Role::Moderator];

pub async fn list_events_handler(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<EventListQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let res = state.event_service.list_events(query, Utc::now()).await?;
    api_json(&res)
}

pub async fn get_event_handler(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id, "event")?;
    let event = state.event_service.get_event(viewer.as_ref(), &id).await?;
    api_json(&event)
}

pub async fn create_event_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreateEventRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let event = state.event_service.create_event(&user, payload).await?;
    Ok((
        StatusCode::CREATED,
        api_json(&json!({ "message": "Event created successfully", "event": event }))?,
    ))
}

// The ownership check runs before the body is looked at.
pub async fn update_event_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id, "event")?;
    let event = state.event_service.editable_event(&user, &id).await?;
    let payload: UpdateEventRequest = parse_json(&body)?;
    let event = state.event_service.update_event(event, payload).await?;
    api_json(&json!({ "message": "Event updated successfully", "event": event }))
}

pub async fn delete_event_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id, "event")?;
    let event = state.event_service.editable_event(&user, &id).await?;
    state.event_service.delete_event(event).await?;
    api_json(&json!({ "message": "Event deleted successfully" }))
}

pub async fn rsvp_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id, "event")?;
    let attendee_count = state.event_service.rsvp(&user, &id).await?;
    api_json(&json!({ "message": "Successfully registered for event", "attendeeCount": attendee_count }))
}

pub async fn cancel_rsvp_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id, "event")?;
    let attendee_count = state.event_service.cancel_rsvp(&user, &id).await?;
    api_json(&json!({ "message": "RSVP cancelled successfully", "attendeeCount": attendee_count }))
}

pub async fn attendees_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    require_role(&user, &STAFF)?;
    let id = parse_id(&id, "event")?;
    let res = state.event_service.attendees(&id).await?;
    api_json(&res)
}

pub async fn send_reminders_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, HandlerError> {
    require_role(&user, &STAFF)?;
    let id = parse_id(&id, "event")?;
    let payload: SendRemindersRequest = parse_json(&body)?;
    let results = state.event_service.send_reminders(&id, payload).await?;
    api_json(&json!({ "message": "Reminders sent successfully", "results": results }))
}
