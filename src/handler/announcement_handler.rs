use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use serde_json::json;

use crate::app::state::AppState;
use crate::dto::announcement_dto::{
    AnnouncementListQuery, CommentRequest, CreateAnnouncementRequest, UpdateAnnouncementRequest,
};
use crate::handler::{api_json, parse_id};
use crate::middlewares::{parse_json, require_role, CurrentUser, MaybeUser, ValidatedJson, ValidatedQuery};
use crate::model::user::Role;
use crate::util::error::HandlerError;

const EDITORS: [Role; 2] = [Role::Admin, Role::Moderator];

pub async fn list_announcements_handler(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<AnnouncementListQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let res = state.announcement_service.list_announcements(query, Utc::now()).await?;
    api_json(&res)
}

pub async fn get_announcement_handler(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id, "announcement")?;
    let announcement = state.announcement_service.get_announcement(viewer.as_ref(), &id).await?;
    api_json(&announcement)
}

pub async fn create_announcement_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Bytes,
) -> Result<impl IntoResponse, HandlerError> {
    require_role(&user, &EDITORS)?;
    let payload: CreateAnnouncementRequest = parse_json(&body)?;
    let announcement = state.announcement_service.create_announcement(&user, payload).await?;
    Ok((
        StatusCode::CREATED,
        api_json(&json!({ "message": "Announcement created successfully", "announcement": announcement }))?,
    ))
}

pub async fn update_announcement_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, HandlerError> {
    require_role(&user, &EDITORS)?;
    let id = parse_id(&id, "announcement")?;
    let announcement = state.announcement_service.editable_announcement(&user, &id).await?;
    let payload: UpdateAnnouncementRequest = parse_json(&body)?;
    let announcement = state.announcement_service.update_announcement(announcement, payload).await?;
    api_json(&json!({ "message": "Announcement updated successfully", "announcement": announcement }))
}

pub async fn delete_announcement_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    require_role(&user, &EDITORS)?;
    let id = parse_id(&id, "announcement")?;
    let announcement = state.announcement_service.editable_announcement(&user, &id).await?;
    state.announcement_service.delete_announcement(announcement).await?;
    api_json(&json!({ "message": "Announcement deleted successfully" }))
}

pub async fn like_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id, "announcement")?;
    let like = state.announcement_service.toggle_like(&user, &id).await?;
    let message = if like.liked { "Announcement liked" } else { "Announcement unliked" };
    api_json(&json!({ "message": message, "liked": like.liked, "likeCount": like.like_count }))
}

pub async fn add_comment_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<CommentRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id, "announcement")?;
    let comment = state.announcement_service.add_comment(&user, &id, payload.content).await?;
    Ok((
        StatusCode::CREATED,
        api_json(&json!({ "message": "Comment added successfully", "comment": comment }))?,
    ))
}

pub async fn add_reply_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, comment_id)): Path<(String, String)>,
    ValidatedJson(payload): ValidatedJson<CommentRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id, "announcement")?;
    let comment_id = parse_id(&comment_id, "comment")?;
    let reply = state
        .announcement_service
        .add_reply(&user, &id, &comment_id, payload.content)
        .await?;
    Ok((
        StatusCode::CREATED,
        api_json(&json!({ "message": "Reply added successfully", "reply": reply }))?,
    ))
}

pub async fn delete_comment_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((id, comment_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id, "announcement")?;
    let comment_id = parse_id(&comment_id, "comment")?;
    state.announcement_service.delete_comment(&user, &id, &comment_id).await?;
    api_json(&json!({ "message": "Comment deleted successfully" }))
}
