use axum::extract::{Path, State};
use axum::response::IntoResponse;
use serde_json::json;

use crate::app::state::AppState;
use crate::dto::user_dto::{
    ChangePasswordRequest, DeleteAccountRequest, UpdatePreferencesRequest, UpdateProfileRequest, UserListQuery,
};
use crate::handler::{api_json, parse_id};
use crate::middlewares::{CurrentUser, MaybeUser, ValidatedJson, ValidatedQuery};
use crate::util::error::HandlerError;

pub async fn list_users_handler(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    ValidatedQuery(query): ValidatedQuery<UserListQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let res = state.user_service.list_users(viewer.as_ref(), query).await?;
    api_json(&res)
}

pub async fn get_user_handler(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id, "user")?;
    let user = state.user_service.get_user(viewer.as_ref(), &id).await?;
    api_json(&user)
}

pub async fn update_profile_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let user = state.user_service.update_profile(user, payload).await?;
    api_json(&json!({ "message": "Profile updated successfully", "user": user }))
}

pub async fn update_preferences_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(payload): ValidatedJson<UpdatePreferencesRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let preferences = state.user_service.update_preferences(user, payload).await?;
    api_json(&json!({ "message": "Preferences updated successfully", "preferences": preferences }))
}

pub async fn change_password_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(payload): ValidatedJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    state.user_service.change_password(user, payload).await?;
    api_json(&json!({ "message": "Password updated successfully" }))
}

pub async fn delete_account_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(payload): ValidatedJson<DeleteAccountRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    state.user_service.delete_account(user, payload).await?;
    api_json(&json!({ "message": "Account deleted successfully" }))
}

pub async fn graduation_years_handler(State(state): State<AppState>) -> Result<impl IntoResponse, HandlerError> {
    let years = state.user_service.graduation_years().await?;
    api_json(&years)
}

pub async fn locations_handler(State(state): State<AppState>) -> Result<impl IntoResponse, HandlerError> {
    let cities = state.user_service.locations().await?;
    api_json(&cities)
}
