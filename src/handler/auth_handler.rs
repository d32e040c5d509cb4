use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::app::state::AppState;
use crate::dto::auth_dto::{LoginRequest, RefreshRequest, RegisterRequest};
use crate::handler::api_json;
use crate::middlewares::{CurrentUser, ValidatedJson};
use crate::model::user::UserView;
use crate::util::error::HandlerError;

pub async fn register_handler(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let res = state.auth_service.register(payload).await?;
    Ok((StatusCode::CREATED, api_json(&res)?))
}

pub async fn login_handler(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let res = state.auth_service.login(payload).await?;
    api_json(&res)
}

pub async fn refresh_token_handler(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RefreshRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let res = state.auth_service.refresh(&payload.refresh_token).await?;
    api_json(&res)
}

pub async fn me_handler(CurrentUser(user): CurrentUser) -> Result<impl IntoResponse, HandlerError> {
    api_json(&UserView::full(&user))
}
