use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use serde_json::json;

use crate::app::state::AppState;
use crate::dto::admin_dto::{
    AdminUserQuery, BulkNotificationRequest, DashboardQuery, ExportQuery, ExportType, PaymentListQuery,
    UpdateRoleRequest, UpdateStatusRequest,
};
use crate::handler::{api_json, parse_id};
use crate::middlewares::{ValidatedJson, ValidatedQuery};
use crate::util::error::HandlerError;

pub async fn dashboard_handler(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<DashboardQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let res = state.admin_service.dashboard(query.range()).await?;
    api_json(&res)
}

pub async fn list_users_handler(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<AdminUserQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let res = state.admin_service.list_users(query).await?;
    api_json(&res)
}

pub async fn update_role_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateRoleRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id, "user")?;
    let user = state.admin_service.update_role(&id, payload.role).await?;
    api_json(&json!({ "message": "User role updated successfully", "user": user }))
}

pub async fn update_status_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateStatusRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_id(&id, "user")?;
    let user = state.admin_service.update_status(&id, payload.is_active).await?;
    let message = if payload.is_active {
        "User activated successfully"
    } else {
        "User deactivated successfully"
    };
    api_json(&json!({ "message": message, "user": user }))
}

pub async fn list_payments_handler(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<PaymentListQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let res = state.admin_service.list_payments(query).await?;
    api_json(&res)
}

pub async fn settings_handler(State(state): State<AppState>) -> Result<impl IntoResponse, HandlerError> {
    api_json(&state.admin_service.settings())
}

pub async fn export_handler(
    State(state): State<AppState>,
    Path(export_type): Path<String>,
    ValidatedQuery(query): ValidatedQuery<ExportQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let export_type: ExportType = export_type.parse().map_err(HandlerError::bad_request)?;
    let file = state.admin_service.export(export_type, query.format).await?;
    let disposition = format!("attachment; filename=\"{}\"", file.filename);
    Ok((
        [(header::CONTENT_TYPE, file.content_type.to_string()), (header::CONTENT_DISPOSITION, disposition)],
        file.body,
    ))
}

pub async fn bulk_notification_handler(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<BulkNotificationRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let results = state.admin_service.bulk_notification(payload).await?;
    api_json(&json!({ "message": "Notifications sent successfully", "results": results }))
}
