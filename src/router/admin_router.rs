use axum::routing::{get, post, put};
use axum::{middleware, Router};

use crate::app::state::AppState;
use crate::handler::admin_handler::{
    bulk_notification_handler, dashboard_handler, export_handler, list_payments_handler, list_users_handler,
    settings_handler, update_role_handler, update_status_handler,
};
use crate::middlewares::admin_auth;

pub fn admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/dashboard", get(dashboard_handler))
        .route("/admin/users", get(list_users_handler))
        .route("/admin/users/{id}/role", put(update_role_handler))
        .route("/admin/users/{id}/status", put(update_status_handler))
        .route("/admin/payments", get(list_payments_handler))
        .route("/admin/settings", get(settings_handler))
        .route("/admin/export/{export_type}", get(export_handler))
        .route("/admin/notifications/bulk", post(bulk_notification_handler))
        .route_layer(middleware::from_fn_with_state(state, admin_auth))
}
