pub mod admin_router;
pub mod announcement_router;
pub mod auth_router;
pub mod event_router;
pub mod job_router;
pub mod user_router;

use axum::routing::get;
use axum::Router;

use crate::app::state::AppState;

/// Every resource under `/api`, plus `/health`.
pub fn api_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(auth_router::auth_router(state.clone()))
        .merge(user_router::user_router(state.clone()))
        .merge(event_router::event_router(state.clone()))
        .merge(announcement_router::announcement_router(state.clone()))
        .merge(job_router::job_router(state.clone()))
        .merge(admin_router::admin_router(state.clone()));

    Router::new()
        .nest("/api", api)
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
}
