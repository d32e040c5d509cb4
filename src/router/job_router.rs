use axum::routing::{get, post, put};
use axum::{middleware, Router};

use crate::app::state::AppState;
use crate::handler::job_handler::{
    applications_handler, apply_handler, create_job_handler, delete_job_handler, get_job_handler,
    list_jobs_handler, my_applications_handler, update_application_handler, update_job_handler,
};
use crate::middlewares::{authenticate, optional_authenticate};

pub fn job_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/jobs", get(list_jobs_handler))
        .route("/jobs/{id}", get(get_job_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), optional_authenticate));

    // "my" is a static segment, so it wins over `{id}`.
    let protected = Router::new()
        .route("/jobs", post(create_job_handler))
        .route("/jobs/my/applications", get(my_applications_handler))
        .route("/jobs/{id}", put(update_job_handler).delete(delete_job_handler))
        .route("/jobs/{id}/apply", post(apply_handler))
        .route("/jobs/{id}/applications", get(applications_handler))
        .route("/jobs/{id}/applications/{application_id}", put(update_application_handler))
        .route_layer(middleware::from_fn_with_state(state, authenticate));

    public.merge(protected)
}
