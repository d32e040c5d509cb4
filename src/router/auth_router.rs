use axum::routing::{get, post};
use axum::{middleware, Router};

use crate::app::state::AppState;
use crate::handler::auth_handler::{login_handler, me_handler, refresh_token_handler, register_handler};
use crate::middlewares::authenticate;

pub fn auth_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/refresh", post(refresh_token_handler));

    let protected = Router::new()
        .route("/auth/me", get(me_handler))
        .route_layer(middleware::from_fn_with_state(state, authenticate));

    public.merge(protected)
}
