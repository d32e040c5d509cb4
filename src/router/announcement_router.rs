use axum::routing::{delete, get, post, put};
use axum::{middleware, Router};

use crate::app::state::AppState;
use crate::handler::announcement_handler::{
    add_comment_handler, add_reply_handler, create_announcement_handler, delete_announcement_handler,
    delete_comment_handler, get_announcement_handler, like_handler, list_announcements_handler,
    update_announcement_handler,
};
use crate::middlewares::{authenticate, optional_authenticate};

pub fn announcement_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/announcements", get(list_announcements_handler))
        .route("/announcements/{id}", get(get_announcement_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), optional_authenticate));

    let protected = Router::new()
        .route("/announcements", post(create_announcement_handler))
        .route("/announcements/{id}", put(update_announcement_handler).delete(delete_announcement_handler))
        .route("/announcements/{id}/like", post(like_handler))
        .route("/announcements/{id}/comments", post(add_comment_handler))
        .route("/announcements/{id}/comments/{comment_id}", delete(delete_comment_handler))
        .route("/announcements/{id}/comments/{comment_id}/replies", post(add_reply_handler))
        .route_layer(middleware::from_fn_with_state(state, authenticate));

    public.merge(protected)
}
