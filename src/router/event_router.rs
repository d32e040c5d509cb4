use axum::routing::{get, post, put};
use axum::{middleware, Router};

use crate::app::state::AppState;
use crate::handler::event_handler::{
    attendees_handler, cancel_rsvp_handler, create_event_handler, delete_event_handler, get_event_handler,
    list_events_handler, rsvp_handler, send_reminders_handler, update_event_handler,
};
use crate::middlewares::{authenticate, optional_authenticate};

pub fn event_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/events", get(list_events_handler))
        .route("/events/{id}", get(get_event_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), optional_authenticate));

    let protected = Router::new()
        .route("/events", post(create_event_handler))
        .route("/events/{id}", put(update_event_handler).delete(delete_event_handler))
        .route("/events/{id}/rsvp", post(rsvp_handler).delete(cancel_rsvp_handler))
        .route("/events/{id}/attendees", get(attendees_handler))
        .route("/events/{id}/send-reminders", post(send_reminders_handler))
        .route_layer(middleware::from_fn_with_state(state, authenticate));

    public.merge(protected)
}
