use axum::routing::{delete, get, put};
use axum::{middleware, Router};

use crate::app::state::AppState;
use crate::handler::user_handler::{
    change_password_handler, delete_account_handler, get_user_handler, graduation_years_handler,
    list_users_handler, locations_handler, update_preferences_handler, update_profile_handler,
};
use crate::middlewares::{authenticate, optional_authenticate};

pub fn user_router(state: AppState) -> Router<AppState> {
    let filters = Router::new()
        .route("/users/filters/graduation-years", get(graduation_years_handler))
        .route("/users/filters/locations", get(locations_handler));

    let directory = Router::new()
        .route("/users", get(list_users_handler))
        .route("/users/{id}", get(get_user_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), optional_authenticate));

    let account = Router::new()
        .route("/users/profile", put(update_profile_handler))
        .route("/users/preferences", put(update_preferences_handler))
        .route("/users/password", put(change_password_handler))
        .route("/users/account", delete(delete_account_handler))
        .route_layer(middleware::from_fn_with_state(state, authenticate));

    filters.merge(directory).merge(account)
}
