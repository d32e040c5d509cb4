use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, warn};

use crate::app::state::AppState;
use crate::model::user::{Role, User};
use crate::util::error::HandlerError;
use crate::util::jwt::JwtTokenUtils;

fn bearer_token(state: &AppState, headers: &HeaderMap) -> Option<String> {
    let auth_header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    state.jwt_utils.extract_token_from_header(auth_header).ok()
}

async fn resolve_user(state: &AppState, headers: &HeaderMap) -> Result<User, HandlerError> {
    let token = bearer_token(state, headers).ok_or_else(|| HandlerError::unauthorized("Access token required"))?;
    state.auth_service.authenticate(&token).await.map_err(|e| {
        debug!("Bearer token rejected: {}", e);
        HandlerError::from(e)
    })
}

/// Requires a valid access token and stores the caller in the request extensions.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, HandlerError> {
    let user = resolve_user(&state, req.headers()).await?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Attaches the caller when a usable token is present, otherwise the request stays anonymous.
pub async fn optional_authenticate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    if let Some(token) = bearer_token(&state, req.headers()) {
        match state.auth_service.authenticate(&token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) => debug!("Ignoring unusable token on public route: {}", e),
        }
    }
    next.run(req).await
}

pub async fn admin_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, HandlerError> {
    let user = resolve_user(&state, req.headers()).await?;
    require_role(&user, &[Role::Admin])?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// 403 unless `user` holds one of `roles`.
pub fn require_role(user: &User, roles: &[Role]) -> Result<(), HandlerError> {
    if roles.contains(&user.role) {
        return Ok(());
    }
    warn!(user_id = ?user.id, role = %user.role, "Role check failed");
    Err(HandlerError::forbidden("Insufficient permissions"))
}
