use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::model::user::User;
use crate::util::error::HandlerError;

/// The caller placed in the request by `authenticate`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// The caller, if `optional_authenticate` found one.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = HandlerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| HandlerError::unauthorized("Access token required"))
    }
}

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = HandlerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<User>().cloned()))
    }
}

fn json_rejection(rejection: JsonRejection) -> HandlerError {
    HandlerError::field("body", rejection.body_text())
}

fn query_rejection(rejection: QueryRejection) -> HandlerError {
    HandlerError::field("query", rejection.body_text())
}

/// JSON body that has passed its `validator` rules.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = HandlerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(json_rejection)?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

#[derive(Debug)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = HandlerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await.map_err(query_rejection)?;
        value.validate()?;
        Ok(ValidatedQuery(value))
    }
}

/// Parses and validates a body that was buffered before an access check ran.
pub fn parse_json<T>(body: &Bytes) -> Result<T, HandlerError>
where
    T: DeserializeOwned + Validate,
{
    let Json(value) = Json::<T>::from_bytes(body).map_err(json_rejection)?;
    value.validate()?;
    Ok(value)
}

/// Like [`parse_json`], but an empty body yields `T::default()`.
pub fn parse_json_or_default<T>(body: &Bytes) -> Result<T, HandlerError>
where
    T: DeserializeOwned + Validate + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    parse_json(body)
}
