pub mod admin_handler;
pub mod announcement_handler;
pub mod auth_handler;
pub mod event_handler;
pub mod job_handler;
pub mod user_handler;

use axum::Json;
use bson::oid::ObjectId;
use serde::Serialize;
use serde_json::Value;

use crate::util::error::HandlerError;
use crate::util::json::to_api_value;

/// Path segment to `ObjectId`, 400 "Invalid <resource> id" otherwise.
pub fn parse_id(raw: &str, resource: &str) -> Result<ObjectId, HandlerError> {
    ObjectId::parse_str(raw).map_err(|_| HandlerError::bad_request(format!("Invalid {} id", resource)))
}

/// Response body with every object id rendered as a hex string.
pub fn api_json<T: Serialize>(value: &T) -> Result<Json<Value>, HandlerError> {
    to_api_value(value).map(Json).map_err(HandlerError::internal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_id() {
        let id = ObjectId::new();
        assert_eq!(parse_id(&id.to_hex(), "event").unwrap(), id);
        assert_eq!(parse_id("nope", "event").unwrap_err().message, "Invalid event id");
    }

    #[test]
    fn test_api_json_flattens_object_ids() {
        let id = ObjectId::new();
        let Json(body) = api_json(&json!({ "event": { "_id": id } })).unwrap();
        assert_eq!(body["event"]["_id"], id.to_hex());
    }
}
