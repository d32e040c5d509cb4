pub mod auth_middleware;
pub mod extractors;

pub use auth_middleware::{admin_auth, authenticate, optional_authenticate, require_role};
pub use extractors::{parse_json, parse_json_or_default, CurrentUser, MaybeUser, ValidatedJson, ValidatedQuery};
