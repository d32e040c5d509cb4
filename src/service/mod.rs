pub mod admin_service;
pub mod announcement_service;
pub mod auth_service;
pub mod event_service;
pub mod job_service;
pub mod notification_service;
pub mod user_service;

use std::collections::HashMap;

use bson::oid::ObjectId;
use serde_json::Value;

use crate::model::user::{Role, User, UserSummary};
use crate::repository::UserRepository;
use crate::util::error::ServiceError;
use crate::util::json::to_api_value;

pub use admin_service::{AdminService, AdminServiceImpl};
pub use announcement_service::{AnnouncementService, AnnouncementServiceImpl};
pub use auth_service::{AuthService, AuthServiceImpl};
pub use event_service::{EventService, EventServiceImpl};
pub use job_service::{JobService, JobServiceImpl};
pub use notification_service::{BulkResult, NotificationService, NotificationServiceImpl};
pub use user_service::{UserService, UserServiceImpl};

/// Creator of the resource or an admin, otherwise 403 "Access denied".
pub fn ensure_owner_or_admin(actor: &User, owner: &ObjectId) -> Result<(), ServiceError> {
    if actor.role == Role::Admin || actor.id.as_ref() == Some(owner) {
        return Ok(());
    }
    Err(ServiceError::forbidden("Access denied"))
}

pub(crate) fn user_id(user: &User) -> Result<ObjectId, ServiceError> {
    user.id.ok_or_else(|| ServiceError::internal("user document has no _id"))
}

/// Loads the referenced users once and shapes each with `shape`, keyed by hex id.
pub(crate) async fn user_lookup(
    users: &dyn UserRepository,
    mut ids: Vec<ObjectId>,
    shape: fn(&User) -> UserSummary,
) -> Result<HashMap<String, Value>, ServiceError> {
    ids.sort();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let found = users.find_by_ids(&ids).await?;
    let mut lookup = HashMap::with_capacity(found.len());
    for user in &found {
        if let Some(id) = user.id {
            lookup.insert(id.to_hex(), to_api_value(&shape(user))?);
        }
    }
    Ok(lookup)
}
