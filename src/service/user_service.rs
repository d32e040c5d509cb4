use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{error, info, instrument, warn};

use crate::dto::pagination::{page_of, Pagination, DEFAULT_LIMIT};
use crate::dto::user_dto::{ChangePasswordRequest, DeleteAccountRequest, UpdatePreferencesRequest, UpdateProfileRequest, UserListQuery};
use crate::dto::clean;
use crate::model::user::{Role, User, UserPreferences, UserView};
use crate::repository::{UserFilter, UserRepository};
use crate::util::error::ServiceError;
use crate::util::password::{PasswordUtils, PasswordUtilsImpl};

#[async_trait]
pub trait UserService: Send + Sync {
    /// Directory of active users, newest first
    async fn list_users(&self, viewer: Option<&User>, query: UserListQuery) -> Result<Value, ServiceError>;
    async fn get_user(&self, viewer: Option<&User>, id: &ObjectId) -> Result<UserView, ServiceError>;
    async fn update_profile(&self, user: User, request: UpdateProfileRequest) -> Result<UserView, ServiceError>;
    async fn update_preferences(
        &self,
        user: User,
        request: UpdatePreferencesRequest,
    ) -> Result<UserPreferences, ServiceError>;
    async fn change_password(&self, user: User, request: ChangePasswordRequest) -> Result<(), ServiceError>;
    async fn delete_account(&self, user: User, request: DeleteAccountRequest) -> Result<(), ServiceError>;
    async fn graduation_years(&self) -> Result<Vec<i32>, ServiceError>;
    async fn locations(&self) -> Result<Vec<String>, ServiceError>;
}

pub struct UserServiceImpl {
    pub user_repo: Arc<dyn UserRepository>,
}

impl UserServiceImpl {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }
}

/// Owners and admins see everything; everyone else gets the privacy-filtered view.
fn view_for(viewer: Option<&User>, user: &User) -> UserView {
    let privileged = viewer.is_some_and(|v| v.role == Role::Admin || (v.id.is_some() && v.id == user.id));
    if privileged {
        UserView::full(user)
    } else {
        UserView::public(user)
    }
}

fn verify(password: &str, user: &User) -> Result<bool, ServiceError> {
    PasswordUtilsImpl::verify_password(password, &user.password_hash)
        .map_err(|e| ServiceError::internal(format!("Password verify error: {}", e)))
}

#[async_trait]
impl UserService for UserServiceImpl {
    #[instrument(skip(self, viewer))]
    async fn list_users(&self, viewer: Option<&User>, query: UserListQuery) -> Result<Value, ServiceError> {
        let page = page_of(query.page, query.limit, DEFAULT_LIMIT);
        let filter = UserFilter {
            graduation_years: query.graduation_year.into_iter().collect(),
            locations: clean(query.location).into_iter().collect(),
            profession: clean(query.profession),
            search: clean(query.search),
            ..UserFilter::active()
        };
        let found = self.user_repo.find_page(&filter, page).await.map_err(|e| {
            error!("Failed to list users: {}", e);
            ServiceError::from(e)
        })?;
        let users: Vec<UserView> = found.items.iter().map(|u| view_for(viewer, u)).collect();
        info!(count = users.len(), total = found.total, "Listed users");
        Ok(json!({ "users": users, "pagination": Pagination::new(page, found.total) }))
    }

    #[instrument(skip(self, viewer))]
    async fn get_user(&self, viewer: Option<&User>, id: &ObjectId) -> Result<UserView, ServiceError> {
        let user = self
            .user_repo
            .find_by_id(id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| ServiceError::not_found("User not found"))?;
        Ok(view_for(viewer, &user))
    }

    #[instrument(skip(self, user, request), fields(user_id = ?user.id))]
    async fn update_profile(&self, mut user: User, request: UpdateProfileRequest) -> Result<UserView, ServiceError> {
        if let Some(phone) = request.new_phone() {
            if let Some(holder) = self.user_repo.find_by_phone(&phone).await? {
                if holder.id != user.id {
                    warn!("Phone number already registered to another account");
                    return Err(ServiceError::invalid("Phone number already in use"));
                }
            }
        }
        request.apply(&mut user, Utc::now());
        self.user_repo.save(&user).await?;
        info!("Profile updated");
        Ok(UserView::full(&user))
    }

    #[instrument(skip(self, user, request), fields(user_id = ?user.id))]
    async fn update_preferences(
        &self,
        mut user: User,
        request: UpdatePreferencesRequest,
    ) -> Result<UserPreferences, ServiceError> {
        request.apply(&mut user.preferences);
        user.updated_at = Utc::now();
        self.user_repo.save(&user).await?;
        info!("Preferences updated");
        Ok(user.preferences)
    }

    #[instrument(skip(self, user, request), fields(user_id = ?user.id))]
    async fn change_password(&self, mut user: User, request: ChangePasswordRequest) -> Result<(), ServiceError> {
        if !verify(&request.current_password, &user)? {
            warn!("Password change rejected: wrong current password");
            return Err(ServiceError::invalid("Current password is incorrect"));
        }
        user.password_hash = PasswordUtilsImpl::hash_password(&request.new_password)
            .map_err(|e| ServiceError::internal(format!("Password hash error: {}", e)))?;
        user.updated_at = Utc::now();
        self.user_repo.save(&user).await?;
        info!("Password updated");
        Ok(())
    }

    #[instrument(skip(self, user, request), fields(user_id = ?user.id))]
    async fn delete_account(&self, mut user: User, request: DeleteAccountRequest) -> Result<(), ServiceError> {
        if !verify(&request.password, &user)? {
            warn!("Account deletion rejected: wrong password");
            return Err(ServiceError::invalid("Incorrect password"));
        }
        user.soft_delete(Utc::now());
        self.user_repo.save(&user).await?;
        info!("Account soft-deleted");
        Ok(())
    }

    async fn graduation_years(&self) -> Result<Vec<i32>, ServiceError> {
        Ok(self.user_repo.graduation_years().await?)
    }

    async fn locations(&self) -> Result<Vec<String>, ServiceError> {
        Ok(self.user_repo.cities().await?)
    }
}
