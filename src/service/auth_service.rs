use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::Utc;
use tracing::{error, info, instrument, warn};

use crate::dto::auth_dto::{AuthResponse, LoginRequest, RegisterRequest};
use crate::model::user::{Role, User, UserView};
use crate::repository::{RepositoryError, UserRepository};
use crate::util::error::ServiceError;
use crate::util::jwt::{JwtTokenUtils, JwtTokenUtilsImpl, TokenPair};
use crate::util::password::{PasswordUtils, PasswordUtilsImpl};
use crate::util::sms::normalize_phone;

const DUPLICATE_USER: &str = "User already exists with this email or phone";

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, ServiceError>;
    async fn login(&self, request: LoginRequest) -> Result<AuthResponse, ServiceError>;
    async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, ServiceError>;
    /// Resolves a bearer access token to an active user.
    async fn authenticate(&self, token: &str) -> Result<User, ServiceError>;
    /// Creates the bootstrap admin unless a user already holds `email`.
    async fn ensure_admin(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<bool, ServiceError>;
}

pub struct AuthServiceImpl {
    pub user_repo: Arc<dyn UserRepository>,
    pub jwt_utils: Arc<JwtTokenUtilsImpl>,
}

impl AuthServiceImpl {
    pub fn new(user_repo: Arc<dyn UserRepository>, jwt_utils: Arc<JwtTokenUtilsImpl>) -> Self {
        Self { user_repo, jwt_utils }
    }

    fn issue_tokens(&self, user: &User) -> Result<TokenPair, ServiceError> {
        let id = user.id.map(|id| id.to_hex()).unwrap_or_default();
        self.jwt_utils
            .generate_token_pair(&id, &user.email, user.role.as_str())
            .map_err(|e| ServiceError::InternalError(format!("JWT error: {}", e)))
    }

    fn respond(message: Option<&'static str>, tokens: TokenPair, user: Option<&User>) -> AuthResponse {
        AuthResponse {
            message,
            token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
            user: user.map(UserView::full),
        }
    }

    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>, ServiceError> {
        let identifier = identifier.trim();
        if identifier.contains('@') {
            return Ok(self.user_repo.find_by_email(identifier).await?);
        }
        match normalize_phone(identifier) {
            Some(phone) => Ok(self.user_repo.find_by_phone(&phone).await?),
            None => Ok(None),
        }
    }
}

fn hash(password: &str) -> Result<String, ServiceError> {
    PasswordUtilsImpl::hash_password(password).map_err(|e| ServiceError::internal(format!("Password hash error: {}", e)))
}

#[async_trait]
impl AuthService for AuthServiceImpl {
    #[instrument(skip(self, request), fields(email = %request.email))]
    async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, ServiceError> {
        info!("Registering new user");
        let phone = request.phone.as_deref().and_then(normalize_phone);

        if self.user_repo.find_by_email(&request.email).await?.is_some() {
            warn!("Registration rejected: email in use");
            return Err(ServiceError::invalid(DUPLICATE_USER));
        }
        if let Some(phone) = &phone {
            if self.user_repo.find_by_phone(phone).await?.is_some() {
                warn!("Registration rejected: phone in use");
                return Err(ServiceError::invalid(DUPLICATE_USER));
            }
        }

        let mut user = User::new(
            request.first_name.trim().to_string(),
            request.last_name.trim().to_string(),
            request.email,
            hash(&request.password)?,
            Role::Alumni,
            Utc::now(),
        );
        user.phone = phone;
        user.profile.graduation_year = request.graduation_year;

        let inserted = match self.user_repo.insert(user).await {
            Ok(user) => user,
            Err(RepositoryError::AlreadyExists(_)) => return Err(ServiceError::invalid(DUPLICATE_USER)),
            Err(e) => {
                error!("Failed to insert user: {}", e);
                return Err(e.into());
            }
        };
        let tokens = self.issue_tokens(&inserted)?;
        info!("User registered successfully");
        Ok(Self::respond(Some("User registered successfully"), tokens, Some(&inserted)))
    }

    #[instrument(skip(self, request))]
    async fn login(&self, request: LoginRequest) -> Result<AuthResponse, ServiceError> {
        info!("User login attempt");
        let invalid = || ServiceError::Unauthorized("Invalid credentials".to_string());
        let mut user = self.find_by_identifier(&request.identifier).await?.ok_or_else(invalid)?;

        let valid = PasswordUtilsImpl::verify_password(&request.password, &user.password_hash)
            .map_err(|e| ServiceError::internal(format!("Password verify error: {}", e)))?;
        if !valid {
            warn!("Invalid credentials");
            return Err(invalid());
        }
        if !user.is_active {
            warn!("Login attempt on deactivated account");
            return Err(ServiceError::Unauthorized("Account is deactivated".to_string()));
        }

        user.last_login = Some(Utc::now());
        self.user_repo.save(&user).await?;
        let tokens = self.issue_tokens(&user)?;
        info!("User logged in successfully");
        Ok(Self::respond(Some("Login successful"), tokens, Some(&user)))
    }

    #[instrument(skip(self, refresh_token))]
    async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, ServiceError> {
        info!("Refreshing token");
        let rejected = || ServiceError::Unauthorized("Invalid refresh token".to_string());
        let claims = self.jwt_utils.validate_refresh_token(refresh_token).map_err(|e| {
            warn!("Refresh token rejected: {}", e);
            rejected()
        })?;
        let id = ObjectId::parse_str(&claims.sub).map_err(|_| rejected())?;
        let user = self
            .user_repo
            .find_by_id(&id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(rejected)?;
        let tokens = self.issue_tokens(&user)?;
        info!("Token refreshed successfully");
        Ok(Self::respond(None, tokens, None))
    }

    async fn authenticate(&self, token: &str) -> Result<User, ServiceError> {
        let invalid = || ServiceError::Unauthorized("Invalid or expired token".to_string());
        let claims = self.jwt_utils.validate_access_token(token).map_err(|_| invalid())?;
        let id = ObjectId::parse_str(&claims.sub).map_err(|_| invalid())?;
        self.user_repo
            .find_by_id(&id)
            .await?
            .filter(|u| u.is_active)
            .ok_or_else(|| ServiceError::Unauthorized("User not found or inactive".to_string()))
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn ensure_admin(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<bool, ServiceError> {
        if self.user_repo.find_by_email(email).await?.is_some() {
            info!("Admin account already present");
            return Ok(false);
        }
        let admin = User::new(
            first_name.to_string(),
            last_name.to_string(),
            email.to_string(),
            hash(password)?,
            Role::Admin,
            Utc::now(),
        );
        self.user_repo.insert(admin).await?;
        info!("Admin account created");
        Ok(true)
    }
}
