use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::app::state::{AppState, Repositories};
use crate::config::{AdminUserConfig, AppConfig, EmailConfig, JwtConfig, MongoConfig, SmsConfig};
use crate::repository::{
    connect, MongoAnnouncementRepository, MongoEventRepository, MongoJobRepository, MongoPaymentRepository,
    MongoUserRepository,
};
use crate::router::api_router;
use crate::service::NotificationServiceImpl;
use crate::util::email::SmtpEmailService;
use crate::util::jwt::JwtTokenUtilsImpl;
use crate::util::sms::SmsGateway;

pub type StartupError = Box<dyn std::error::Error + Send + Sync>;

pub struct App {
    config: AppConfig,
    router: Router,
    pub state: AppState,
}

impl App {
    pub async fn new() -> Result<Self, StartupError> {
        let config = AppConfig::from_env()?;
        let jwt_config = JwtConfig::from_env()?;
        let mongo_config = MongoConfig::from_env()?;

        let db = connect(&mongo_config).await?;
        let users = MongoUserRepository::new(&db);
        users.ensure_indexes().await?;
        let repos = Repositories {
            users: Arc::new(users),
            events: Arc::new(MongoEventRepository::new(&db)),
            announcements: Arc::new(MongoAnnouncementRepository::new(&db)),
            jobs: Arc::new(MongoJobRepository::new(&db)),
            payments: Arc::new(MongoPaymentRepository::new(&db)),
        };

        let notifier = Arc::new(NotificationServiceImpl::new(
            email_service(),
            sms_gateway(),
            config.site.site_name.clone(),
        ));
        let jwt_utils = Arc::new(JwtTokenUtilsImpl::new(jwt_config));
        let state = AppState::new(repos, jwt_utils, notifier, config.site.clone());

        let router = build_router(state.clone(), config.cors_origin.as_deref());
        let app = App { config, router, state };
        app.create_first_admin_user().await;
        Ok(app)
    }

    pub async fn start(self) -> Result<(), StartupError> {
        let addr = SocketAddr::new(self.config.host.parse()?, self.config.port);
        info!("🚀 Server running at http://{}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.router).await?;
        Ok(())
    }

    async fn create_first_admin_user(&self) {
        let admin_conf = match AdminUserConfig::from_env() {
            Ok(c) => c,
            Err(e) => {
                warn!("Admin user config not loaded: {e}");
                return;
            }
        };
        match self
            .state
            .auth_service
            .ensure_admin(&admin_conf.first_name, &admin_conf.last_name, &admin_conf.email, &admin_conf.password)
            .await
        {
            Ok(true) => info!("First admin user created."),
            Ok(false) => info!("Admin user already exists, skipping creation."),
            Err(e) => error!("Failed to create admin user: {e}"),
        }
    }
}

/// The full HTTP surface with tracing and CORS applied.
pub fn build_router(state: AppState, cors_origin: Option<&str>) -> Router {
    api_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origin))
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_DISPOSITION]);
    match origin.and_then(|o| o.parse::<HeaderValue>().ok()) {
        Some(origin) => cors.allow_origin(origin),
        None => cors.allow_origin(Any),
    }
}

fn email_service() -> Option<Arc<SmtpEmailService>> {
    let config = match EmailConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            warn!("Email disabled: {e}");
            return None;
        }
    };
    match SmtpEmailService::new(config) {
        Ok(service) => Some(Arc::new(service)),
        Err(e) => {
            error!("Failed to initialize SMTP transport: {e}");
            None
        }
    }
}

fn sms_gateway() -> Option<Arc<SmsGateway>> {
    let config = match SmsConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            warn!("SMS disabled: {e}");
            return None;
        }
    };
    match SmsGateway::new(config) {
        Ok(gateway) => Some(Arc::new(gateway)),
        Err(e) => {
            error!("Failed to initialize SMS gateway client: {e}");
            None
        }
    }
}
