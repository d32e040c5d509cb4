use std::sync::Arc;

use crate::config::SiteSettings;
use crate::repository::{AnnouncementRepository, EventRepository, JobRepository, PaymentRepository, UserRepository};
use crate::service::{
    AdminService, AdminServiceImpl, AnnouncementService, AnnouncementServiceImpl, AuthService, AuthServiceImpl,
    EventService, EventServiceImpl, JobService, JobServiceImpl, NotificationService, UserService, UserServiceImpl,
};
use crate::util::jwt::JwtTokenUtilsImpl;

/// Storage handles the services are built on
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub events: Arc<dyn EventRepository>,
    pub announcements: Arc<dyn AnnouncementRepository>,
    pub jobs: Arc<dyn JobRepository>,
    pub payments: Arc<dyn PaymentRepository>,
}

/// Shared by every handler and middleware
#[derive(Clone)]
pub struct AppState {
    pub jwt_utils: Arc<JwtTokenUtilsImpl>,
    pub auth_service: Arc<dyn AuthService>,
    pub user_service: Arc<dyn UserService>,
    pub event_service: Arc<dyn EventService>,
    pub announcement_service: Arc<dyn AnnouncementService>,
    pub job_service: Arc<dyn JobService>,
    pub admin_service: Arc<dyn AdminService>,
}

impl AppState {
    pub fn new(
        repos: Repositories,
        jwt_utils: Arc<JwtTokenUtilsImpl>,
        notifier: Arc<dyn NotificationService>,
        site: SiteSettings,
    ) -> Self {
        AppState {
            auth_service: Arc::new(AuthServiceImpl::new(repos.users.clone(), jwt_utils.clone())),
            user_service: Arc::new(UserServiceImpl::new(repos.users.clone())),
            event_service: Arc::new(EventServiceImpl::new(
                repos.events.clone(),
                repos.users.clone(),
                notifier.clone(),
            )),
            announcement_service: Arc::new(AnnouncementServiceImpl::new(
                repos.announcements.clone(),
                repos.users.clone(),
            )),
            job_service: Arc::new(JobServiceImpl::new(repos.jobs.clone(), repos.users.clone())),
            admin_service: Arc::new(AdminServiceImpl::new(
                repos.users,
                repos.events,
                repos.announcements,
                repos.jobs,
                repos.payments,
                notifier,
                site,
            )),
            jwt_utils,
        }
    }
}
