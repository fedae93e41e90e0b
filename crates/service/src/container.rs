use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::auth::{repository::AuthRepository, service::AuthConfig, AuthService};
use crate::cache::CourseListCache;
use crate::catalog::{repository::CourseRepository, CatalogService};
use crate::enrollment::{repository::EnrollmentRepository, EnrollmentService};
use crate::mail::MailQueue;
use crate::payment::{repository::PaymentRepository, PaymentGateway, PaymentService};
use crate::review::{repository::ReviewRepository, ReviewService};
use crate::store::{MemoryStore, SeaOrmStore};

/// One handle per persistence seam.
#[derive(Clone)]
pub struct Repositories {
    pub auth: Arc<dyn AuthRepository>,
    pub courses: Arc<dyn CourseRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
}

impl Repositories {
    /// Share one store across every seam.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: AuthRepository + CourseRepository + EnrollmentRepository + PaymentRepository + ReviewRepository + 'static,
    {
        Self {
            auth: store.clone(),
            courses: store.clone(),
            enrollments: store.clone(),
            payments: store.clone(),
            reviews: store,
        }
    }

    pub fn seaorm(db: DatabaseConnection) -> Self { Self::from_store(Arc::new(SeaOrmStore::new(db))) }

    pub fn memory(store: Arc<MemoryStore>) -> Self { Self::from_store(store) }
}

/// Everything the HTTP layer calls into.
#[derive(Clone)]
pub struct Services {
    pub auth: Arc<AuthService>,
    pub catalog: Arc<CatalogService>,
    pub enrollments: Arc<EnrollmentService>,
    pub payments: Arc<PaymentService>,
    pub reviews: Arc<ReviewService>,
}

impl Services {
    pub fn new(
        repos: Repositories,
        gateway: Arc<dyn PaymentGateway>,
        cache: Arc<CourseListCache>,
        mail: MailQueue,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            auth: Arc::new(AuthService::new(repos.auth.clone(), AuthConfig::default())),
            catalog: Arc::new(CatalogService::new(repos.courses.clone(), cache)),
            enrollments: Arc::new(EnrollmentService::new(repos.courses.clone(), repos.enrollments.clone())),
            payments: Arc::new(PaymentService::new(
                repos.courses.clone(),
                repos.enrollments.clone(),
                repos.payments.clone(),
                gateway,
                mail,
                currency,
            )),
            reviews: Arc::new(ReviewService::new(repos.courses, repos.enrollments, repos.reviews)),
        }
    }
}
