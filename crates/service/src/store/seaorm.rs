use async_trait::async_trait;
use models::{
    auth_token, course, enrollment::{self, EnrollmentStatus}, errors::ModelError,
    payment::{self, NewPayment}, review, user, user_credentials,
};
use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};
use uuid::Uuid;

use crate::auth::domain::{AuthUser, Credentials, NewUser};
use crate::auth::repository::AuthRepository;
use crate::catalog::repository::CourseRepository;
use crate::enrollment::repository::EnrollmentRepository;
use crate::errors::ServiceError;
use crate::payment::repository::PaymentRepository;
use crate::review::repository::ReviewRepository;

/// Every repository trait over one PostgreSQL pool.
#[derive(Clone)]
pub struct SeaOrmStore {
    pub db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

fn db_err(e: DbErr) -> ServiceError { ModelError::from(e).into() }

#[async_trait]
impl AuthRepository for SeaOrmStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, ServiceError> {
        Ok(user::find_by_email(&self.db, email).await?.map(AuthUser::from))
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<AuthUser>, ServiceError> {
        Ok(user::find_by_id(&self.db, id).await?.map(AuthUser::from))
    }

    async fn create_user(&self, new: NewUser, password_hash: String, password_algorithm: String) -> Result<AuthUser, ServiceError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let created = user::create(&txn, &new.email, &new.username, new.role, new.bio).await?;
        user_credentials::upsert_password(&txn, created.id, password_hash, &password_algorithm).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(created.into())
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, ServiceError> {
        let res = user_credentials::find_by_user(&self.db, user_id).await?;
        Ok(res.map(|c| Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm }))
    }

    async fn issue_token(&self, user_id: Uuid, fresh_key: String) -> Result<String, ServiceError> {
        Ok(auth_token::get_or_create(&self.db, user_id, fresh_key).await?.key)
    }

    async fn find_user_by_token(&self, key: &str) -> Result<Option<AuthUser>, ServiceError> {
        let Some(token) = auth_token::find_by_key(&self.db, key).await? else {
            return Ok(None);
        };
        Ok(user::find_by_id(&self.db, token.user_id).await?.map(AuthUser::from))
    }

    async fn revoke_token(&self, user_id: Uuid) -> Result<bool, ServiceError> {
        Ok(auth_token::delete_for_user(&self.db, user_id).await? > 0)
    }
}

#[async_trait]
impl CourseRepository for SeaOrmStore {
    async fn list_active(&self, page_idx: u64, per_page: u64) -> Result<(Vec<course::Model>, u64), ServiceError> {
        Ok(course::list_active(&self.db, page_idx, per_page).await?)
    }

    async fn search(&self, query: &str, limit: u64) -> Result<Vec<course::Model>, ServiceError> {
        Ok(course::search(&self.db, query, limit).await?)
    }

    async fn get(&self, id: Uuid) -> Result<Option<course::Model>, ServiceError> {
        Ok(course::find_by_id(&self.db, id).await?)
    }

    async fn create(&self, input: course::NewCourse) -> Result<course::Model, ServiceError> {
        Ok(course::create(&self.db, input).await?)
    }

    async fn update(&self, id: Uuid, changes: course::CourseChanges) -> Result<course::Model, ServiceError> {
        Ok(course::update(&self.db, id, changes).await?)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
        Ok(course::delete(&self.db, id).await?)
    }

    async fn users_by_ids(&self, ids: Vec<Uuid>) -> Result<Vec<user::Model>, ServiceError> {
        Ok(user::find_by_ids(&self.db, ids).await?)
    }
}

#[async_trait]
impl EnrollmentRepository for SeaOrmStore {
    async fn find_enrollment(&self, student_id: Uuid, course_id: Uuid) -> Result<Option<enrollment::Model>, ServiceError> {
        Ok(enrollment::find_pair(&self.db, student_id, course_id).await?)
    }

    async fn create_enrollment(&self, student_id: Uuid, course_id: Uuid) -> Result<enrollment::Model, ServiceError> {
        Ok(enrollment::create(&self.db, student_id, course_id).await?)
    }

    async fn set_status(&self, id: Uuid, status: EnrollmentStatus) -> Result<enrollment::Model, ServiceError> {
        Ok(enrollment::set_status(&self.db, id, status).await?)
    }

    async fn list_for_student(&self, student_id: Uuid) -> Result<Vec<enrollment::Model>, ServiceError> {
        Ok(enrollment::list_for_student(&self.db, student_id).await?)
    }
}

#[async_trait]
impl PaymentRepository for SeaOrmStore {
    async fn record_payment(&self, input: NewPayment) -> Result<payment::Model, ServiceError> {
        Ok(payment::create(&self.db, input).await?)
    }

    async fn record_paid_enrollment(&self, input: NewPayment) -> Result<(payment::Model, enrollment::Model), ServiceError> {
        // dropping the transaction on any early return rolls both writes back
        let txn = self.db.begin().await.map_err(db_err)?;
        let enrolled = enrollment::create(&txn, input.user_id, input.course_id).await?;
        let paid = payment::create(&txn, input).await?;
        txn.commit().await.map_err(db_err)?;
        Ok((paid, enrolled))
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<payment::Model>, ServiceError> {
        Ok(payment::list_for_user(&self.db, user_id).await?)
    }
}

#[async_trait]
impl ReviewRepository for SeaOrmStore {
    async fn find_review(&self, student_id: Uuid, course_id: Uuid) -> Result<Option<review::Model>, ServiceError> {
        Ok(review::find_pair(&self.db, student_id, course_id).await?)
    }

    async fn create_review(&self, student_id: Uuid, course_id: Uuid, rating: i16, comment: &str) -> Result<review::Model, ServiceError> {
        Ok(review::create(&self.db, student_id, course_id, rating, comment).await?)
    }

    async fn list_for_course(&self, course_id: Uuid) -> Result<Vec<review::Model>, ServiceError> {
        Ok(review::list_for_course(&self.db, course_id).await?)
    }
}
