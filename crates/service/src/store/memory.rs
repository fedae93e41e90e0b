//! In-process store and doubles for the external seams.
//!
//! `MemoryStore` enforces the same unique keys as the database schema so
//! service tests exercise the conflict paths without PostgreSQL.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use models::{
    course::{self, CourseChanges, NewCourse},
    enrollment::{self, EnrollmentStatus},
    payment::{self, NewPayment, PaymentStatus},
    review,
    user::{self, Role},
};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

use crate::auth::domain::{AuthUser, Credentials, NewUser};
use crate::auth::repository::AuthRepository;
use crate::catalog::repository::CourseRepository;
use crate::enrollment::repository::EnrollmentRepository;
use crate::errors::ServiceError;
use crate::mail::{MailError, Mailer, OutboundMail};
use crate::payment::gateway::{ChargeReceipt, ChargeRequest, GatewayError, PaymentGateway};
use crate::payment::repository::PaymentRepository;
use crate::review::repository::ReviewRepository;

fn now() -> DateTimeWithTimeZone { Utc::now().into() }

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> { m.lock().unwrap_or_else(PoisonError::into_inner) }

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, user::Model>,
    credentials: HashMap<Uuid, Credentials>,
    /// token key -> user id
    tokens: HashMap<String, Uuid>,
    courses: HashMap<Uuid, course::Model>,
    // insertion order is creation order
    enrollments: Vec<enrollment::Model>,
    payments: Vec<payment::Model>,
    reviews: Vec<review::Model>,
}

impl Tables {
    fn user_by_email(&self, email: &str) -> Option<&user::Model> {
        let email = user::normalize_email(email);
        self.users.values().find(|u| u.email == email)
    }

    fn enrollment_pair(&self, student_id: Uuid, course_id: Uuid) -> Option<&enrollment::Model> {
        self.enrollments.iter().find(|e| e.student_id == student_id && e.course_id == course_id)
    }

    fn insert_enrollment(&mut self, student_id: Uuid, course_id: Uuid) -> Result<enrollment::Model, ServiceError> {
        if self.enrollment_pair(student_id, course_id).is_some() {
            return Err(ServiceError::Conflict("uniq_enrollment_student_course".into()));
        }
        let row = enrollment::Model {
            id: Uuid::new_v4(),
            student_id,
            course_id,
            enrollment_date: now(),
            status: EnrollmentStatus::Active,
        };
        self.enrollments.push(row.clone());
        Ok(row)
    }

    fn insert_payment(&mut self, input: NewPayment) -> Result<payment::Model, ServiceError> {
        let txn_id = input.gateway_transaction_id.filter(|id| !id.is_empty());
        if input.status == PaymentStatus::Completed && txn_id.is_none() {
            return Err(ServiceError::Internal("completed payment requires a gateway transaction id".into()));
        }
        if let Some(id) = &txn_id {
            if self.payments.iter().any(|p| p.gateway_transaction_id.as_ref() == Some(id)) {
                return Err(ServiceError::Conflict("payment_gateway_transaction_id_key".into()));
            }
        }
        let row = payment::Model {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            course_id: input.course_id,
            amount: input.amount,
            gateway_transaction_id: txn_id,
            status: input.status,
            created_at: now(),
        };
        self.payments.push(row.clone());
        Ok(row)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn tables(&self) -> MutexGuard<'_, Tables> { lock(&self.tables) }

    /// Seed an active user without credentials.
    pub fn add_user(&self, email: &str, role: Role) -> AuthUser {
        let username = email.split('@').next().unwrap_or(email).to_string();
        let row = user::Model {
            id: Uuid::new_v4(),
            email: user::normalize_email(email),
            username,
            role,
            bio: None,
            is_active: true,
            created_at: now(),
            updated_at: now(),
        };
        self.tables().users.insert(row.id, row.clone());
        row.into()
    }

    /// Seed a course priced at 49.99 without touching any cache.
    pub fn insert_course(&self, title: &str, instructor_id: Uuid, is_active: bool) -> course::Model {
        let row = course::Model {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: format!("About {title}"),
            price: Decimal::new(4999, 2),
            instructor_id: Some(instructor_id),
            is_active,
            created_at: now(),
            updated_at: now(),
        };
        self.tables().courses.insert(row.id, row.clone());
        row
    }

    /// Insert an active enrollment unless one exists, as a concurrent request would.
    pub fn force_enrollment(&self, student_id: Uuid, course_id: Uuid) {
        let _ = self.tables().insert_enrollment(student_id, course_id);
    }
}

#[async_trait]
impl AuthRepository for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, ServiceError> {
        Ok(self.tables().user_by_email(email).cloned().map(AuthUser::from))
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<AuthUser>, ServiceError> {
        Ok(self.tables().users.get(&id).cloned().map(AuthUser::from))
    }

    async fn create_user(&self, new: NewUser, password_hash: String, password_algorithm: String) -> Result<AuthUser, ServiceError> {
        let mut t = self.tables();
        if t.user_by_email(&new.email).is_some() {
            return Err(ServiceError::Conflict("user_email_key".into()));
        }
        let row = user::Model {
            id: Uuid::new_v4(),
            email: user::normalize_email(&new.email),
            username: new.username,
            role: new.role,
            bio: new.bio,
            is_active: true,
            created_at: now(),
            updated_at: now(),
        };
        t.credentials.insert(row.id, Credentials { user_id: row.id, password_hash, password_algorithm });
        t.users.insert(row.id, row.clone());
        Ok(row.into())
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, ServiceError> {
        Ok(self.tables().credentials.get(&user_id).cloned())
    }

    async fn issue_token(&self, user_id: Uuid, fresh_key: String) -> Result<String, ServiceError> {
        let mut t = self.tables();
        if let Some((key, _)) = t.tokens.iter().find(|(_, uid)| **uid == user_id) {
            return Ok(key.clone());
        }
        t.tokens.insert(fresh_key.clone(), user_id);
        Ok(fresh_key)
    }

    async fn find_user_by_token(&self, key: &str) -> Result<Option<AuthUser>, ServiceError> {
        let t = self.tables();
        Ok(t.tokens.get(key).and_then(|uid| t.users.get(uid)).cloned().map(AuthUser::from))
    }

    async fn revoke_token(&self, user_id: Uuid) -> Result<bool, ServiceError> {
        let mut t = self.tables();
        let before = t.tokens.len();
        t.tokens.retain(|_, uid| *uid != user_id);
        Ok(t.tokens.len() != before)
    }
}

/// Lowercased alphanumeric words.
fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Every query term must appear; a title hit weighs more than a description hit,
/// like the A/B weights of the database search vector.
fn rank(course: &course::Model, terms: &[String]) -> Option<f32> {
    let title = words(&course.title);
    let description = words(&course.description);
    let mut score = 0.0;
    for term in terms {
        let in_title = title.iter().filter(|w| *w == term).count() as f32;
        let in_description = description.iter().filter(|w| *w == term).count() as f32;
        if in_title + in_description == 0.0 {
            return None;
        }
        score += in_title + 0.4 * in_description;
    }
    Some(score)
}

#[async_trait]
impl CourseRepository for MemoryStore {
    async fn list_active(&self, page_idx: u64, per_page: u64) -> Result<(Vec<course::Model>, u64), ServiceError> {
        let t = self.tables();
        let mut active: Vec<&course::Model> = t.courses.values().filter(|c| c.is_active).collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        let total = active.len() as u64;
        let rows = active
            .into_iter()
            .skip((page_idx * per_page) as usize)
            .take(per_page as usize)
            .cloned()
            .collect();
        Ok((rows, total))
    }

    async fn search(&self, query: &str, limit: u64) -> Result<Vec<course::Model>, ServiceError> {
        let terms: Vec<String> = words(query).into_iter().filter(|w| w != "or" && w != "and").collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let t = self.tables();
        let mut hits: Vec<(f32, &course::Model)> = t.courses
            .values()
            .filter(|c| c.is_active)
            .filter_map(|c| rank(c, &terms).map(|r| (r, c)))
            .collect();
        hits.sort_by(|(ra, a), (rb, b)| rb.total_cmp(ra).then(b.created_at.cmp(&a.created_at)));
        Ok(hits.into_iter().take(limit as usize).map(|(_, c)| c.clone()).collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<course::Model>, ServiceError> {
        Ok(self.tables().courses.get(&id).cloned())
    }

    async fn create(&self, input: NewCourse) -> Result<course::Model, ServiceError> {
        let row = course::Model {
            id: Uuid::new_v4(),
            title: input.title.trim().to_string(),
            description: input.description,
            price: input.price,
            instructor_id: input.instructor_id,
            is_active: input.is_active,
            created_at: now(),
            updated_at: now(),
        };
        self.tables().courses.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: Uuid, changes: CourseChanges) -> Result<course::Model, ServiceError> {
        let mut t = self.tables();
        let row = t.courses.get_mut(&id).ok_or_else(|| ServiceError::not_found("Course"))?;
        if let Some(title) = changes.title {
            row.title = title.trim().to_string();
        }
        if let Some(description) = changes.description {
            row.description = description;
        }
        if let Some(price) = changes.price {
            row.price = price;
        }
        if let Some(active) = changes.is_active {
            row.is_active = active;
        }
        row.updated_at = now();
        Ok(row.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
        let mut t = self.tables();
        if t.payments.iter().any(|p| p.course_id == id) {
            return Err(ServiceError::Conflict("fk_payment_course".into()));
        }
        let removed = t.courses.remove(&id).is_some();
        if removed {
            t.enrollments.retain(|e| e.course_id != id);
            t.reviews.retain(|r| r.course_id != id);
        }
        Ok(removed)
    }

    async fn users_by_ids(&self, ids: Vec<Uuid>) -> Result<Vec<user::Model>, ServiceError> {
        let t = self.tables();
        Ok(ids.iter().filter_map(|id| t.users.get(id).cloned()).collect())
    }
}

#[async_trait]
impl EnrollmentRepository for MemoryStore {
    async fn find_enrollment(&self, student_id: Uuid, course_id: Uuid) -> Result<Option<enrollment::Model>, ServiceError> {
        Ok(self.tables().enrollment_pair(student_id, course_id).cloned())
    }

    async fn create_enrollment(&self, student_id: Uuid, course_id: Uuid) -> Result<enrollment::Model, ServiceError> {
        self.tables().insert_enrollment(student_id, course_id)
    }

    async fn set_status(&self, id: Uuid, status: EnrollmentStatus) -> Result<enrollment::Model, ServiceError> {
        let mut t = self.tables();
        let row = t.enrollments
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| ServiceError::not_found("Enrollment"))?;
        row.status = status;
        Ok(row.clone())
    }

    async fn list_for_student(&self, student_id: Uuid) -> Result<Vec<enrollment::Model>, ServiceError> {
        Ok(self.tables().enrollments.iter().rev().filter(|e| e.student_id == student_id).cloned().collect())
    }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    async fn record_payment(&self, input: NewPayment) -> Result<payment::Model, ServiceError> {
        self.tables().insert_payment(input)
    }

    async fn record_paid_enrollment(&self, input: NewPayment) -> Result<(payment::Model, enrollment::Model), ServiceError> {
        let mut t = self.tables();
        // enrollment first so a duplicate leaves no payment behind
        let enrolled = t.insert_enrollment(input.user_id, input.course_id)?;
        match t.insert_payment(input) {
            Ok(paid) => Ok((paid, enrolled)),
            Err(e) => {
                t.enrollments.retain(|row| row.id != enrolled.id);
                Err(e)
            }
        }
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<payment::Model>, ServiceError> {
        Ok(self.tables().payments.iter().rev().filter(|p| p.user_id == user_id).cloned().collect())
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn find_review(&self, student_id: Uuid, course_id: Uuid) -> Result<Option<review::Model>, ServiceError> {
        Ok(self.tables().reviews.iter().find(|r| r.student_id == student_id && r.course_id == course_id).cloned())
    }

    async fn create_review(&self, student_id: Uuid, course_id: Uuid, rating: i16, comment: &str) -> Result<review::Model, ServiceError> {
        let mut t = self.tables();
        if t.reviews.iter().any(|r| r.student_id == student_id && r.course_id == course_id) {
            return Err(ServiceError::Conflict("uniq_review_student_course".into()));
        }
        let row = review::Model {
            id: Uuid::new_v4(),
            student_id,
            course_id,
            rating,
            comment: comment.to_string(),
            created_at: now(),
        };
        t.reviews.push(row.clone());
        Ok(row)
    }

    async fn list_for_course(&self, course_id: Uuid) -> Result<Vec<review::Model>, ServiceError> {
        Ok(self.tables().reviews.iter().rev().filter(|r| r.course_id == course_id).cloned().collect())
    }
}

type ChargeHook = Box<dyn Fn() + Send + Sync>;

/// Scripted gateway: approves with a fresh `ch_mock_*` id or declines with a fixed message.
pub struct MockGateway {
    decline: Option<String>,
    calls: AtomicUsize,
    last: Mutex<Option<ChargeRequest>>,
    hook: Mutex<Option<ChargeHook>>,
}

impl MockGateway {
    pub fn approving() -> Self { Self::with_outcome(None) }

    pub fn declining(message: impl Into<String>) -> Self { Self::with_outcome(Some(message.into())) }

    fn with_outcome(decline: Option<String>) -> Self {
        Self { decline, calls: AtomicUsize::new(0), last: Mutex::new(None), hook: Mutex::new(None) }
    }

    /// Run `f` during each charge, before the outcome is returned.
    pub fn on_charge(&self, f: impl Fn() + Send + Sync + 'static) {
        *lock(&self.hook) = Some(Box::new(f));
    }

    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

    pub fn last_request(&self) -> Option<ChargeRequest> { lock(&self.last).clone() }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeReceipt, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last) = Some(request.clone());
        if let Some(hook) = lock(&self.hook).as_ref() {
            hook();
        }
        match &self.decline {
            Some(message) => Err(GatewayError::Declined(message.clone())),
            None => Ok(ChargeReceipt { transaction_id: format!("ch_mock_{}", Uuid::new_v4().simple()) }),
        }
    }
}

/// Keeps every delivered message for inspection.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutboundMail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutboundMail> { lock(&self.sent).clone() }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: &OutboundMail) -> Result<(), MailError> {
        lock(&self.sent).push(mail.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enrollment_pair_is_unique() {
        let store = MemoryStore::default();
        let (s, c) = (Uuid::new_v4(), Uuid::new_v4());
        store.create_enrollment(s, c).await.unwrap();
        assert!(matches!(store.create_enrollment(s, c).await, Err(ServiceError::Conflict(_))));
    }

    #[tokio::test]
    async fn paid_enrollment_rolls_back_on_duplicate_transaction_id() {
        let store = MemoryStore::default();
        let paid = |user_id| NewPayment {
            user_id,
            course_id: Uuid::new_v4(),
            amount: Decimal::ONE,
            gateway_transaction_id: Some("ch_same".into()),
            status: PaymentStatus::Completed,
        };
        let first = Uuid::new_v4();
        store.record_paid_enrollment(paid(first)).await.unwrap();
        let second = Uuid::new_v4();
        assert!(store.record_paid_enrollment(paid(second)).await.is_err());
        assert!(store.list_for_student(second).await.unwrap().is_empty());
    }

    #[test]
    fn ranking_prefers_title_hits() {
        let mk = |title: &str, description: &str| course::Model {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            price: Decimal::ZERO,
            instructor_id: None,
            is_active: true,
            created_at: now(),
            updated_at: now(),
        };
        let terms = words("Python");
        let titled = rank(&mk("Python basics", "intro"), &terms).unwrap();
        let mentioned = rank(&mk("Data", "uses python"), &terms).unwrap();
        assert!(titled > mentioned);
        assert!(rank(&mk("Gardening", "soil"), &terms).is_none());
    }
}
