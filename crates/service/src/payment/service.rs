use std::sync::Arc;

use models::{enrollment, payment::{self, NewPayment, PaymentStatus}};
use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde::Deserialize;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::gateway::{ChargeRequest, PaymentGateway};
use super::repository::PaymentRepository;
use crate::access::{ensure, Action};
use crate::auth::domain::AuthUser;
use crate::catalog::repository::CourseRepository;
use crate::enrollment::repository::EnrollmentRepository;
use crate::enrollment::service::already_enrolled;
use crate::errors::ServiceError;
use crate::mail::{MailQueue, OutboundMail};
use crate::metrics::{ENROLLMENTS_CREATED_TOTAL, PAYMENTS_COMPLETED_TOTAL, PAYMENTS_FAILED_TOTAL};

#[derive(Debug, Clone, Deserialize)]
pub struct PayInput {
    pub course_id: Uuid,
    #[serde(default)]
    pub stripe_token: String,
}

/// What a successful payment produced.
#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub payment: payment::Model,
    pub enrollment: enrollment::Model,
}

pub struct PaymentService {
    courses: Arc<dyn CourseRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGateway>,
    mail: MailQueue,
    currency: String,
}

impl PaymentService {
    pub fn new(
        courses: Arc<dyn CourseRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        payments: Arc<dyn PaymentRepository>,
        gateway: Arc<dyn PaymentGateway>,
        mail: MailQueue,
        currency: impl Into<String>,
    ) -> Self {
        Self { courses, enrollments, payments, gateway, mail, currency: currency.into() }
    }

    /// Charge the caller for a course and enroll them.
    ///
    /// Every charge attempt that reaches the gateway leaves exactly one payment row:
    /// `completed` with the gateway id, or `failed` without one.
    #[instrument(skip(self, user, input), fields(user_id = %user.id, course_id = %input.course_id))]
    pub async fn pay(&self, user: &AuthUser, input: PayInput) -> Result<PaymentReceipt, ServiceError> {
        ensure(user.role, Action::Pay)?;
        let token = input.stripe_token.trim();
        if token.is_empty() {
            return Err(ServiceError::invalid("stripe_token", "This field may not be blank."));
        }
        let course = self.courses
            .get(input.course_id)
            .await?
            .filter(|c| c.is_active)
            .ok_or_else(|| ServiceError::not_found("Course"))?;
        if self.enrollments.find_enrollment(user.id, course.id).await?.is_some() {
            return Err(already_enrolled());
        }

        let request = ChargeRequest {
            amount_minor: to_minor_units(course.price)?,
            currency: self.currency.clone(),
            source: token.to_string(),
            description: format!("Payment for {}", course.title),
            idempotency_key: Uuid::new_v4().to_string(),
        };
        let charged = self.gateway.charge(&request).await;

        let receipt = match charged {
            Ok(receipt) => receipt,
            Err(gateway_err) => {
                PAYMENTS_FAILED_TOTAL.inc();
                warn!(error = %gateway_err, event = "payment_failed");
                let failed = NewPayment {
                    user_id: user.id,
                    course_id: course.id,
                    amount: course.price,
                    gateway_transaction_id: None,
                    status: PaymentStatus::Failed,
                };
                if let Err(record_err) = self.payments.record_payment(failed).await {
                    error!(error = %record_err, gateway_error = %gateway_err, "failed charge not recorded");
                }
                return Err(ServiceError::Gateway(gateway_err.to_string()));
            }
        };

        let completed = NewPayment {
            user_id: user.id,
            course_id: course.id,
            amount: course.price,
            gateway_transaction_id: Some(receipt.transaction_id.clone()),
            status: PaymentStatus::Completed,
        };
        let (payment, enrollment) = match self.payments.record_paid_enrollment(completed.clone()).await {
            Ok(rows) => rows,
            Err(ServiceError::Conflict(detail)) => {
                // charged but a parallel request enrolled first: keep the money trail
                error!(
                    transaction_id = %receipt.transaction_id,
                    %detail,
                    event = "payment_needs_reconciliation",
                    "charge captured for an existing enrollment"
                );
                self.payments.record_payment(completed).await?;
                PAYMENTS_COMPLETED_TOTAL.inc();
                return Err(already_enrolled());
            }
            Err(e) => {
                error!(transaction_id = %receipt.transaction_id, error = %e, "charge captured but not recorded");
                return Err(e);
            }
        };

        PAYMENTS_COMPLETED_TOTAL.inc();
        ENROLLMENTS_CREATED_TOTAL.inc();
        info!(payment_id = %payment.id, transaction_id = %receipt.transaction_id, event = "payment_completed");
        self.mail.enqueue(OutboundMail::payment_confirmation(self.mail.from_address(), &user.email, &course.title));
        Ok(PaymentReceipt { payment, enrollment })
    }

    pub async fn list(&self, user: &AuthUser) -> Result<Vec<payment::Model>, ServiceError> {
        ensure(user.role, Action::ListPayments)?;
        self.payments.list_for_user(user.id).await
    }
}

/// Price in minor units, rounding half away from zero.
pub fn to_minor_units(price: Decimal) -> Result<i64, ServiceError> {
    (price * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| ServiceError::Internal(format!("price {price} out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::{enrollment::EnrollmentStatus, user::Role};

    use crate::store::memory::{MemoryStore, MockGateway};

    struct Fixture {
        store: Arc<MemoryStore>,
        gateway: Arc<MockGateway>,
        svc: PaymentService,
        rx: tokio::sync::mpsc::Receiver<OutboundMail>,
        student: AuthUser,
        course: models::course::Model,
    }

    fn fixture(gateway: MockGateway) -> Fixture {
        let store = Arc::new(MemoryStore::default());
        let gateway = Arc::new(gateway);
        let (mail, rx) = MailQueue::channel(8, "no-reply@example.com");
        let svc = PaymentService::new(store.clone(), store.clone(), store.clone(), gateway.clone(), mail, "usd");
        let instructor = store.add_user("t@example.com", Role::Instructor);
        let student = store.add_user("s@example.com", Role::Student);
        let course = store.insert_course("Rust", instructor.id, true);
        Fixture { store, gateway, svc, rx, student, course }
    }

    fn pay_for(course_id: Uuid) -> PayInput { PayInput { course_id, stripe_token: "tok_visa".into() } }

    #[tokio::test]
    async fn success_records_one_payment_and_one_enrollment() {
        let mut f = fixture(MockGateway::approving());
        let receipt = f.svc.pay(&f.student, pay_for(f.course.id)).await.unwrap();

        assert_eq!(receipt.payment.status, PaymentStatus::Completed);
        assert!(receipt.payment.gateway_transaction_id.is_some());
        assert_eq!(receipt.enrollment.status, EnrollmentStatus::Active);

        let payments = f.svc.list(&f.student).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(f.store.list_for_student(f.student.id).await.unwrap().len(), 1);

        let charge = f.gateway.last_request().unwrap();
        assert_eq!(charge.amount_minor, 4999);
        assert_eq!(charge.currency, "usd");

        let mail = f.rx.try_recv().unwrap();
        assert_eq!(mail.to, "s@example.com");
        assert_eq!(mail.subject, "Payment Confirmation");
    }

    #[tokio::test]
    async fn decline_records_failed_payment_without_enrollment() {
        let mut f = fixture(MockGateway::declining("Your card was declined."));
        let err = f.svc.pay(&f.student, pay_for(f.course.id)).await.unwrap_err();
        match err {
            ServiceError::Gateway(msg) => assert_eq!(msg, "Your card was declined."),
            other => panic!("unexpected {other:?}"),
        }
        let payments = f.svc.list(&f.student).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].status, PaymentStatus::Failed);
        assert!(payments[0].gateway_transaction_id.is_none());
        assert!(f.store.list_for_student(f.student.id).await.unwrap().is_empty());
        assert!(f.rx.try_recv().is_err());
    }

    /// Payment writes fail; reads go to the shared store.
    struct LedgerDown(Arc<MemoryStore>);

    #[async_trait::async_trait]
    impl PaymentRepository for LedgerDown {
        async fn record_payment(&self, _payment: NewPayment) -> Result<payment::Model, ServiceError> {
            Err(ServiceError::Db("connection reset".into()))
        }
        async fn record_paid_enrollment(&self, payment: NewPayment) -> Result<(payment::Model, enrollment::Model), ServiceError> {
            self.0.record_paid_enrollment(payment).await
        }
        async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<payment::Model>, ServiceError> {
            PaymentRepository::list_for_user(self.0.as_ref(), user_id).await
        }
    }

    #[tokio::test]
    async fn decline_is_reported_even_when_recording_it_fails() {
        let f = fixture(MockGateway::declining("Your card was declined."));
        let (mail, _rx) = MailQueue::channel(8, "no-reply@example.com");
        let svc = PaymentService::new(
            f.store.clone(),
            f.store.clone(),
            Arc::new(LedgerDown(f.store.clone())),
            f.gateway.clone(),
            mail,
            "usd",
        );
        match svc.pay(&f.student, pay_for(f.course.id)).await.unwrap_err() {
            ServiceError::Gateway(msg) => assert_eq!(msg, "Your card was declined."),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(f.gateway.calls(), 1);
    }

    #[tokio::test]
    async fn already_enrolled_student_is_not_charged() {
        let f = fixture(MockGateway::approving());
        f.store.create_enrollment(f.student.id, f.course.id).await.unwrap();
        let err = f.svc.pay(&f.student, pay_for(f.course.id)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(f.gateway.calls(), 0);
        assert!(f.svc.list(&f.student).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_or_inactive_course_writes_nothing() {
        let f = fixture(MockGateway::approving());
        let retired = f.store.insert_course("Retired", f.course.instructor_id.unwrap(), false);
        for id in [Uuid::new_v4(), retired.id] {
            assert!(matches!(f.svc.pay(&f.student, pay_for(id)).await, Err(ServiceError::NotFound(_))));
        }
        assert_eq!(f.gateway.calls(), 0);
        assert!(f.svc.list(&f.student).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_token_and_wrong_role_are_rejected_before_charging() {
        let f = fixture(MockGateway::approving());
        let blank = PayInput { course_id: f.course.id, stripe_token: "  ".into() };
        assert!(matches!(f.svc.pay(&f.student, blank).await, Err(ServiceError::Validation(_))));
        let instructor = f.store.add_user("i@example.com", Role::Instructor);
        assert!(matches!(f.svc.pay(&instructor, pay_for(f.course.id)).await, Err(ServiceError::Forbidden(_))));
        assert_eq!(f.gateway.calls(), 0);
    }

    #[tokio::test]
    async fn enrollment_race_keeps_the_completed_payment() {
        let f = fixture(MockGateway::approving());
        // another request enrolls while the charge is in flight
        f.gateway.on_charge({
            let store = f.store.clone();
            let (student, course) = (f.student.id, f.course.id);
            move || store.force_enrollment(student, course)
        });
        let err = f.svc.pay(&f.student, pay_for(f.course.id)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let payments = f.svc.list(&f.student).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].status, PaymentStatus::Completed);
        assert_eq!(f.store.list_for_student(f.student.id).await.unwrap().len(), 1);
    }

    #[test]
    fn minor_units_round_half_away_from_zero() {
        assert_eq!(to_minor_units(Decimal::new(4999, 2)).unwrap(), 4999);
        assert_eq!(to_minor_units(Decimal::ZERO).unwrap(), 0);
        assert_eq!(to_minor_units(Decimal::new(10005, 3)).unwrap(), 1001);
        assert_eq!(to_minor_units(Decimal::new(120, 0)).unwrap(), 12000);
    }
}
