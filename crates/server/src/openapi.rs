//! Schema-only mirrors of the wire types, kept apart so the service crate
//! does not depend on utoipa.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct MessageDoc { pub message: String }

#[derive(ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    /// At least six characters
    pub password: String,
    /// `student` (default) or `instructor`
    pub role: Option<String>,
    pub bio: Option<String>,
}

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct UserDoc { pub id: Uuid, pub email: String, pub username: String, pub role: String }

#[derive(ToSchema)]
pub struct ProfileDoc {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub role: String,
    pub bio: Option<String>,
}

#[derive(ToSchema)]
pub struct LoginDoc { pub token: String, pub user: UserDoc }

#[derive(ToSchema)]
pub struct InstructorDoc {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub role: String,
    pub bio: Option<String>,
}

#[derive(ToSchema)]
pub struct CourseDoc {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[schema(example = "49.99")]
    pub price: String,
    pub instructor: Option<InstructorDoc>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(ToSchema)]
pub struct CoursePageDoc { pub count: u64, pub page: u32, pub page_size: u32, pub results: Vec<CourseDoc> }

#[derive(ToSchema)]
pub struct CourseRequest {
    pub title: String,
    pub description: String,
    #[schema(example = "49.99")]
    pub price: String,
    pub is_active: Option<bool>,
}

#[derive(ToSchema)]
pub struct CoursePatchRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(ToSchema)]
pub struct EnrollmentDoc {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub enrollment_date: String,
    /// `active`, `completed` or `dropped`
    pub status: String,
}

#[derive(ToSchema)]
pub struct PayRequest {
    pub course_id: Uuid,
    /// Card token produced by the gateway's client library
    pub stripe_token: String,
}

#[derive(ToSchema)]
pub struct PaymentDoc {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub amount: String,
    pub gateway_transaction_id: Option<String>,
    /// `pending`, `completed` or `failed`
    pub status: String,
    pub created_at: String,
}

#[derive(ToSchema)]
pub struct ReviewRequest {
    /// 1 through 5
    pub rating: i16,
    pub comment: Option<String>,
}

#[derive(ToSchema)]
pub struct ReviewDoc {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub rating: i16,
    pub comment: String,
    pub created_at: String,
}

struct TokenAuth;

impl Modify for TokenAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "Authorization",
                    "`Token <key>` as returned by /api/login/",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::metrics::metrics,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::courses::list,
        crate::routes::courses::search,
        crate::routes::courses::create,
        crate::routes::courses::get,
        crate::routes::courses::replace,
        crate::routes::courses::patch,
        crate::routes::courses::delete,
        crate::routes::enrollments::enroll,
        crate::routes::enrollments::drop_enrollment,
        crate::routes::enrollments::list,
        crate::routes::payments::pay,
        crate::routes::payments::list,
        crate::routes::reviews::list,
        crate::routes::reviews::submit,
    ),
    components(
        schemas(
            HealthResponse,
            MessageDoc,
            RegisterRequest,
            LoginRequest,
            UserDoc,
            ProfileDoc,
            LoginDoc,
            InstructorDoc,
            CourseDoc,
            CoursePageDoc,
            CourseRequest,
            CoursePatchRequest,
            EnrollmentDoc,
            PayRequest,
            PaymentDoc,
            ReviewRequest,
            ReviewDoc,
        )
    ),
    modifiers(&TokenAuth),
    security(("token" = [])),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "courses"),
        (name = "enrollments"),
        (name = "payments"),
        (name = "reviews")
    )
)]
pub struct ApiDoc;
