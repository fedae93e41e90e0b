use chrono::{DateTime, FixedOffset};
use models::{course, user::{self, Role}};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::validation::{not_blank, price_fits};

/// Public profile nested into course payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub bio: Option<String>,
}

impl From<user::Model> for UserSummary {
    fn from(u: user::Model) -> Self {
        Self { id: u.id, email: u.email, username: u.username, role: u.role, bio: u.bio }
    }
}

/// Course as returned to clients, instructor resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub instructor: Option<UserSummary>,
    pub price: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl CourseView {
    pub fn new(course: course::Model, instructor: Option<UserSummary>) -> Self {
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            instructor,
            price: course.price,
            is_active: course.is_active,
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }
}

/// Full course body, used by create and PUT.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CourseInput {
    #[validate(
        custom(function = "not_blank"),
        length(max = 250, message = "Ensure this field has no more than 250 characters.")
    )]
    pub title: String,
    #[validate(custom(function = "not_blank"))]
    pub description: String,
    #[validate(custom(function = "price_fits"))]
    pub price: Decimal,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// PATCH body; absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CoursePatch {
    #[validate(
        custom(function = "not_blank"),
        length(max = 250, message = "Ensure this field has no more than 250 characters.")
    )]
    pub title: Option<String>,
    #[validate(custom(function = "not_blank"))]
    pub description: Option<String>,
    #[validate(custom(function = "price_fits"))]
    pub price: Option<Decimal>,
    pub is_active: Option<bool>,
}

impl From<CourseInput> for CoursePatch {
    fn from(input: CourseInput) -> Self {
        Self {
            title: Some(input.title),
            description: Some(input.description),
            price: Some(input.price),
            is_active: input.is_active,
        }
    }
}

impl From<CoursePatch> for course::CourseChanges {
    fn from(p: CoursePatch) -> Self {
        Self { title: p.title, description: p.description, price: p.price, is_active: p.is_active }
    }
}

impl From<&crate::auth::domain::AuthUser> for UserSummary {
    fn from(u: &crate::auth::domain::AuthUser) -> Self {
        Self { id: u.id, email: u.email.clone(), username: u.username.clone(), role: u.role, bio: u.bio.clone() }
    }
}
