//! Role-based access rules.
//!
//! Every service operation asks [`authorize`] before touching storage. The rule
//! table is a pure function of role and action so it can be tested exhaustively.

use models::user::Role;

use crate::errors::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ListCourses,
    ReadCourse,
    SearchCourses,
    ListReviews,
    ViewProfile,
    Logout,
    CreateCourse,
    UpdateCourse,
    DeleteCourse,
    Enroll,
    DropEnrollment,
    ListEnrollments,
    Pay,
    ListPayments,
    Review,
}

impl Action {
    pub const ALL: [Action; 15] = [
        Action::ListCourses,
        Action::ReadCourse,
        Action::SearchCourses,
        Action::ListReviews,
        Action::ViewProfile,
        Action::Logout,
        Action::CreateCourse,
        Action::UpdateCourse,
        Action::DeleteCourse,
        Action::Enroll,
        Action::DropEnrollment,
        Action::ListEnrollments,
        Action::Pay,
        Action::ListPayments,
        Action::Review,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

pub fn authorize(role: Role, action: Action) -> Decision {
    use Action::*;
    let allowed = match action {
        ListCourses | ReadCourse | SearchCourses | ListReviews | ViewProfile | Logout => true,
        CreateCourse | UpdateCourse | DeleteCourse => role == Role::Instructor,
        Enroll | DropEnrollment | ListEnrollments | Pay | ListPayments | Review => role == Role::Student,
    };
    if allowed { Decision::Allow } else { Decision::Deny }
}

/// [`authorize`] as a `Result`, for use with `?`.
pub fn ensure(role: Role, action: Action) -> Result<(), ServiceError> {
    match authorize(role, action) {
        Decision::Allow => Ok(()),
        Decision::Deny => Err(ServiceError::forbidden()),
    }
}
