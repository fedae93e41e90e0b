use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use common::pagination::{Page, Pagination};
use models::course::{self, NewCourse};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::domain::{CourseInput, CoursePatch, CourseView, UserSummary};
use super::repository::CourseRepository;
use crate::access::{ensure, Action};
use crate::auth::domain::AuthUser;
use crate::cache::{CourseListCache, CoursePage};
use crate::errors::{ServiceError, NON_FIELD};
use crate::validation;

/// Deleting a course with recorded payments is refused so the history stays intact.
pub const COURSE_HAS_PAYMENTS: &str = "This course has payments and cannot be deleted.";

pub struct CatalogService {
    repo: Arc<dyn CourseRepository>,
    cache: Arc<CourseListCache>,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn CourseRepository>, cache: Arc<CourseListCache>) -> Self { Self { repo, cache } }

    /// One page of active courses, newest first. Pages are served from the list cache
    /// until the TTL runs out or a course write invalidates them.
    #[instrument(skip(self, user), fields(user_id = %user.id, page = opts.page, page_size = opts.page_size))]
    pub async fn list(&self, user: &AuthUser, opts: Pagination) -> Result<CoursePage, ServiceError> {
        ensure(user.role, Action::ListCourses)?;
        let key = opts.normalized();
        if let Some(page) = self.cache.get(&key).await {
            debug!("course list served from cache");
            return Ok(page);
        }
        let generation = self.cache.generation();
        let (page_idx, per_page) = key.normalize();
        let (rows, total) = self.repo.list_active(page_idx, per_page).await?;
        let results = self.with_instructors(rows).await?;
        let page = Arc::new(Page::new(total, key, results));
        self.cache.insert_if_current(key, page.clone(), generation).await;
        Ok(page)
    }

    /// Ranked full-text search over active courses.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn search(&self, user: &AuthUser, query: Option<&str>) -> Result<Vec<CourseView>, ServiceError> {
        ensure(user.role, Action::SearchCourses)?;
        let query = query.map(str::trim).unwrap_or_default();
        if query.is_empty() {
            return Err(ServiceError::invalid("q", "Search query is required."));
        }
        let rows = self.repo.search(query, course::SEARCH_LIMIT).await?;
        debug!(hits = rows.len(), "course search");
        self.with_instructors(rows).await
    }

    pub async fn get(&self, user: &AuthUser, id: Uuid) -> Result<CourseView, ServiceError> {
        ensure(user.role, Action::ReadCourse)?;
        let course = self.repo.get(id).await?.ok_or_else(|| ServiceError::not_found("Course"))?;
        self.view(course).await
    }

    #[instrument(skip(self, user, input), fields(user_id = %user.id))]
    pub async fn create(&self, user: &AuthUser, input: CourseInput) -> Result<CourseView, ServiceError> {
        ensure(user.role, Action::CreateCourse)?;
        validation::validate(&input)?;
        let patch = CoursePatch::from(input);
        let new_course = NewCourse {
            title: patch.title.unwrap_or_default(),
            description: patch.description.unwrap_or_default(),
            price: patch.price.unwrap_or_default(),
            instructor_id: Some(user.id),
            is_active: patch.is_active.unwrap_or(true),
        };
        let created = self.repo.create(new_course).await?;
        self.cache.invalidate();
        info!(course_id = %created.id, event = "course_created");
        Ok(CourseView::new(created, Some(UserSummary::from(user))))
    }

    /// Applies PUT (every field present) and PATCH bodies alike.
    #[instrument(skip(self, user, patch), fields(user_id = %user.id))]
    pub async fn update(&self, user: &AuthUser, id: Uuid, patch: CoursePatch) -> Result<CourseView, ServiceError> {
        ensure(user.role, Action::UpdateCourse)?;
        self.owned(user, id).await?;
        validation::validate(&patch)?;
        let updated = self.repo.update(id, patch.into()).await?;
        self.cache.invalidate();
        info!(course_id = %id, event = "course_updated");
        Ok(CourseView::new(updated, Some(UserSummary::from(user))))
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn delete(&self, user: &AuthUser, id: Uuid) -> Result<(), ServiceError> {
        ensure(user.role, Action::DeleteCourse)?;
        self.owned(user, id).await?;
        let removed = match self.repo.delete(id).await {
            Ok(removed) => removed,
            Err(ServiceError::Conflict(detail)) => {
                debug!(course_id = %id, %detail, "delete blocked by payment history");
                return Err(ServiceError::invalid(NON_FIELD, COURSE_HAS_PAYMENTS));
            }
            Err(e) => return Err(e),
        };
        if !removed {
            return Err(ServiceError::not_found("Course"));
        }
        self.cache.invalidate();
        info!(course_id = %id, event = "course_deleted");
        Ok(())
    }

    async fn owned(&self, user: &AuthUser, id: Uuid) -> Result<course::Model, ServiceError> {
        let course = self.repo.get(id).await?.ok_or_else(|| ServiceError::not_found("Course"))?;
        if course.instructor_id != Some(user.id) {
            return Err(ServiceError::Forbidden("You can only modify your own courses.".into()));
        }
        Ok(course)
    }

    async fn view(&self, course: course::Model) -> Result<CourseView, ServiceError> {
        let mut views = self.with_instructors(vec![course]).await?;
        views.pop().ok_or_else(|| ServiceError::Internal("course view lost".into()))
    }

    /// Resolve instructors with one lookup for the whole batch.
    async fn with_instructors(&self, rows: Vec<course::Model>) -> Result<Vec<CourseView>, ServiceError> {
        let ids: HashSet<Uuid> = rows.iter().filter_map(|c| c.instructor_id).collect();
        let instructors: HashMap<Uuid, UserSummary> = self.repo
            .users_by_ids(ids.into_iter().collect())
            .await?
            .into_iter()
            .map(|u| (u.id, UserSummary::from(u)))
            .collect();
        Ok(rows
            .into_iter()
            .map(|c| {
                let instructor = c.instructor_id.and_then(|id| instructors.get(&id).cloned());
                CourseView::new(c, instructor)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use models::user::Role;
    use rust_decimal::Decimal;

    use crate::store::memory::MemoryStore;

    struct Fixture {
        store: Arc<MemoryStore>,
        svc: CatalogService,
        instructor: AuthUser,
        student: AuthUser,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::default());
        let cache = Arc::new(CourseListCache::new(Duration::from_secs(900), 100));
        let svc = CatalogService::new(store.clone(), cache);
        let instructor = store.add_user("teach@example.com", Role::Instructor);
        let student = store.add_user("learn@example.com", Role::Student);
        Fixture { store, svc, instructor, student }
    }

    fn input(title: &str, description: &str) -> CourseInput {
        CourseInput { title: title.into(), description: description.into(), price: Decimal::new(4999, 2), is_active: None }
    }

    #[tokio::test]
    async fn create_sets_owner_and_nests_instructor() {
        let f = fixture();
        let view = f.svc.create(&f.instructor, input("Rust 101", "Ownership")).await.unwrap();
        assert_eq!(view.instructor.as_ref().map(|i| i.id), Some(f.instructor.id));
        assert!(view.is_active);
        let fetched = f.svc.get(&f.student, view.id).await.unwrap();
        assert_eq!(fetched.instructor.map(|i| i.username), Some(f.instructor.username.clone()));
    }

    #[tokio::test]
    async fn students_cannot_author_courses() {
        let f = fixture();
        let err = f.svc.create(&f.student, input("Nope", "Nope")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn invalid_fields_are_reported_per_field() {
        let f = fixture();
        let bad = CourseInput { title: " ".into(), description: "ok".into(), price: Decimal::new(-1, 0), is_active: None };
        match f.svc.create(&f.instructor, bad).await.unwrap_err() {
            ServiceError::Validation(errors) => {
                assert!(errors.get("title").is_some());
                assert!(errors.get("price").is_some());
                assert!(errors.get("description").is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn only_the_owner_may_modify() {
        let f = fixture();
        let other = f.store.add_user("other@example.com", Role::Instructor);
        let course = f.svc.create(&f.instructor, input("Mine", "Mine")).await.unwrap();
        let patch = CoursePatch { title: Some("Stolen".into()), ..CoursePatch::default() };
        assert!(matches!(f.svc.update(&other, course.id, patch).await, Err(ServiceError::Forbidden(_))));
        assert!(matches!(f.svc.delete(&other, course.id).await, Err(ServiceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn patch_touches_only_given_fields() {
        let f = fixture();
        let course = f.svc.create(&f.instructor, input("Before", "Body")).await.unwrap();
        let patch = CoursePatch { price: Some(Decimal::new(1000, 2)), ..CoursePatch::default() };
        let updated = f.svc.update(&f.instructor, course.id, patch).await.unwrap();
        assert_eq!(updated.title, "Before");
        assert_eq!(updated.price, Decimal::new(1000, 2));
        assert!(updated.updated_at >= course.updated_at);
    }

    #[tokio::test]
    async fn deleted_course_is_gone() {
        let f = fixture();
        let course = f.svc.create(&f.instructor, input("Temp", "Temp")).await.unwrap();
        f.svc.delete(&f.instructor, course.id).await.unwrap();
        assert!(matches!(f.svc.get(&f.student, course.id).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn paid_course_cannot_be_deleted() {
        use crate::payment::repository::PaymentRepository;
        use models::payment::{NewPayment, PaymentStatus};

        let f = fixture();
        let course = f.svc.create(&f.instructor, input("Paid", "Body")).await.unwrap();
        let paid = NewPayment {
            user_id: f.student.id,
            course_id: course.id,
            amount: course.price,
            gateway_transaction_id: Some("txn_1".into()),
            status: PaymentStatus::Completed,
        };
        f.store.record_payment(paid).await.unwrap();

        match f.svc.delete(&f.instructor, course.id).await.unwrap_err() {
            ServiceError::Validation(errors) => {
                assert_eq!(errors.get(NON_FIELD).map(|m| m.to_vec()), Some(vec![COURSE_HAS_PAYMENTS.to_string()]));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(f.store.list_for_user(f.student.id).await.unwrap().len(), 1);
        assert!(f.svc.get(&f.student, course.id).await.is_ok());
    }

    #[tokio::test]
    async fn patch_with_blank_title_is_rejected() {
        let f = fixture();
        let course = f.svc.create(&f.instructor, input("Keep", "Body")).await.unwrap();
        let patch = CoursePatch { title: Some("  ".into()), price: Some(Decimal::new(1, 3)), ..CoursePatch::default() };
        match f.svc.update(&f.instructor, course.id, patch).await.unwrap_err() {
            ServiceError::Validation(errors) => {
                assert_eq!(errors.get("title").map(|m| m.to_vec()), Some(vec!["This field may not be blank.".to_string()]));
                assert!(errors.get("price").is_some());
                assert!(errors.get("description").is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_shows_active_courses_newest_first() {
        let f = fixture();
        let first = f.svc.create(&f.instructor, input("First", "a")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = f.svc.create(&f.instructor, input("Second", "b")).await.unwrap();
        let hidden = CourseInput { is_active: Some(false), ..input("Hidden", "c") };
        f.svc.create(&f.instructor, hidden).await.unwrap();

        let page = f.svc.list(&f.student, Pagination::default()).await.unwrap();
        assert_eq!(page.count, 2);
        let ids: Vec<Uuid> = page.results.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn list_is_cached_until_a_write() {
        let f = fixture();
        f.svc.create(&f.instructor, input("One", "a")).await.unwrap();
        let first = f.svc.list(&f.student, Pagination::default()).await.unwrap();

        // bypasses the service, so the cache is not told
        f.store.insert_course("Sneaky", f.instructor.id, true);
        let again = f.svc.list(&f.student, Pagination::default()).await.unwrap();
        assert_eq!(first, again);

        f.svc.create(&f.instructor, input("Three", "c")).await.unwrap();
        let fresh = f.svc.list(&f.student, Pagination::default()).await.unwrap();
        assert_eq!(fresh.count, 3);
    }

    #[tokio::test]
    async fn blank_search_is_rejected() {
        let f = fixture();
        for q in [None, Some(""), Some("   ")] {
            match f.svc.search(&f.student, q).await.unwrap_err() {
                ServiceError::Validation(errors) => assert!(errors.get("q").is_some()),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn title_match_outranks_description_mention() {
        let f = fixture();
        let mention = f.svc.create(&f.instructor, input("Data Wrangling", "Examples use python throughout")).await.unwrap();
        let titled = f.svc.create(&f.instructor, input("Python for Beginners", "Learn to program")).await.unwrap();
        f.svc.create(&f.instructor, input("Gardening", "Soil and seeds")).await.unwrap();

        let hits = f.svc.search(&f.student, Some("Python")).await.unwrap();
        let ids: Vec<Uuid> = hits.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![titled.id, mention.id]);
    }
}
