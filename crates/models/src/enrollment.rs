use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::{course, user};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "dropped")]
    Dropped,
}

/// `enrollment_date` is written once on insert; no update path touches it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "enrollment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub enrollment_date: DateTimeWithTimeZone,
    pub status: EnrollmentStatus,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Student, Course }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Student => Entity::belongs_to(user::Entity).from(Column::StudentId).to(user::Column::Id).into(),
            Relation::Course => Entity::belongs_to(course::Entity).from(Column::CourseId).to(course::Column::Id).into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn find_pair<C: ConnectionTrait>(db: &C, student_id: Uuid, course_id: Uuid) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find()
        .filter(Column::StudentId.eq(student_id))
        .filter(Column::CourseId.eq(course_id))
        .one(db)
        .await?)
}

/// Insert an active enrollment; the (student_id, course_id) unique index turns a
/// duplicate into `ModelError::Conflict`.
pub async fn create<C: ConnectionTrait>(db: &C, student_id: Uuid, course_id: Uuid) -> Result<Model, ModelError> {
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        student_id: Set(student_id),
        course_id: Set(course_id),
        enrollment_date: Set(Utc::now().into()),
        status: Set(EnrollmentStatus::Active),
    };
    Ok(am.insert(db).await?)
}

pub async fn set_status<C: ConnectionTrait>(db: &C, id: Uuid, status: EnrollmentStatus) -> Result<Model, ModelError> {
    let mut am: ActiveModel = Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ModelError::NotFound("enrollment".into()))?
        .into();
    am.status = Set(status);
    Ok(am.update(db).await?)
}

pub async fn list_for_student<C: ConnectionTrait>(db: &C, student_id: Uuid) -> Result<Vec<Model>, ModelError> {
    Ok(Entity::find()
        .filter(Column::StudentId.eq(student_id))
        .order_by_desc(Column::EnrollmentDate)
        .all(db)
        .await?)
}

pub async fn count_for_pair<C: ConnectionTrait>(db: &C, student_id: Uuid, course_id: Uuid) -> Result<u64, ModelError> {
    use sea_orm::PaginatorTrait;
    Ok(Entity::find()
        .filter(Column::StudentId.eq(student_id))
        .filter(Column::CourseId.eq(course_id))
        .count(db)
        .await?)
}
