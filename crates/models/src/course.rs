use sea_orm::{
    entity::prelude::*, ConnectionTrait, DbBackend, PaginatorTrait, QueryOrder, Set, Statement,
};
use rust_decimal::Decimal;
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::user;

/// `search_vector` exists in the table as a generated column but is never mapped here;
/// it is only touched by [`search`].
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "course")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    #[sea_orm(nullable)]
    pub instructor_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Instructor }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Instructor => Entity::belongs_to(user::Entity)
                .from(Column::InstructorId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::Instructor.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Ranked search never returns more than this many rows.
pub const SEARCH_LIMIT: u64 = 50;

/// Field values for a new course row.
#[derive(Clone, Debug)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub instructor_id: Option<Uuid>,
    pub is_active: bool,
}

/// Partial update; `None` leaves a column untouched.
#[derive(Clone, Debug, Default)]
pub struct CourseChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub is_active: Option<bool>,
}

pub async fn create<C: ConnectionTrait>(db: &C, input: NewCourse) -> Result<Model, ModelError> {
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(input.title.trim().to_string()),
        description: Set(input.description),
        price: Set(input.price),
        instructor_id: Set(input.instructor_id),
        is_active: Set(input.is_active),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find_by_id(id).one(db).await?)
}

pub async fn update<C: ConnectionTrait>(db: &C, id: Uuid, changes: CourseChanges) -> Result<Model, ModelError> {
    let mut am: ActiveModel = Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ModelError::NotFound("course".into()))?
        .into();
    if let Some(title) = changes.title {
        am.title = Set(title.trim().to_string());
    }
    if let Some(description) = changes.description {
        am.description = Set(description);
    }
    if let Some(price) = changes.price {
        am.price = Set(price);
    }
    if let Some(active) = changes.is_active {
        am.is_active = Set(active);
    }
    am.updated_at = Set(Utc::now().into());
    Ok(am.update(db).await?)
}

pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<bool, ModelError> {
    let res = Entity::delete_by_id(id).exec(db).await?;
    Ok(res.rows_affected > 0)
}

/// One page of active courses, newest first, plus the total active count.
pub async fn list_active<C: ConnectionTrait>(db: &C, page_idx: u64, per_page: u64) -> Result<(Vec<Model>, u64), ModelError> {
    let paginator = Entity::find()
        .filter(Column::IsActive.eq(true))
        .order_by_desc(Column::CreatedAt)
        .order_by_asc(Column::Id)
        .paginate(db, per_page);
    let total = paginator.num_items().await?;
    let rows = paginator.fetch_page(page_idx).await?;
    Ok((rows, total))
}

const SEARCH_SQL: &str = r#"
SELECT "id", "title", "description", "price", "instructor_id", "is_active", "created_at", "updated_at"
FROM "course"
WHERE "is_active" AND "search_vector" @@ websearch_to_tsquery('english', $1)
ORDER BY ts_rank("search_vector", websearch_to_tsquery('english', $1)) DESC, "created_at" DESC
LIMIT $2
"#;

/// Ranked full-text match over the generated `search_vector`.
pub async fn search<C: ConnectionTrait>(db: &C, query: &str, limit: u64) -> Result<Vec<Model>, ModelError> {
    let stmt = Statement::from_sql_and_values(
        DbBackend::Postgres,
        SEARCH_SQL,
        [query.into(), (limit as i64).into()],
    );
    Ok(Entity::find().from_raw_sql(stmt).all(db).await?)
}
