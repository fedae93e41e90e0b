//! Create `course` table with FK to the instructor `user`.
//!
//! `search_vector` is a stored generated `tsvector` (title weighted A, description B)
//! so the application never maintains it; a GIN index backs ranked search.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

const ADD_SEARCH_VECTOR: &str = r#"
ALTER TABLE "course" ADD COLUMN IF NOT EXISTS "search_vector" tsvector
GENERATED ALWAYS AS (
    setweight(to_tsvector('english', coalesce("title", '')), 'A') ||
    setweight(to_tsvector('english', coalesce("description", '')), 'B')
) STORED
"#;

const ADD_SEARCH_INDEX: &str =
    r#"CREATE INDEX IF NOT EXISTS "idx_course_search_vector" ON "course" USING GIN ("search_vector")"#;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Course::Table)
                    .if_not_exists()
                    .col(uuid(Course::Id).primary_key())
                    .col(string_len(Course::Title, 250).not_null())
                    .col(text(Course::Description).not_null())
                    .col(decimal_len(Course::Price, 10, 2).not_null())
                    .col(uuid_null(Course::InstructorId))
                    .col(boolean(Course::IsActive).not_null().default(true))
                    .col(timestamp_with_time_zone(Course::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Course::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_course_instructor")
                            .from(Course::Table, Course::InstructorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        let conn = manager.get_connection();
        conn.execute_unprepared(ADD_SEARCH_VECTOR).await?;
        conn.execute_unprepared(ADD_SEARCH_INDEX).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Course::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Course { Table, Id, Title, Description, Price, InstructorId, IsActive, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum User { Table, Id }
