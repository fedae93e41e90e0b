use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Users: role lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_user_role")
                    .table(User::Table)
                    .col(User::Role)
                    .to_owned(),
            )
            .await?;

        // Course: title, and per-instructor listing by recency
        manager
            .create_index(
                Index::create()
                    .name("idx_course_title")
                    .table(Course::Table)
                    .col(Course::Title)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_course_instructor_created")
                    .table(Course::Table)
                    .col(Course::InstructorId)
                    .col(Course::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Enrollment: composite unique (student_id, course_id)
        manager
            .create_index(
                Index::create()
                    .name("uniq_enrollment_student_course")
                    .table(Enrollment::Table)
                    .col(Enrollment::StudentId)
                    .col(Enrollment::CourseId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Review: composite unique (student_id, course_id)
        manager
            .create_index(
                Index::create()
                    .name("uniq_review_student_course")
                    .table(Review::Table)
                    .col(Review::StudentId)
                    .col(Review::CourseId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Payment: history per user
        manager
            .create_index(
                Index::create()
                    .name("idx_payment_user")
                    .table(Payment::Table)
                    .col(Payment::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_user_role").table(User::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_course_title").table(Course::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_course_instructor_created").table(Course::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("uniq_enrollment_student_course").table(Enrollment::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("uniq_review_student_course").table(Review::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_payment_user").table(Payment::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum User { Table, Role }

#[derive(DeriveIden)]
enum Course { Table, Title, InstructorId, CreatedAt }

#[derive(DeriveIden)]
enum Enrollment { Table, StudentId, CourseId }

#[derive(DeriveIden)]
enum Review { Table, StudentId, CourseId }

#[derive(DeriveIden)]
enum Payment { Table, UserId }
