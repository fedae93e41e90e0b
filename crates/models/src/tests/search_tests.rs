use anyhow::Result;
use rust_decimal::Decimal;
use sea_orm::EntityTrait;
use uuid::Uuid;

use super::setup_test_db;
use crate::course::{self, NewCourse, SEARCH_LIMIT};
use crate::user::{self, Role};

#[tokio::test]
async fn test_title_match_outranks_description_mention() -> Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let instructor = user::create(&db, &format!("fts_{}@example.com", Uuid::new_v4()), "fts", Role::Instructor, None).await?;
    // A marker keeps this test's rows apart from whatever else is in the table
    let marker = format!("zq{}", Uuid::new_v4().simple());

    let mention = course::create(&db, NewCourse {
        title: format!("Data Wrangling {marker}"),
        description: "Spreadsheets, SQL and a short detour into Python.".into(),
        price: Decimal::new(1000, 2),
        instructor_id: Some(instructor.id),
        is_active: true,
    })
    .await?;
    let titled = course::create(&db, NewCourse {
        title: format!("Intro to Python {marker}"),
        description: "Variables, loops and functions.".into(),
        price: Decimal::new(2000, 2),
        instructor_id: Some(instructor.id),
        is_active: true,
    })
    .await?;
    let inactive = course::create(&db, NewCourse {
        title: format!("Python Archive {marker}"),
        description: "Retired.".into(),
        price: Decimal::ZERO,
        instructor_id: Some(instructor.id),
        is_active: false,
    })
    .await?;

    let hits = course::search(&db, &format!("python {marker}"), SEARCH_LIMIT).await?;
    let ids: Vec<Uuid> = hits.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![titled.id, mention.id]);

    for id in [mention.id, titled.id, inactive.id] {
        course::Entity::delete_by_id(id).exec(&db).await?;
    }
    user::Entity::delete_by_id(instructor.id).exec(&db).await?;
    Ok(())
}
