use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder, Set};
use rust_decimal::Decimal;
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::{course, user};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "failed")]
    Failed,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub amount: Decimal,
    #[sea_orm(unique, nullable)]
    pub gateway_transaction_id: Option<String>,
    pub status: PaymentStatus,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { User, Course }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity).from(Column::UserId).to(user::Column::Id).into(),
            Relation::Course => Entity::belongs_to(course::Entity).from(Column::CourseId).to(course::Column::Id).into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// One charge attempt as it will be recorded.
#[derive(Clone, Debug)]
pub struct NewPayment {
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub amount: Decimal,
    pub gateway_transaction_id: Option<String>,
    pub status: PaymentStatus,
}

pub async fn create<C: ConnectionTrait>(db: &C, input: NewPayment) -> Result<Model, ModelError> {
    if input.status == PaymentStatus::Completed && input.gateway_transaction_id.is_none() {
        return Err(ModelError::Validation("completed payment requires a gateway transaction id".into()));
    }
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(input.user_id),
        course_id: Set(input.course_id),
        amount: Set(input.amount),
        gateway_transaction_id: Set(input.gateway_transaction_id.filter(|id| !id.is_empty())),
        status: Set(input.status),
        created_at: Set(Utc::now().into()),
    };
    Ok(am.insert(db).await?)
}

pub async fn list_for_user<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<Vec<Model>, ModelError> {
    Ok(Entity::find()
        .filter(Column::UserId.eq(user_id))
        .order_by_desc(Column::CreatedAt)
        .all(db)
        .await?)
}
