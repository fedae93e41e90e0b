//! Opaque bearer tokens. One token per user, reused across logins until logout.

use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::user;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "auth_token")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    #[sea_orm(unique)]
    pub user_id: Uuid,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { User }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self { Relation::User => Entity::belongs_to(user::Entity).from(Column::UserId).to(user::Column::Id).into() }
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub const KEY_LEN: usize = 40;

pub async fn find_by_key<C: ConnectionTrait>(db: &C, key: &str) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find_by_id(key.to_string()).one(db).await?)
}

pub async fn find_by_user<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find().filter(Column::UserId.eq(user_id)).one(db).await?)
}

/// Return the user's token, inserting `fresh_key` when none exists yet.
/// A concurrent login that wins the insert is resolved by re-reading its row.
pub async fn get_or_create<C: ConnectionTrait>(db: &C, user_id: Uuid, fresh_key: String) -> Result<Model, ModelError> {
    if let Some(existing) = find_by_user(db, user_id).await? {
        return Ok(existing);
    }
    if fresh_key.len() != KEY_LEN {
        return Err(ModelError::Validation(format!("token key must be {KEY_LEN} characters")));
    }
    let am = ActiveModel {
        key: Set(fresh_key),
        user_id: Set(user_id),
        created_at: Set(Utc::now().into()),
    };
    match am.insert(db).await.map_err(ModelError::from) {
        Ok(created) => Ok(created),
        Err(ModelError::Conflict(_)) => find_by_user(db, user_id)
            .await?
            .ok_or_else(|| ModelError::Db("token vanished after conflict".into())),
        Err(e) => Err(e),
    }
}

pub async fn delete_for_user<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<u64, ModelError> {
    let res = Entity::delete_many().filter(Column::UserId.eq(user_id)).exec(db).await?;
    Ok(res.rows_affected)
}
