use chrono::Utc;
use sea_orm::{entity::prelude::*, ConnectionTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::{user, validation};

/// Business profile attached to a provider account. `rating` is in hundredths.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "provider_profile")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub user_id: Uuid,
    pub company_name: String,
    pub business_description: String,
    pub address: String,
    pub phone_number: String,
    pub rating: i32,
    pub total_reviews: i32,
    pub is_verified: bool,
    pub is_available: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { User }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::User.def() }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn display_name(&self, owner: &user::Model) -> String {
        if self.company_name.trim().is_empty() { owner.full_name() } else { self.company_name.clone() }
    }
}

/// Create an empty, unverified profile; the provider fills it in later.
pub async fn create_default<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    company_name: &str,
    phone_number: &str,
) -> Result<Model, ModelError> {
    validation::validate_max_len("company_name", company_name, 200)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        company_name: Set(company_name.trim().to_string()),
        business_description: Set(String::new()),
        address: Set(String::new()),
        phone_number: Set(phone_number.trim().to_string()),
        rating: Set(0),
        total_reviews: Set(0),
        is_verified: Set(false),
        is_available: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

pub async fn find_by_user<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find().filter(Column::UserId.eq(user_id)).one(db).await?)
}
