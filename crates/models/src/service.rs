use chrono::Utc;
use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{invalid, ModelError};
use crate::{service_category, user, validation};

/// A bookable offering. `price` is in paise.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub category_id: Uuid,
    pub provider_id: Uuid,
    pub description: String,
    pub price: i64,
    pub duration_hours: i32,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub is_available: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Category,
    Provider,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Category => Entity::belongs_to(service_category::Entity)
                .from(Column::CategoryId)
                .to(service_category::Column::Id)
                .into(),
            Relation::Provider => Entity::belongs_to(user::Entity)
                .from(Column::ProviderId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<service_category::Entity> for Entity {
    fn to() -> RelationDef { Relation::Category.def() }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_bookable(&self) -> bool {
        self.is_active && self.is_available
    }
}

#[derive(Debug, Clone)]
pub struct NewService<'a> {
    pub name: &'a str,
    pub category_id: Uuid,
    pub provider_id: Uuid,
    pub description: &'a str,
    pub price: i64,
    pub duration_hours: i32,
    pub image_url: Option<&'a str>,
}

pub fn validate_price(price: i64) -> Result<(), ModelError> {
    if price < 0 {
        return Err(invalid("price must be non-negative"));
    }
    if price > crate::money::MAX_AMOUNT_PAISE {
        return Err(invalid("price must not exceed 10 crore INR"));
    }
    Ok(())
}

pub fn validate_duration(hours: i32) -> Result<(), ModelError> {
    if hours < 1 {
        return Err(invalid("duration_hours must be at least 1"));
    }
    Ok(())
}

pub async fn create<C: ConnectionTrait>(db: &C, new: NewService<'_>) -> Result<Model, ModelError> {
    validation::validate_required("name", new.name, 200)?;
    validate_price(new.price)?;
    validate_duration(new.duration_hours)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(new.name.trim().to_string()),
        category_id: Set(new.category_id),
        provider_id: Set(new.provider_id),
        description: Set(new.description.trim().to_string()),
        price: Set(new.price),
        duration_hours: Set(new.duration_hours),
        image_url: Set(new.image_url.map(str::to_string)),
        is_active: Set(true),
        is_available: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}
