use chrono::Utc;
use sea_orm::{entity::prelude::*, ConnectionTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::{service, validation};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service_image")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub service_id: Uuid,
    pub image_url: String,
    pub caption: String,
    pub is_primary: bool,
    pub sort_order: i32,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Service }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Service => Entity::belongs_to(service::Entity)
                .from(Column::ServiceId)
                .to(service::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Insert a gallery image. Callers are responsible for clearing other primary flags first.
pub async fn create<C: ConnectionTrait>(
    db: &C,
    service_id: Uuid,
    image_url: &str,
    caption: &str,
    is_primary: bool,
    sort_order: i32,
) -> Result<Model, ModelError> {
    validation::validate_required("image_url", image_url, 500)?;
    validation::validate_max_len("caption", caption, 200)?;
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        service_id: Set(service_id),
        image_url: Set(image_url.trim().to_string()),
        caption: Set(caption.trim().to_string()),
        is_primary: Set(is_primary),
        sort_order: Set(sort_order),
        created_at: Set(Utc::now().into()),
    };
    Ok(am.insert(db).await?)
}

/// Gallery order: `sort_order`, then oldest first.
pub async fn list_for_service<C: ConnectionTrait>(db: &C, service_id: Uuid) -> Result<Vec<Model>, ModelError> {
    Ok(Entity::find()
        .filter(Column::ServiceId.eq(service_id))
        .order_by_asc(Column::SortOrder)
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?)
}
