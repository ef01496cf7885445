//! Customer reviews of completed bookings, and the provider rating they feed.
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use models::{booking, provider_profile, review, service, BookingStatus};

use crate::catalog::{reviews_for_services, ReviewView};
use crate::errors::ServiceError;
use crate::{booking as booking_svc, Actor};

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewInput {
    pub rating: i32,
    #[serde(default)]
    pub comment: String,
}

/// Recompute `rating` (hundredths) and `total_reviews` on the provider's profile.
async fn refresh_provider_rating<C: ConnectionTrait>(db: &C, provider_id: Uuid) -> Result<(), ServiceError> {
    let Some(profile) = provider_profile::find_by_user(db, provider_id).await? else {
        return Ok(());
    };
    let rows = review::Entity::find()
        .find_also_related(booking::Entity)
        .filter(booking::Column::ProviderId.eq(provider_id))
        .all(db)
        .await?;
    let n = rows.len() as i64;
    let sum: i64 = rows.iter().map(|(r, _)| r.rating as i64).sum();
    let avg_hundredths = if n == 0 { 0 } else { (sum * 100 + n / 2) / n };

    let mut am: provider_profile::ActiveModel = profile.into();
    am.rating = Set(avg_hundredths as i32);
    am.total_reviews = Set(n as i32);
    am.updated_at = Set(Utc::now().into());
    am.update(db).await?;
    Ok(())
}

/// One review per completed booking, written by the customer who made it.
#[instrument(skip(db, input), fields(customer = %actor.user_id, booking_id = %booking_id, rating = input.rating))]
pub async fn add_review(db: &DatabaseConnection, actor: &Actor, booking_id: Uuid, input: ReviewInput) -> Result<review::Model, ServiceError> {
    let txn = db.begin().await?;
    let b = booking_svc::load_own(&txn, actor, booking_id).await?;
    if b.status != BookingStatus::Completed {
        return Err(ServiceError::InvalidState("you can only review completed bookings".into()));
    }
    let existing = review::Entity::find()
        .filter(review::Column::BookingId.eq(b.id))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Err(ServiceError::Conflict("you have already reviewed this booking".into()));
    }
    let created = review::create(&txn, b.id, actor.user_id, input.rating, &input.comment).await?;

    let provider_id = match b.provider_id {
        Some(p) => Some(p),
        None => service::Entity::find_by_id(b.service_id).one(&txn).await?.map(|s| s.provider_id),
    };
    if let Some(pid) = provider_id {
        refresh_provider_rating(&txn, pid).await?;
    }
    txn.commit().await?;
    info!(review_id = %created.id, event = "review_added", "review added");
    Ok(created)
}

pub async fn reviews_for_service(db: &DatabaseConnection, service_id: Uuid) -> Result<Vec<ReviewView>, ServiceError> {
    reviews_for_services(db, Some(std::slice::from_ref(&service_id)), None).await
}
