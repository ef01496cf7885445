//! Provider self-service: dashboard, business profile, weekly schedule and own services.
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use models::{booking, provider_profile, provider_schedule, service, user, validation, BookingStatus, Role, Weekday};

use crate::booking::{summarize_bookings, BookingSummary};
use crate::catalog::{summarize, ServiceSummary};
use crate::errors::ServiceError;
use crate::Actor;

const DASHBOARD_LIMIT: u64 = 5;

#[derive(Debug, Clone, Serialize)]
pub struct ProviderCounts {
    pub services: u64,
    pub bookings: u64,
    pub pending: u64,
    pub completed: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderDashboard {
    pub profile: provider_profile::Model,
    pub services: Vec<ServiceSummary>,
    pub recent_bookings: Vec<BookingSummary>,
    pub upcoming_bookings: Vec<BookingSummary>,
    pub counts: ProviderCounts,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub company_name: Option<String>,
    pub business_description: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleInput {
    pub day: Weekday,
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

fn default_true() -> bool { true }

/// The provider's profile, created empty on first access.
pub async fn get_profile(db: &DatabaseConnection, actor: &Actor) -> Result<provider_profile::Model, ServiceError> {
    actor.require(Role::Provider)?;
    if let Some(p) = provider_profile::find_by_user(db, actor.user_id).await? {
        return Ok(p);
    }
    let owner = user::Entity::find_by_id(actor.user_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("user"))?;
    let phone = owner.phone_number.clone().unwrap_or_default();
    Ok(provider_profile::create_default(db, owner.id, "", &phone).await?)
}

#[instrument(skip(db, input), fields(provider = %actor.user_id))]
pub async fn update_profile(db: &DatabaseConnection, actor: &Actor, input: ProfileUpdate) -> Result<provider_profile::Model, ServiceError> {
    let profile = get_profile(db, actor).await?;
    let mut am: provider_profile::ActiveModel = profile.into();
    if let Some(name) = input.company_name {
        validation::validate_max_len("company_name", &name, 200)?;
        am.company_name = Set(name.trim().to_string());
    }
    if let Some(desc) = input.business_description {
        validation::validate_max_len("business_description", &desc, 2000)?;
        am.business_description = Set(desc.trim().to_string());
    }
    if let Some(addr) = input.address {
        validation::validate_max_len("address", &addr, 1000)?;
        am.address = Set(addr.trim().to_string());
    }
    if let Some(phone) = input.phone_number {
        if !phone.trim().is_empty() {
            validation::validate_phone(&phone)?;
        }
        am.phone_number = Set(phone.trim().to_string());
    }
    if let Some(a) = input.is_available {
        am.is_available = Set(a);
    }
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    info!(event = "provider_profile_updated", "profile updated");
    Ok(updated)
}

#[instrument(skip(db), fields(provider = %actor.user_id))]
pub async fn dashboard(db: &DatabaseConnection, actor: &Actor) -> Result<ProviderDashboard, ServiceError> {
    let profile = get_profile(db, actor).await?;
    let me = actor.user_id;

    let services = service::Entity::find()
        .filter(service::Column::ProviderId.eq(me))
        .order_by_desc(service::Column::CreatedAt)
        .limit(DASHBOARD_LIMIT)
        .all(db)
        .await?;
    let recent = booking::Entity::find()
        .filter(booking::Column::ProviderId.eq(me))
        .order_by_desc(booking::Column::CreatedAt)
        .limit(DASHBOARD_LIMIT)
        .all(db)
        .await?;
    let now: chrono::DateTime<chrono::FixedOffset> = Utc::now().into();
    let upcoming = booking::Entity::find()
        .filter(booking::Column::ProviderId.eq(me))
        .filter(booking::Column::BookingDate.gt(now))
        .filter(booking::Column::Status.is_in([BookingStatus::Pending, BookingStatus::Confirmed]))
        .order_by_asc(booking::Column::BookingDate)
        .limit(DASHBOARD_LIMIT)
        .all(db)
        .await?;

    let counts = ProviderCounts {
        services: service::Entity::find().filter(service::Column::ProviderId.eq(me)).count(db).await?,
        bookings: booking::Entity::find().filter(booking::Column::ProviderId.eq(me)).count(db).await?,
        pending: booking::Entity::find()
            .filter(booking::Column::ProviderId.eq(me))
            .filter(booking::Column::Status.eq(BookingStatus::Pending))
            .count(db)
            .await?,
        completed: booking::Entity::find()
            .filter(booking::Column::ProviderId.eq(me))
            .filter(booking::Column::Status.eq(BookingStatus::Completed))
            .count(db)
            .await?,
    };

    Ok(ProviderDashboard {
        profile,
        services: summarize(db, services).await?,
        recent_bookings: summarize_bookings(db, recent).await?,
        upcoming_bookings: summarize_bookings(db, upcoming).await?,
        counts,
    })
}

pub async fn list_own_services(db: &DatabaseConnection, actor: &Actor) -> Result<Vec<ServiceSummary>, ServiceError> {
    actor.require(Role::Provider)?;
    let rows = service::Entity::find()
        .filter(service::Column::ProviderId.eq(actor.user_id))
        .order_by_asc(service::Column::Name)
        .all(db)
        .await?;
    summarize(db, rows).await
}

/// Weekly schedule, Monday first.
pub async fn list_schedule(db: &DatabaseConnection, actor: &Actor) -> Result<Vec<provider_schedule::Model>, ServiceError> {
    actor.require(Role::Provider)?;
    let mut rows = provider_schedule::Entity::find()
        .filter(provider_schedule::Column::ProviderId.eq(actor.user_id))
        .all(db)
        .await?;
    rows.sort_by_key(|r| r.day.ordinal());
    Ok(rows)
}

/// Insert or replace the entry for `input.day`.
#[instrument(skip(db, input), fields(provider = %actor.user_id, day = ?input.day))]
pub async fn set_schedule_entry(db: &DatabaseConnection, actor: &Actor, input: ScheduleInput) -> Result<provider_schedule::Model, ServiceError> {
    actor.require(Role::Provider)?;
    let (start, end) = validation::validate_time_window(&input.start_time, &input.end_time)?;
    let start = start.format("%H:%M").to_string();
    let end = end.format("%H:%M").to_string();
    let now = Utc::now();

    let existing = provider_schedule::Entity::find()
        .filter(provider_schedule::Column::ProviderId.eq(actor.user_id))
        .filter(provider_schedule::Column::Day.eq(input.day))
        .one(db)
        .await?;
    let saved = match existing {
        Some(row) => {
            let mut am: provider_schedule::ActiveModel = row.into();
            am.start_time = Set(start);
            am.end_time = Set(end);
            am.is_available = Set(input.is_available);
            am.updated_at = Set(now.into());
            am.update(db).await?
        }
        None => {
            provider_schedule::ActiveModel {
                id: Set(Uuid::new_v4()),
                provider_id: Set(actor.user_id),
                day: Set(input.day),
                start_time: Set(start),
                end_time: Set(end),
                is_available: Set(input.is_available),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            }
            .insert(db)
            .await
            .map_err(|e| ServiceError::conflict_or_db(e, "schedule entry already exists for this day"))?
        }
    };
    info!(event = "schedule_saved", "schedule entry saved");
    Ok(saved)
}

pub async fn delete_schedule_entry(db: &DatabaseConnection, actor: &Actor, day: Weekday) -> Result<(), ServiceError> {
    actor.require(Role::Provider)?;
    let row = provider_schedule::Entity::find()
        .filter(provider_schedule::Column::ProviderId.eq(actor.user_id))
        .filter(provider_schedule::Column::Day.eq(day))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("schedule entry"))?;
    row.delete(db).await?;
    Ok(())
}
