//! Service catalog: categories, services and their image galleries.
use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use models::{booking, money, provider_profile, review, service, service_category, service_image, user, validation, Role};

use crate::errors::ServiceError;
use crate::pagination::{Page, Pagination};
use crate::Actor;

#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image_url: Option<String>,
    pub service_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceSummary {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category_id: Uuid,
    pub category_name: String,
    pub category_slug: String,
    pub provider_id: Uuid,
    pub provider_name: String,
    pub price: i64,
    pub price_display: String,
    pub duration_hours: i32,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub is_available: bool,
    pub average_rating: Option<f64>,
    pub review_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewView {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub service_id: Uuid,
    pub service_name: String,
    pub customer_name: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: chrono::DateTime<chrono::FixedOffset>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceDetail {
    #[serde(flatten)]
    pub summary: ServiceSummary,
    pub images: Vec<service_image::Model>,
    pub reviews: Vec<ReviewView>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceFilter {
    #[serde(default)]
    pub category_slug: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub min_price: Option<i64>,
    #[serde(default)]
    pub max_price: Option<i64>,
    #[serde(default)]
    pub provider_id: Option<Uuid>,
    #[serde(default)]
    pub only_active: bool,
}

impl ServiceFilter {
    pub fn public() -> Self { Self { only_active: true, ..Default::default() } }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateServiceInput {
    pub name: String,
    pub category_id: Uuid,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    #[serde(default = "default_duration")]
    pub duration_hours: i32,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Required when an administrator creates a service; ignored for providers.
    #[serde(default)]
    pub provider_id: Option<Uuid>,
}

fn default_duration() -> i32 { 1 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateServiceInput {
    pub name: Option<String>,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub duration_hours: Option<i32>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageInput {
    pub image_url: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub sort_order: i32,
}

/// Display names for provider accounts: company name when set, else the person's name.
pub async fn provider_names<C: ConnectionTrait>(db: &C, ids: &[Uuid]) -> Result<HashMap<Uuid, String>, ServiceError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let users = user::Entity::find().filter(user::Column::Id.is_in(ids.to_vec())).all(db).await?;
    let profiles: HashMap<Uuid, provider_profile::Model> = provider_profile::Entity::find()
        .filter(provider_profile::Column::UserId.is_in(ids.to_vec()))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.user_id, p))
        .collect();
    Ok(users
        .into_iter()
        .map(|u| {
            let name = match profiles.get(&u.id) {
                Some(p) => p.display_name(&u),
                None => u.full_name(),
            };
            (u.id, name)
        })
        .collect())
}

/// `(average, count)` of review ratings per service.
async fn rating_stats<C: ConnectionTrait>(db: &C, service_ids: &[Uuid]) -> Result<HashMap<Uuid, (f64, u64)>, ServiceError> {
    if service_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = review::Entity::find()
        .find_also_related(booking::Entity)
        .filter(booking::Column::ServiceId.is_in(service_ids.to_vec()))
        .all(db)
        .await?;
    let mut acc: HashMap<Uuid, (i64, u64)> = HashMap::new();
    for (r, b) in rows {
        if let Some(b) = b {
            let e = acc.entry(b.service_id).or_default();
            e.0 += r.rating as i64;
            e.1 += 1;
        }
    }
    Ok(acc
        .into_iter()
        .map(|(id, (sum, n))| (id, ((sum as f64 / n as f64 * 10.0).round() / 10.0, n)))
        .collect())
}

pub async fn summarize<C: ConnectionTrait>(db: &C, services: Vec<service::Model>) -> Result<Vec<ServiceSummary>, ServiceError> {
    let mut cat_ids: Vec<Uuid> = services.iter().map(|s| s.category_id).collect();
    cat_ids.dedup();
    let categories: HashMap<Uuid, service_category::Model> = service_category::Entity::find()
        .filter(service_category::Column::Id.is_in(cat_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    let provider_ids: Vec<Uuid> = services.iter().map(|s| s.provider_id).collect();
    let providers = provider_names(db, &provider_ids).await?;
    let ids: Vec<Uuid> = services.iter().map(|s| s.id).collect();
    let ratings = rating_stats(db, &ids).await?;

    Ok(services
        .into_iter()
        .map(|s| {
            let cat = categories.get(&s.category_id);
            let (average_rating, review_count) = match ratings.get(&s.id) {
                Some((avg, n)) => (Some(*avg), *n),
                None => (None, 0),
            };
            ServiceSummary {
                id: s.id,
                category_id: s.category_id,
                category_name: cat.map(|c| c.name.clone()).unwrap_or_default(),
                category_slug: cat.map(|c| c.slug.clone()).unwrap_or_default(),
                provider_id: s.provider_id,
                provider_name: providers.get(&s.provider_id).cloned().unwrap_or_default(),
                price_display: money::format_inr(s.price),
                name: s.name,
                description: s.description,
                price: s.price,
                duration_hours: s.duration_hours,
                image_url: s.image_url,
                is_active: s.is_active,
                is_available: s.is_available,
                average_rating,
                review_count,
            }
        })
        .collect())
}

/// All categories by name, each with the number of active services in it.
#[instrument(skip(db))]
pub async fn list_categories(db: &DatabaseConnection) -> Result<Vec<CategorySummary>, ServiceError> {
    let categories = service_category::Entity::find()
        .order_by_asc(service_category::Column::Name)
        .all(db)
        .await?;
    let active: Vec<Uuid> = service::Entity::find()
        .select_only()
        .column(service::Column::CategoryId)
        .filter(service::Column::IsActive.eq(true))
        .into_tuple()
        .all(db)
        .await?;
    let mut counts: HashMap<Uuid, u64> = HashMap::new();
    for id in active {
        *counts.entry(id).or_default() += 1;
    }
    Ok(categories
        .into_iter()
        .map(|c| CategorySummary {
            service_count: counts.get(&c.id).copied().unwrap_or(0),
            id: c.id,
            name: c.name,
            slug: c.slug,
            description: c.description,
            image_url: c.image_url,
        })
        .collect())
}

pub async fn get_category_by_slug(db: &DatabaseConnection, slug: &str) -> Result<service_category::Model, ServiceError> {
    service_category::find_by_slug(db, slug)
        .await?
        .ok_or_else(|| ServiceError::not_found("category"))
}

#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn create_category(db: &DatabaseConnection, actor: &Actor, input: CategoryInput) -> Result<service_category::Model, ServiceError> {
    actor.require_admin()?;
    let slug = match input.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s.to_string(),
        None => validation::slugify(&input.name),
    };
    let exists = service_category::Entity::find()
        .filter(
            Condition::any()
                .add(service_category::Column::Name.eq(input.name.trim()))
                .add(service_category::Column::Slug.eq(slug.as_str())),
        )
        .one(db)
        .await?;
    if exists.is_some() {
        return Err(ServiceError::Conflict("a category with this name or slug already exists".into()));
    }
    let created = service_category::create(db, &input.name, &slug, &input.description, input.image_url.as_deref()).await?;
    info!(category_id = %created.id, slug = %created.slug, "category_created");
    Ok(created)
}

const LIKE_ESCAPE: char = '\\';

/// Case-insensitive substring pattern with `%`, `_` and the escape char matched literally.
fn contains_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            out.push(LIKE_ESCAPE);
        }
        out.push(c);
    }
    out.push('%');
    out
}

/// Paged service listing ordered by name.
#[instrument(skip(db))]
pub async fn list_services(db: &DatabaseConnection, filter: ServiceFilter, opts: Pagination) -> Result<Page<ServiceSummary>, ServiceError> {
    let mut q = service::Entity::find();
    if filter.only_active {
        q = q.filter(service::Column::IsActive.eq(true));
    }
    if let Some(slug) = filter.category_slug.as_deref().filter(|s| !s.is_empty()) {
        match service_category::find_by_slug(db, slug).await? {
            Some(c) => q = q.filter(service::Column::CategoryId.eq(c.id)),
            None => return Ok(Page::new(Vec::new(), opts, 0)),
        }
    }
    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = contains_pattern(term);
        q = q.filter(
            Condition::any()
                .add(Expr::expr(Func::lower(Expr::col(service::Column::Name))).like(LikeExpr::new(pattern.clone()).escape(LIKE_ESCAPE)))
                .add(Expr::expr(Func::lower(Expr::col(service::Column::Description))).like(LikeExpr::new(pattern).escape(LIKE_ESCAPE))),
        );
    }
    if let Some(min) = filter.min_price {
        q = q.filter(service::Column::Price.gte(min));
    }
    if let Some(max) = filter.max_price {
        q = q.filter(service::Column::Price.lte(max));
    }
    if let Some(pid) = filter.provider_id {
        q = q.filter(service::Column::ProviderId.eq(pid));
    }

    let (page_idx, per_page) = opts.normalize();
    let paginator = q.order_by_asc(service::Column::Name).paginate(db, per_page);
    let total = paginator.num_items().await?;
    let rows = paginator.fetch_page(page_idx).await?;
    Ok(Page::new(summarize(db, rows).await?, opts, total))
}

/// Reviews newest first, optionally restricted to some services.
pub async fn reviews_for_services<C: ConnectionTrait>(db: &C, service_ids: Option<&[Uuid]>, limit: Option<u64>) -> Result<Vec<ReviewView>, ServiceError> {
    let mut q = review::Entity::find()
        .find_also_related(booking::Entity)
        .order_by_desc(review::Column::CreatedAt);
    if let Some(ids) = service_ids {
        q = q.filter(booking::Column::ServiceId.is_in(ids.to_vec()));
    }
    if let Some(n) = limit {
        q = q.limit(n);
    }
    let rows = q.all(db).await?;

    let customer_ids: Vec<Uuid> = rows.iter().map(|(r, _)| r.customer_id).collect();
    let customers: HashMap<Uuid, String> = user::Entity::find()
        .filter(user::Column::Id.is_in(customer_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u.full_name()))
        .collect();
    let svc_ids: Vec<Uuid> = rows.iter().filter_map(|(_, b)| b.as_ref().map(|b| b.service_id)).collect();
    let services: HashMap<Uuid, String> = service::Entity::find()
        .filter(service::Column::Id.is_in(svc_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();

    Ok(rows
        .into_iter()
        .filter_map(|(r, b)| {
            let b = b?;
            Some(ReviewView {
                id: r.id,
                booking_id: r.booking_id,
                service_id: b.service_id,
                service_name: services.get(&b.service_id).cloned().unwrap_or_default(),
                customer_name: customers.get(&r.customer_id).cloned().unwrap_or_default(),
                rating: r.rating,
                comment: r.comment,
                created_at: r.created_at,
            })
        })
        .collect())
}

pub async fn get_service_detail(db: &DatabaseConnection, id: Uuid) -> Result<ServiceDetail, ServiceError> {
    let svc = service::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("service"))?;
    let images = service_image::list_for_service(db, id).await?;
    let reviews = reviews_for_services(db, Some(std::slice::from_ref(&id)), Some(10)).await?;
    let summary = summarize(db, vec![svc])
        .await?
        .pop()
        .ok_or_else(|| ServiceError::not_found("service"))?;
    Ok(ServiceDetail { summary, images, reviews })
}

/// Load a service the actor may modify: its provider, or any administrator.
async fn load_owned<C: ConnectionTrait>(db: &C, actor: &Actor, id: Uuid) -> Result<service::Model, ServiceError> {
    let svc = service::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("service"))?;
    if !actor.is_admin() && svc.provider_id != actor.user_id {
        return Err(ServiceError::Forbidden("you can only manage your own services".into()));
    }
    Ok(svc)
}

#[instrument(skip(db, input), fields(actor = %actor.user_id, name = %input.name))]
pub async fn create_service(db: &DatabaseConnection, actor: &Actor, input: CreateServiceInput) -> Result<ServiceSummary, ServiceError> {
    let provider_id = match actor.role {
        Role::Provider => actor.user_id,
        Role::Admin => {
            let pid = input
                .provider_id
                .ok_or_else(|| ServiceError::Validation("provider_id required".into()))?;
            let provider = user::Entity::find_by_id(pid)
                .one(db)
                .await?
                .ok_or_else(|| ServiceError::not_found("provider"))?;
            if provider.role != Role::Provider {
                return Err(ServiceError::Validation("provider_id must reference a provider account".into()));
            }
            pid
        }
        Role::Customer => return Err(ServiceError::Forbidden("customers cannot create services".into())),
    };
    service_category::Entity::find_by_id(input.category_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("category"))?;
    let created = service::create(db, service::NewService {
        name: &input.name,
        category_id: input.category_id,
        provider_id,
        description: &input.description,
        price: input.price,
        duration_hours: input.duration_hours,
        image_url: input.image_url.as_deref(),
    })
    .await?;
    info!(service_id = %created.id, provider_id = %provider_id, "service_created");
    summarize(db, vec![created])
        .await?
        .pop()
        .ok_or_else(|| ServiceError::Internal("service vanished after insert".into()))
}

#[instrument(skip(db, input), fields(actor = %actor.user_id, service_id = %id))]
pub async fn update_service(db: &DatabaseConnection, actor: &Actor, id: Uuid, input: UpdateServiceInput) -> Result<ServiceSummary, ServiceError> {
    let svc = load_owned(db, actor, id).await?;
    let mut am: service::ActiveModel = svc.into();
    if let Some(name) = input.name {
        validation::validate_required("name", &name, 200)?;
        am.name = Set(name.trim().to_string());
    }
    if let Some(cid) = input.category_id {
        service_category::Entity::find_by_id(cid)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("category"))?;
        am.category_id = Set(cid);
    }
    if let Some(d) = input.description {
        am.description = Set(d.trim().to_string());
    }
    if let Some(p) = input.price {
        service::validate_price(p)?;
        am.price = Set(p);
    }
    if let Some(h) = input.duration_hours {
        service::validate_duration(h)?;
        am.duration_hours = Set(h);
    }
    if let Some(url) = input.image_url {
        am.image_url = Set(Some(url).filter(|u| !u.trim().is_empty()));
    }
    if let Some(a) = input.is_active {
        am.is_active = Set(a);
    }
    if let Some(a) = input.is_available {
        am.is_available = Set(a);
    }
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    summarize(db, vec![updated])
        .await?
        .pop()
        .ok_or_else(|| ServiceError::not_found("service"))
}

/// Services with booking history cannot be removed; deactivate them instead.
#[instrument(skip(db), fields(actor = %actor.user_id, service_id = %id))]
pub async fn delete_service(db: &DatabaseConnection, actor: &Actor, id: Uuid) -> Result<(), ServiceError> {
    let svc = load_owned(db, actor, id).await?;
    let bookings = booking::Entity::find()
        .filter(booking::Column::ServiceId.eq(id))
        .count(db)
        .await?;
    if bookings > 0 {
        return Err(ServiceError::Conflict("service has bookings; deactivate it instead".into()));
    }
    svc.delete(db).await?;
    info!("service_deleted");
    Ok(())
}

async fn clear_primary<C: ConnectionTrait>(db: &C, service_id: Uuid) -> Result<(), ServiceError> {
    service_image::Entity::update_many()
        .set(service_image::ActiveModel { is_primary: Set(false), ..Default::default() })
        .filter(service_image::Column::ServiceId.eq(service_id))
        .filter(service_image::Column::IsPrimary.eq(true))
        .exec(db)
        .await?;
    Ok(())
}

/// Add a gallery image. The first image of a service, or one flagged primary, becomes the only primary.
#[instrument(skip(db, input), fields(actor = %actor.user_id, service_id = %service_id))]
pub async fn add_service_image(db: &DatabaseConnection, actor: &Actor, service_id: Uuid, input: ImageInput) -> Result<service_image::Model, ServiceError> {
    let txn = db.begin().await?;
    load_owned(&txn, actor, service_id).await?;
    let existing = service_image::Entity::find()
        .filter(service_image::Column::ServiceId.eq(service_id))
        .count(&txn)
        .await?;
    let primary = input.is_primary || existing == 0;
    if primary {
        clear_primary(&txn, service_id).await?;
    }
    let img = service_image::create(&txn, service_id, &input.image_url, &input.caption, primary, input.sort_order).await?;
    txn.commit().await?;
    Ok(img)
}

/// Remove an image; if it was primary the next image in gallery order is promoted.
#[instrument(skip(db), fields(actor = %actor.user_id, image_id = %image_id))]
pub async fn delete_service_image(db: &DatabaseConnection, actor: &Actor, image_id: Uuid) -> Result<(), ServiceError> {
    let txn = db.begin().await?;
    let img = service_image::Entity::find_by_id(image_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("image"))?;
    load_owned(&txn, actor, img.service_id).await?;
    let was_primary = img.is_primary;
    let service_id = img.service_id;
    img.delete(&txn).await?;
    if was_primary {
        if let Some(next) = service_image::list_for_service(&txn, service_id).await?.into_iter().next() {
            let mut am: service_image::ActiveModel = next.into();
            am.is_primary = Set(true);
            am.update(&txn).await?;
        }
    }
    txn.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{get_db, make_service, make_user};

    #[tokio::test]
    async fn categories_count_only_active_services() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let (svc, provider) = make_service(&db, 10_000).await?;
        let cats = list_categories(&db).await?;
        let cat = cats.iter().find(|c| c.id == svc.category_id).unwrap();
        assert_eq!(cat.service_count, 1);

        update_service(&db, &provider, svc.id, UpdateServiceInput { is_active: Some(false), ..Default::default() }).await?;
        let cats = list_categories(&db).await?;
        assert_eq!(cats.iter().find(|c| c.id == svc.category_id).unwrap().service_count, 0);
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_category_conflicts() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let (_, admin) = make_user(&db, Role::Admin).await?;
        let name = format!("Electrical {}", Uuid::new_v4().simple());
        let c = create_category(&db, &admin, CategoryInput { name: name.clone(), slug: None, description: String::new(), image_url: None }).await?;
        assert_eq!(c.slug, validation::slugify(&name));
        let (_, customer) = make_user(&db, Role::Customer).await?;
        let denied = create_category(&db, &customer, CategoryInput { name: name.clone(), slug: None, description: String::new(), image_url: None }).await;
        assert!(matches!(denied, Err(ServiceError::Forbidden(_))));
        let again = create_category(&db, &admin, CategoryInput { name, slug: None, description: String::new(), image_url: None }).await;
        assert!(matches!(again, Err(ServiceError::Conflict(_))));
        Ok(())
    }

    #[tokio::test]
    async fn list_services_filters_by_search_and_price() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let (svc, _) = make_service(&db, 25_000).await?;
        let slug = service_category::Entity::find_by_id(svc.category_id).one(&db).await?.unwrap().slug;

        let hit = ServiceFilter { category_slug: Some(slug.clone()), search: Some("deep".into()), ..ServiceFilter::public() };
        let page = list_services(&db, hit, Pagination::default()).await?;
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].price_display, "\u{20b9}250.00");
        assert_eq!(page.items[0].provider_name, "Test Services Co");

        let miss = ServiceFilter { category_slug: Some(slug), max_price: Some(1_000), ..ServiceFilter::public() };
        assert_eq!(list_services(&db, miss, Pagination::default()).await?.total, 0);
        Ok(())
    }

    #[test]
    fn search_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("Deep"), "%deep%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }

    #[tokio::test]
    async fn wildcard_search_terms_match_literally() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let (svc, _) = make_service(&db, 25_000).await?;
        let slug = service_category::Entity::find_by_id(svc.category_id).one(&db).await?.unwrap().slug;

        for term in ["%", "_", "d%p"] {
            let f = ServiceFilter { category_slug: Some(slug.clone()), search: Some(term.into()), ..ServiceFilter::public() };
            assert_eq!(list_services(&db, f, Pagination::default()).await?.total, 0, "term {term:?}");
        }
        Ok(())
    }

    #[tokio::test]
    async fn providers_cannot_touch_foreign_services() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let (svc, _) = make_service(&db, 5_000).await?;
        let (_, other) = make_user(&db, Role::Provider).await?;
        let res = update_service(&db, &other, svc.id, UpdateServiceInput { price: Some(1), ..Default::default() }).await;
        assert!(matches!(res, Err(ServiceError::Forbidden(_))));
        Ok(())
    }

    #[tokio::test]
    async fn only_one_primary_image_per_service() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let (svc, provider) = make_service(&db, 5_000).await?;
        let first = add_service_image(&db, &provider, svc.id, ImageInput { image_url: "/a.jpg".into(), caption: String::new(), is_primary: false, sort_order: 0 }).await?;
        assert!(first.is_primary);
        let second = add_service_image(&db, &provider, svc.id, ImageInput { image_url: "/b.jpg".into(), caption: String::new(), is_primary: true, sort_order: 1 }).await?;
        let images = service_image::list_for_service(&db, svc.id).await?;
        assert_eq!(images.iter().filter(|i| i.is_primary).count(), 1);
        assert!(images.iter().find(|i| i.id == second.id).unwrap().is_primary);

        delete_service_image(&db, &provider, second.id).await?;
        let images = service_image::list_for_service(&db, svc.id).await?;
        assert_eq!(images.len(), 1);
        assert!(images[0].is_primary);
        Ok(())
    }

    #[tokio::test]
    async fn admin_must_name_a_provider() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;
        let (svc, provider) = make_service(&db, 5_000).await?;
        let (_, admin) = make_user(&db, Role::Admin).await?;
        let input = CreateServiceInput {
            name: "AC Service".into(),
            category_id: svc.category_id,
            description: String::new(),
            price: 59_900,
            duration_hours: 2,
            image_url: None,
            provider_id: None,
        };
        assert!(matches!(create_service(&db, &admin, input.clone()).await, Err(ServiceError::Validation(_))));
        let created = create_service(&db, &admin, CreateServiceInput { provider_id: Some(provider.user_id), ..input }).await?;
        assert_eq!(created.provider_id, provider.user_id);
        delete_service(&db, &admin, created.id).await?;
        Ok(())
    }
}
