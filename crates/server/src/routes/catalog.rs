//! Public catalog browsing.
use axum::{extract::{Path, Query, State}, Json};
use serde::Deserialize;
use uuid::Uuid;

use service::catalog::{self, CategorySummary, ReviewView, ServiceDetail, ServiceFilter, ServiceSummary};
use service::pagination::{Page, Pagination};

use crate::errors::JsonApiError;
use crate::routes::auth::ServerState;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct ServiceQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ServiceQuery {
    pub fn split(self, only_active: bool) -> (ServiceFilter, Pagination) {
        let defaults = Pagination::default();
        let page = Pagination {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        };
        let filter = ServiceFilter {
            category_slug: self.category,
            search: self.search,
            min_price: self.min_price,
            max_price: self.max_price,
            provider_id: None,
            only_active,
        };
        (filter, page)
    }
}

#[utoipa::path(get, path = "/api/categories", tag = "catalog", responses((status = 200, description = "Categories with active service counts")))]
pub async fn list_categories(State(state): State<ServerState>) -> Result<Json<Vec<CategorySummary>>, JsonApiError> {
    Ok(Json(catalog::list_categories(&state.db).await?))
}

#[utoipa::path(get, path = "/api/categories/{slug}/services", tag = "catalog", params(("slug" = String, Path, description = "Category slug"), ServiceQuery), responses((status = 200, description = "OK"), (status = 404, description = "Not Found")))]
pub async fn category_services(
    State(state): State<ServerState>,
    Path(slug): Path<String>,
    Query(q): Query<ServiceQuery>,
) -> Result<Json<Page<ServiceSummary>>, JsonApiError> {
    let category = catalog::get_category_by_slug(&state.db, &slug).await?;
    let (mut filter, page) = q.split(true);
    filter.category_slug = Some(category.slug);
    Ok(Json(catalog::list_services(&state.db, filter, page).await?))
}

#[utoipa::path(get, path = "/api/services", tag = "catalog", params(ServiceQuery), responses((status = 200, description = "OK")))]
pub async fn list_services(State(state): State<ServerState>, Query(q): Query<ServiceQuery>) -> Result<Json<Page<ServiceSummary>>, JsonApiError> {
    let (filter, page) = q.split(true);
    Ok(Json(catalog::list_services(&state.db, filter, page).await?))
}

#[utoipa::path(get, path = "/api/services/{id}", tag = "catalog", params(("id" = Uuid, Path, description = "Service ID")), responses((status = 200, description = "OK"), (status = 404, description = "Not Found")))]
pub async fn service_detail(State(state): State<ServerState>, Path(id): Path<Uuid>) -> Result<Json<ServiceDetail>, JsonApiError> {
    Ok(Json(catalog::get_service_detail(&state.db, id).await?))
}

pub async fn service_reviews(State(state): State<ServerState>, Path(id): Path<Uuid>) -> Result<Json<Vec<ReviewView>>, JsonApiError> {
    Ok(Json(service::review::reviews_for_service(&state.db, id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_defaults_to_first_page() {
        let (filter, page) = ServiceQuery { search: Some("pipe".into()), ..Default::default() }.split(true);
        assert!(filter.only_active);
        assert_eq!(filter.search.as_deref(), Some("pipe"));
        assert_eq!((page.page, page.per_page), (1, 20));
    }
}
