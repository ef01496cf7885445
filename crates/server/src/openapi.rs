use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub password: String,
    /// `customer` or `provider`
    pub role: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct BookingRequest {
    /// RFC 3339 timestamp in the future
    pub booking_date: String,
    /// `HH:MM`
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub address: String,
    pub phone_number: String,
    pub special_instructions: Option<String>,
}

#[derive(ToSchema)]
pub struct PaymentRequestDoc {
    /// one of `upi`, `card`, `netbanking`, `wallet`, `cod`
    pub payment_method: String,
    pub simulate_failure: Option<bool>,
}

#[derive(ToSchema)]
pub struct ReviewRequest { pub rating: i32, pub comment: Option<String> }

#[derive(ToSchema)]
pub struct ServiceRequest {
    pub name: String,
    pub category_id: Uuid,
    pub description: Option<String>,
    /// paise
    pub price: i64,
    pub duration_hours: Option<i32>,
    pub image_url: Option<String>,
    pub provider_id: Option<Uuid>,
}

#[derive(ToSchema)]
pub struct CategoryRequest {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(ToSchema)]
pub struct ServicerStatusRequest {
    pub invoice_number: String,
    /// `completed` or `rejected`
    pub status: String,
    pub note: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::catalog::list_categories,
        crate::routes::catalog::category_services,
        crate::routes::catalog::list_services,
        crate::routes::catalog::service_detail,
        crate::routes::bookings::book_service,
        crate::routes::bookings::list_bookings,
        crate::routes::bookings::get_booking,
        crate::routes::bookings::cancel_booking,
        crate::routes::bookings::payment_quote,
        crate::routes::bookings::pay,
        crate::routes::bookings::get_invoice,
        crate::routes::bookings::download_invoice,
        crate::routes::bookings::add_review,
        crate::routes::provider::dashboard,
        crate::routes::provider::create_service,
        crate::routes::provider::servicer_dashboard,
        crate::routes::provider::servicer_status,
        crate::routes::admin::dashboard,
        crate::routes::admin::list_bookings,
        crate::routes::admin::approve_booking,
        crate::routes::admin::reject_booking,
        crate::routes::admin::create_category,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            BookingRequest,
            PaymentRequestDoc,
            ReviewRequest,
            ServiceRequest,
            CategoryRequest,
            ServicerStatusRequest,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "catalog"),
        (name = "bookings"),
        (name = "payments"),
        (name = "invoices"),
        (name = "reviews"),
        (name = "provider"),
        (name = "servicer"),
        (name = "admin")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_core_paths() {
        let doc = ApiDoc::openapi();
        for path in ["/health", "/auth/login", "/api/services/{id}/book", "/api/admin/bookings/{id}/approve"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
