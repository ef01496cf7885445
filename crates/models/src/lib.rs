//! Persistence layer: sea-orm entities, string enums, field validation and money math.
pub mod errors;
pub mod db;
pub mod enums;
pub mod validation;
pub mod money;
pub mod user;
pub mod user_credentials;
pub mod provider_profile;
pub mod service_category;
pub mod service;
pub mod service_image;
pub mod booking;
pub mod review;
pub mod provider_schedule;
pub mod payment;
pub mod invoice;

pub use enums::{BookingStatus, PaymentMethod, PaymentStatus, Role, TransactionStatus, Weekday};

#[cfg(test)]
mod tests;
