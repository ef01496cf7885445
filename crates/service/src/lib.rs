//! Service layer for the marketplace: business rules on top of `models`.
//! - Handlers call into these functions; nothing here knows about HTTP.
//! - Multi-row writes run in a transaction; status changes are conditional updates.

pub mod errors;
pub mod actor;
pub mod pagination;
pub mod auth;
pub mod catalog;
pub mod booking;
pub mod payment;
pub mod invoice;
pub mod review;
pub mod provider;
pub mod servicer;
pub mod admin;
pub mod seed;
#[cfg(test)]
pub mod test_support;

pub use actor::Actor;
pub use errors::ServiceError;
