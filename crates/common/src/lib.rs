//! Shared building blocks for the homeservice crates: logging setup,
//! pagination, runtime directory checks and the metrics registry.

pub mod types;
pub mod utils;
pub mod pagination;
pub mod env;
pub mod metrics;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok" };
        assert_eq!(h.status, "ok");
    }
}
