use once_cell::sync::Lazy;
use prometheus::{register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec, TextEncoder};

// Prometheus metrics (default registry)
pub static BOOKINGS_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "homeservice_bookings_created_total",
        "Total bookings created by customers"
    )
    .expect("register bookings_created_total")
});

pub static BOOKINGS_APPROVED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "homeservice_bookings_approved_total",
        "Total bookings approved by administrators"
    )
    .expect("register bookings_approved_total")
});

pub static BOOKINGS_REJECTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "homeservice_bookings_rejected_total",
        "Total bookings rejected by administrators or servicers"
    )
    .expect("register bookings_rejected_total")
});

pub static PAYMENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "homeservice_payments_total",
        "Simulated payment attempts by outcome",
        &["outcome"]
    )
    .expect("register payments_total")
});

pub static INVOICES_GENERATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "homeservice_invoices_generated_total",
        "Total invoices generated"
    )
    .expect("register invoices_generated_total")
});

/// Render the default registry in the Prometheus text exposition format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_exposition() {
        BOOKINGS_CREATED_TOTAL.inc();
        PAYMENTS_TOTAL.with_label_values(&["success"]).inc();
        let text = encode_metrics().unwrap();
        assert!(text.contains("homeservice_bookings_created_total"));
        assert!(text.contains("outcome=\"success\""));
    }
}
