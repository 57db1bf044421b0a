use once_cell::sync::Lazy;
use prometheus::{
    register_int_counter_vec, register_int_gauge_vec, Encoder, IntCounterVec, IntGaugeVec,
    TextEncoder,
};

use crate::errors::ServiceError;

// Prometheus metrics (default registry)
pub static OPERATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "reviews_operations_total",
        "Review operations by name and outcome",
        &["operation", "outcome"]
    )
    .expect("register reviews_operations_total")
});

pub static REVIEWS_STORED: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!("reviews_stored", "Reviews currently stored", &["store"])
        .expect("register reviews_stored")
});

/// Count one call of `operation`; failures are labelled with the error kind.
pub fn observe<T>(operation: &str, result: &Result<T, ServiceError>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    OPERATIONS_TOTAL.with_label_values(&[operation, outcome]).inc();
}

/// Record the size of the store at `location`.
pub fn set_stored(location: &str, count: usize) {
    REVIEWS_STORED
        .with_label_values(&[location])
        .set(i64::try_from(count).unwrap_or(i64::MAX));
}

pub fn stored(location: &str) -> i64 {
    REVIEWS_STORED.with_label_values(&[location]).get()
}

/// Text exposition of the default registry.
pub fn encode_metrics() -> Result<String, ServiceError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| ServiceError::Storage(format!("metrics encode error: {e}")))?;
    String::from_utf8(buffer)
        .map_err(|e| ServiceError::Storage(format!("metrics encode error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_are_labelled_by_error_kind() -> Result<(), ServiceError> {
        let before = OPERATIONS_TOTAL.with_label_values(&["metrics_test", "not_found"]).get();
        observe::<()>("metrics_test", &Err(ServiceError::not_found("x")));
        observe("metrics_test", &Ok(1));
        let after = OPERATIONS_TOTAL.with_label_values(&["metrics_test", "not_found"]).get();
        assert_eq!(after, before + 1);

        set_stored("metrics_test_store", 3);
        assert_eq!(stored("metrics_test_store"), 3);
        let text = encode_metrics()?;
        assert!(text.contains("reviews_operations_total"));
        assert!(text.contains(r#"reviews_stored{store="metrics_test_store"} 3"#));
        Ok(())
    }
}
