use once_cell::sync::Lazy;
use prometheus::{register_int_counter, Encoder, IntCounter, TextEncoder};

// Prometheus metrics (default registry)
pub static PAYMENTS_COMPLETED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "learning_payments_completed_total",
        "Charges captured and recorded as completed"
    )
    .expect("register payments_completed_total")
});

pub static PAYMENTS_FAILED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "learning_payments_failed_total",
        "Charges declined or not reachable at the gateway"
    )
    .expect("register payments_failed_total")
});

pub static ENROLLMENTS_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "learning_enrollments_created_total",
        "Enrollments created, directly or through payment"
    )
    .expect("register enrollments_created_total")
});

pub static COURSE_CACHE_HITS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "learning_course_cache_hits_total",
        "Course list pages served from cache"
    )
    .expect("register course_cache_hits_total")
});

pub static COURSE_CACHE_MISSES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "learning_course_cache_misses_total",
        "Course list pages loaded from the database"
    )
    .expect("register course_cache_misses_total")
});

pub static MAIL_DROPPED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "learning_mail_dropped_total",
        "Outbound mails dropped because the queue was full or closed"
    )
    .expect("register mail_dropped_total")
});

/// Render the default registry in the Prometheus text format.
pub fn encode_metrics() -> Result<String, String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| format!("metrics encode error: {e}"))?;
    String::from_utf8(buffer).map_err(|e| format!("metrics encode error: {e}"))
}
