//! Prometheus metrics for post-service.
//!
//! Exposes post/feed collectors and an HTTP handler for the `/metrics` endpoint.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder, HistogramVec,
    IntCounter, IntCounterVec, TextEncoder,
};

lazy_static! {
    /// Posts successfully appended.
    pub static ref POSTS_CREATED_TOTAL: IntCounter = register_int_counter!(
        "posts_created_total",
        "Total posts appended to the store"
    )
    .expect("failed to register posts_created_total");

    /// Feed queries segmented by kind (recent, search, by_author, latest).
    pub static ref FEED_QUERY_TOTAL: IntCounterVec = register_int_counter_vec!(
        "feed_query_total",
        "Total feed queries segmented by kind",
        &["kind"]
    )
    .expect("failed to register feed_query_total");

    /// Feed query latency segmented by kind.
    pub static ref FEED_QUERY_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "feed_query_duration_seconds",
        "Feed query duration segmented by kind",
        &["kind"]
    )
    .expect("failed to register feed_query_duration_seconds");
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
