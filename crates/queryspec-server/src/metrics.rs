use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter_vec, Histogram,
    HistogramVec, IntCounterVec,
};

pub static OPS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!("queryspec_ops_total", "Completed operations", &["op"]).unwrap()
});

pub static OP_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!("op_duration_seconds", "Handler latency", &["op"]).unwrap()
});

pub static ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!("queryspec_errors_total", "Error responses by status", &["status"])
        .unwrap()
});

pub static SEARCH_PAGE_ITEMS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "search_page_items",
        "Items returned per search page",
        vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0]
    )
    .unwrap()
});
