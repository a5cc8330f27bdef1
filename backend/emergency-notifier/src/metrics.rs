use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, TextEncoder};

static INVOCATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "emergency_notifier_invocations_total",
            "Emergency fan-out invocations by outcome",
        ),
        &["outcome"],
    )
    .expect("failed to create emergency_notifier_invocations_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register emergency_notifier_invocations_total");
    counter
});

static DISPATCH_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "emergency_notifier_dispatch_total",
            "Push dispatch calls by branch and status",
        ),
        &["branch", "status"],
    )
    .expect("failed to create emergency_notifier_dispatch_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register emergency_notifier_dispatch_total");
    counter
});

static NEARBY_RECIPIENTS: Lazy<Histogram> = Lazy::new(|| {
    let histogram = Histogram::with_opts(
        HistogramOpts::new(
            "emergency_notifier_nearby_recipients",
            "Unique device tokens targeted per emergency",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0]),
    )
    .expect("failed to create emergency_notifier_nearby_recipients");
    prometheus::default_registry()
        .register(Box::new(histogram.clone()))
        .expect("failed to register emergency_notifier_nearby_recipients");
    histogram
});

/// `outcome` is a delivery outcome or an error reason
pub fn record_invocation(outcome: &str) {
    INVOCATIONS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_dispatch(branch: &str, status: &str) {
    DISPATCH_TOTAL.with_label_values(&[branch, status]).inc();
}

pub fn observe_nearby_recipients(count: usize) {
    NEARBY_RECIPIENTS.observe(count as f64);
}

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
