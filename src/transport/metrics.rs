use crate::ErrorKind;
use http::{Method, StatusCode};
use std::time::Duration;

pub(crate) struct InFlightGuard {
    gauge: metrics::Gauge,
}

impl InFlightGuard {
    pub(crate) fn new() -> Self {
        let gauge = metrics::gauge!("api_facade_inflight");
        gauge.increment(1.0);
        Self { gauge }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.gauge.decrement(1.0);
    }
}

fn status_class(status: StatusCode) -> &'static str {
    match status.as_u16() {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}

fn error_kind_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::DuplicateEndpoint => "duplicate_endpoint",
        ErrorKind::UnknownEndpoint => "unknown_endpoint",
        ErrorKind::Status => "status",
        ErrorKind::Transport => "transport",
        ErrorKind::Decode => "decode",
        ErrorKind::Encode => "encode",
        ErrorKind::Payload => "payload",
        ErrorKind::Rejected => "rejected",
        ErrorKind::InvalidConfig => "invalid_config",
    }
}

pub(crate) fn record_outcome(
    method: &Method,
    status: Option<StatusCode>,
    latency: Duration,
    error_kind: Option<ErrorKind>,
) {
    let method: metrics::SharedString = method.as_str().to_owned().into();
    let status_class = status.map(status_class).unwrap_or("none");

    metrics::counter!(
        "api_facade_requests_total",
        "method" => method.clone(),
        "status_class" => status_class
    )
    .increment(1);
    metrics::histogram!(
        "api_facade_request_duration_seconds",
        "method" => method.clone(),
        "status_class" => status_class
    )
    .record(latency);

    if let Some(kind) = error_kind {
        metrics::counter!(
            "api_facade_errors_total",
            "method" => method,
            "kind" => error_kind_label(kind)
        )
        .increment(1);
    }
}

/// Registered endpoints, recorded once per constructed facade.
pub(crate) fn record_registry_size(endpoints: usize) {
    metrics::gauge!("api_facade_registered_endpoints").set(endpoints as f64);
}
