use std::time::Duration;

use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{
    DefaultOnBodyChunk, DefaultOnEos, MakeSpan, OnFailure, OnRequest, OnResponse, TraceLayer,
};

const DELIVERY_HEADER: &str = "x-github-delivery";
const EVENT_HEADER: &str = "x-github-event";

pub type DeliveryTraceLayer = TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    DeliverySpan,
    DeliveryEvents,
    DeliveryEvents,
    DefaultOnBodyChunk,
    DefaultOnEos,
    DeliveryEvents,
>;

pub fn layer() -> DeliveryTraceLayer {
    TraceLayer::new_for_http()
        .make_span_with(DeliverySpan)
        .on_request(DeliveryEvents)
        .on_response(DeliveryEvents)
        .on_failure(DeliveryEvents)
}

fn header_str<'a, B>(req: &'a http::Request<B>, name: &str) -> Option<&'a str> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
}

/// One span per inbound request, tagged with the GitHub delivery it carries.
#[derive(Clone, Copy, Debug)]
pub struct DeliverySpan;

impl<B> MakeSpan<B> for DeliverySpan {
    fn make_span(&mut self, req: &http::Request<B>) -> tracing::Span {
        // never record the whole header map, it holds the signature
        let path = req.uri().path();
        tracing::info_span!(
            parent: None,
            "http.server.request",
            "error.type" = tracing::field::Empty,
            "github.delivery" = header_str(req, DELIVERY_HEADER),
            "github.event" = header_str(req, EVENT_HEADER),
            "http.request.method" = %req.method(),
            "http.response.status_code" = tracing::field::Empty,
            "otel.kind" = "server",
            "otel.name" = format!("{} {path}", req.method()),
            "otel.status_code" = tracing::field::Empty,
            "url.path" = path,
            "user_agent.original" = header_str(req, "user-agent"),
        )
    }
}

#[derive(Clone, Copy, Debug)]
pub struct DeliveryEvents;

impl<B> OnRequest<B> for DeliveryEvents {
    fn on_request(&mut self, req: &http::Request<B>, _span: &tracing::Span) {
        tracing::debug!(
            content_length = header_str(req, "content-length"),
            "request received"
        );
    }
}

impl<B> OnResponse<B> for DeliveryEvents {
    fn on_response(self, res: &http::Response<B>, latency: Duration, span: &tracing::Span) {
        let status = res.status();
        span.record("http.response.status_code", status.as_u16());
        if status.is_client_error() {
            span.record("error.type", "client");
        } else if status.is_success() {
            span.record("otel.status_code", "ok");
        }
        tracing::info!(
            status = status.as_u16(),
            latency_ms = latency.as_millis(),
            "request processed"
        );
    }
}

impl<F: std::fmt::Display> OnFailure<F> for DeliveryEvents {
    fn on_failure(&mut self, failure: F, latency: Duration, span: &tracing::Span) {
        span.record("error.type", "server");
        span.record("otel.status_code", "error");
        tracing::error!(
            error = %failure,
            latency_ms = latency.as_millis(),
            "request failed"
        );
    }
}
