use http::Extensions;
use opentelemetry_semantic_conventions::attribute as semver;
use reqwest::{Request, Response, StatusCode};
use reqwest_tracing::{ReqwestOtelSpanBackend, default_on_request_end, reqwest_otel_span};
use tracing::Span;

/// Client span for every call to the GitHub API, named after method and path.
#[derive(Clone, Copy, Debug, Default)]
pub struct GithubSpanBackend;

pub type TracingMiddleware = reqwest_tracing::TracingMiddleware<GithubSpanBackend>;

fn error_type(status: StatusCode) -> Option<&'static str> {
    if status.is_server_error() {
        Some("server")
    } else if status.is_client_error() {
        Some("client")
    } else {
        None
    }
}

fn outcome_error_type(outcome: &reqwest_middleware::Result<Response>) -> Option<&'static str> {
    match outcome {
        Ok(res) => error_type(res.status()),
        Err(err) => match err.status() {
            Some(status) => error_type(status).or(Some("client")),
            None => Some("transport"),
        },
    }
}

impl ReqwestOtelSpanBackend for GithubSpanBackend {
    fn on_request_start(req: &Request, _extensions: &mut Extensions) -> Span {
        // the query string is left out of the name
        let name = format!("{} {}", req.method(), req.url().path());
        reqwest_otel_span!(
            name = name,
            req,
            peer.service = "github",
            error.type = tracing::field::Empty,
        )
    }

    fn on_request_end(
        span: &Span,
        outcome: &reqwest_middleware::Result<Response>,
        _extensions: &mut Extensions,
    ) {
        default_on_request_end(span, outcome);
        if let Some(kind) = outcome_error_type(outcome) {
            span.record(semver::ERROR_TYPE, kind);
        }
    }
}
