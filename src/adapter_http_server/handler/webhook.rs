use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::{HeaderMap, StatusCode};

use crate::adapter_http_server::ServerState;
use crate::adapter_http_server::handler::{ApiError, Payload};
use crate::domain::Error;

const EVENT_HEADER: &str = "x-github-event";

/// Verifies the payload then runs one download, rejecting overlapping calls.
///
/// The payload itself is not interpreted, any authenticated delivery triggers
/// a download.
pub async fn handler<RD>(
    State(state): State<ServerState<RD>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Payload>, ApiError>
where
    RD: crate::domain::prelude::ReleaseDownloader + Clone,
{
    let body = body.inspect_err(|err| tracing::warn!(error = %err, "unable to read webhook body"))?;
    let event = headers
        .get(EVENT_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");
    tracing::info!(event, size = body.len(), "webhook received");

    state
        .verifier
        .verify(&headers, &body)
        .inspect_err(|err| tracing::warn!(error = %err, "rejecting webhook"))?;

    let Some(permit) = state.flight.try_acquire() else {
        tracing::warn!("download already in progress, rejecting webhook");
        return Err(Error::Busy.into());
    };

    // detached so a dropped connection doesn't cancel a running download
    let downloader = state.downloader.clone();
    let job = tokio::spawn(async move {
        let _permit = permit;
        downloader.download_latest().await
    });

    let report = match job.await {
        Ok(result) => {
            result.inspect_err(|err| tracing::error!(error = %err, "download failed"))?
        }
        Err(err) => {
            tracing::error!(error = %err, "download task crashed");
            return Err(ApiError::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "download task crashed",
            ));
        }
    };

    Ok(Json(Payload::Success {
        asset: report.asset_name,
        release: report.release_tag,
        bytes: report.bytes,
    }))
}
