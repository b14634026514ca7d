use std::borrow::Cow;

use axum::Json;
use axum::extract::DefaultBodyLimit;
use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;

use crate::adapter_http_server::ServerState;
use crate::domain::Error;

mod webhook;

// largest payload GitHub delivers
const MAX_PAYLOAD_SIZE: usize = 25 * 1024 * 1024;

pub fn build<RD>(webhook_path: &str) -> axum::Router<ServerState<RD>>
where
    RD: crate::domain::prelude::ReleaseDownloader + Clone,
{
    axum::Router::new()
        .route(
            webhook_path,
            post(webhook::handler::<RD>).fallback(not_found),
        )
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_PAYLOAD_SIZE))
}

async fn not_found() -> ApiError {
    ApiError {
        status_code: StatusCode::NOT_FOUND,
        payload: Payload::NotFound,
    }
}

/// JSON body of every response, discriminated by `status`.
#[derive(Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub(crate) enum Payload {
    Success {
        asset: String,
        release: String,
        bytes: u64,
    },
    Busy,
    Unauthorized {
        reason: Cow<'static, str>,
    },
    Error {
        message: String,
    },
    NotFound,
}

#[derive(Debug)]
pub(crate) struct ApiError {
    status_code: StatusCode,
    payload: Payload,
}

impl ApiError {
    #[inline]
    fn error(status_code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code,
            payload: Payload::Error {
                message: message.into(),
            },
        }
    }
}

impl From<Error> for ApiError {
    fn from(value: Error) -> Self {
        match value {
            Error::Signature(reason) => Self {
                status_code: StatusCode::UNAUTHORIZED,
                payload: Payload::Unauthorized {
                    reason: Cow::Borrowed(reason),
                },
            },
            Error::Busy => Self {
                status_code: StatusCode::TOO_MANY_REQUESTS,
                payload: Payload::Busy,
            },
            err @ (Error::ReleaseNotFound(_) | Error::AssetNotFound { .. }) => {
                Self::error(StatusCode::NOT_FOUND, err.to_string())
            }
            err @ (Error::Auth(_) | Error::DownloadHttp { .. }) => {
                Self::error(StatusCode::BAD_GATEWAY, err.to_string())
            }
            err @ (Error::Io(_) | Error::Hook { .. }) => {
                Self::error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        }
    }
}

impl From<BytesRejection> for ApiError {
    fn from(value: BytesRejection) -> Self {
        Self::error(value.status(), value.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code, Json(self.payload)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::{ApiError, Payload};
    use crate::domain::Error;
    use crate::domain::entity::HookStage;
    use crate::domain::prelude::MockReleaseDownloader;

    /// Catches invalid route patterns at test time rather than at runtime.
    #[test]
    fn should_build_router_without_panicking() {
        let _router = super::build::<MockReleaseDownloader>("/webhook");
    }

    #[test]
    fn should_serialize_payload_with_status_tag() {
        let value = serde_json::to_value(Payload::Success {
            asset: "b.zip".into(),
            release: "v1".into(),
            bytes: 12,
        })
        .unwrap();
        assert_eq!(
            value,
            serde_json::json!({"status": "success", "asset": "b.zip", "release": "v1", "bytes": 12})
        );
        assert_eq!(
            serde_json::to_value(Payload::NotFound).unwrap(),
            serde_json::json!({"status": "not_found"})
        );
        assert_eq!(
            serde_json::to_value(Payload::Busy).unwrap(),
            serde_json::json!({"status": "busy"})
        );
    }

    #[test]
    fn should_map_errors_to_status_codes() {
        let cases = [
            (Error::Signature("signature mismatch"), StatusCode::UNAUTHORIZED),
            (Error::Busy, StatusCode::TOO_MANY_REQUESTS),
            (Error::ReleaseNotFound("o/r".into()), StatusCode::NOT_FOUND),
            (
                Error::AssetNotFound {
                    name: "b.zip".into(),
                    release: "v1".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (Error::Auth(anyhow::anyhow!("denied")), StatusCode::BAD_GATEWAY),
            (
                Error::DownloadHttp {
                    status: 404,
                    body: "Not Found".into(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (Error::Io(anyhow::anyhow!("disk full")), StatusCode::INTERNAL_SERVER_ERROR),
            (
                Error::Hook {
                    stage: HookStage::Pre,
                    reason: anyhow::anyhow!("exit status: 1"),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status_code, expected);
        }
    }

    #[test]
    fn should_carry_error_message() {
        let err = ApiError::from(Error::DownloadHttp {
            status: 404,
            body: "Not Found".into(),
        });
        assert_eq!(
            err.payload,
            Payload::Error {
                message: "upstream responded with status 404: Not Found".into()
            }
        );
    }
}
