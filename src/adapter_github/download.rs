use std::path::Path;

use anyhow::Context;
use futures::StreamExt;
use reqwest::header::ACCEPT;
use tokio::io::AsyncWriteExt;

use crate::domain::Error;
use crate::domain::entity::{Asset, InstallationToken, Repository};

// progress granularity when the size is unknown
const UNKNOWN_SIZE_STEP: u64 = 8 * 1024 * 1024;

/// Tracks bytes copied and logs every 10% (or every 8MiB without a size).
#[derive(Debug)]
struct Progress {
    total: Option<u64>,
    written: u64,
    last_step: u64,
}

impl Progress {
    fn new(total: Option<u64>) -> Self {
        Self {
            total: total.filter(|value| *value > 0),
            written: 0,
            last_step: 0,
        }
    }

    fn percent(&self) -> Option<u64> {
        self.total
            .map(|total| (self.written.saturating_mul(100) / total).min(100))
    }

    /// Returns the new step when one is crossed.
    fn advance(&mut self, count: u64) -> Option<u64> {
        self.written += count;
        let step = match self.percent() {
            Some(percent) => percent / 10,
            None => self.written / UNKNOWN_SIZE_STEP,
        };
        if step > self.last_step {
            self.last_step = step;
            Some(step)
        } else {
            None
        }
    }
}

impl crate::adapter_github::Client {
    async fn open_asset_stream(
        &self,
        token: &InstallationToken,
        repository: &Repository,
        asset: &Asset,
    ) -> Result<reqwest::Response, Error> {
        let url = self.asset_url(repository, asset.id);
        // redirects to the storage backend are followed by the client
        let res = self
            .inner
            .get(&url)
            .header(ACCEPT, "application/octet-stream")
            .bearer_auth(token.secret())
            .send()
            .await
            .context("unable to request asset")
            .map_err(Error::Io)?;
        let status = res.status();
        if !status.is_success() {
            return Err(Error::DownloadHttp {
                status: status.as_u16(),
                body: crate::adapter_github::error_body(res).await,
            });
        }
        Ok(res)
    }
}

impl crate::domain::prelude::AssetFetcher for crate::adapter_github::Client {
    #[tracing::instrument(
        skip(self, token, repository, asset),
        fields(asset = %asset.name, asset_id = asset.id),
        err(Display)
    )]
    async fn fetch_asset(
        &self,
        token: &InstallationToken,
        repository: &Repository,
        asset: &Asset,
        output: &Path,
    ) -> Result<u64, Error> {
        let res = self.open_asset_stream(token, repository, asset).await?;
        let mut progress = Progress::new(res.content_length());

        // the file is only touched once upstream answered successfully
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(output)
            .await
            .with_context(|| format!("unable to open {output:?}"))
            .map_err(Error::Io)?;

        tracing::info!(total = ?progress.total, "downloading asset");
        let mut byte_stream = res.bytes_stream();
        while let Some(item) = byte_stream.next().await {
            let chunk = item
                .context("unable to read response body")
                .map_err(Error::Io)?;
            file.write_all(&chunk)
                .await
                .with_context(|| format!("unable to write to {output:?}"))
                .map_err(Error::Io)?;
            if progress.advance(chunk.len() as u64).is_some() {
                tracing::info!(
                    written = progress.written,
                    percent = progress.percent(),
                    "download progress"
                );
            }
        }
        file.flush()
            .await
            .with_context(|| format!("unable to flush {output:?}"))
            .map_err(Error::Io)?;
        tracing::info!(written = progress.written, "download complete");

        Ok(progress.written)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, StatusCode, header};
    use axum::response::{IntoResponse, Redirect};
    use axum::routing::get;

    use crate::adapter_github::testing::{client, spawn_server};
    use crate::domain::Error;
    use crate::domain::entity::{Asset, InstallationToken, Repository};
    use crate::domain::prelude::AssetFetcher;

    fn asset() -> Asset {
        Asset {
            id: 2,
            name: "b.zip".into(),
            size: 11,
        }
    }

    #[test]
    fn should_report_progress_steps_with_known_size() {
        let mut progress = super::Progress::new(Some(100));
        assert_eq!(progress.advance(5), None);
        assert_eq!(progress.advance(5), Some(1));
        assert_eq!(progress.percent(), Some(10));
        assert_eq!(progress.advance(85), Some(9));
        assert_eq!(progress.advance(5), Some(10));
        assert_eq!(progress.percent(), Some(100));
    }

    #[test]
    fn should_report_progress_steps_without_size() {
        let mut progress = super::Progress::new(None);
        assert_eq!(progress.percent(), None);
        assert_eq!(progress.advance(super::UNKNOWN_SIZE_STEP - 1), None);
        assert_eq!(progress.advance(1), Some(1));
    }

    #[tokio::test]
    async fn should_stream_asset_to_file_following_redirect() {
        let router = axum::Router::new()
            .route(
                "/repos/octo/tool/releases/assets/2",
                get(|headers: HeaderMap| async move {
                    assert_eq!(headers[header::ACCEPT], "application/octet-stream");
                    assert_eq!(headers[header::AUTHORIZATION], "Bearer ghs_token");
                    Redirect::temporary("/storage/b.zip")
                }),
            )
            .route(
                "/storage/b.zip",
                get(|| async { ([(header::CONTENT_TYPE, "application/zip")], "hello world") }),
            );
        let base_url = spawn_server(router).await;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("b.zip");
        std::fs::write(&output, "previous content that is longer").unwrap();

        let written = client(&base_url)
            .fetch_asset(
                &InstallationToken::new("ghs_token", None),
                &Repository::new("octo", "tool"),
                &asset(),
                &output,
            )
            .await
            .unwrap();
        assert_eq!(written, 11);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "hello world");
    }

    #[tokio::test]
    async fn should_fail_on_not_found_without_creating_file() {
        let router = axum::Router::new().route(
            "/repos/octo/tool/releases/assets/2",
            get(|| async { (StatusCode::NOT_FOUND, "Not Found").into_response() }),
        );
        let base_url = spawn_server(router).await;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("b.zip");

        let err = client(&base_url)
            .fetch_asset(
                &InstallationToken::new("ghs_token", None),
                &Repository::new("octo", "tool"),
                &asset(),
                &output,
            )
            .await
            .unwrap_err();
        assert!(
            matches!(err, Error::DownloadHttp { status: 404, ref body } if body == "Not Found")
        );
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn should_fail_with_io_error_when_directory_is_missing() {
        let router = axum::Router::new().route(
            "/repos/octo/tool/releases/assets/2",
            get(|| async { "hello world" }),
        );
        let base_url = spawn_server(router).await;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("missing").join("b.zip");

        let err = client(&base_url)
            .fetch_asset(
                &InstallationToken::new("ghs_token", None),
                &Repository::new("octo", "tool"),
                &asset(),
                &output,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
