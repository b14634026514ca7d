use anyhow::Context;
use reqwest::StatusCode;

use crate::adapter_github::entity::Release;
use crate::domain::Error;
use crate::domain::entity::{InstallationToken, Repository};

impl crate::adapter_github::Client {
    pub(crate) async fn get_latest_release(
        &self,
        token: &InstallationToken,
        repo: &Repository,
    ) -> Result<Option<Release>, Error> {
        let url = format!(
            "{}/repos/{}/{}/releases/latest",
            self.base_url, repo.owner, repo.name
        );
        let res = self
            .inner
            .get(&url)
            .bearer_auth(token.secret())
            .send()
            .await
            .context("unable to request")
            .map_err(Error::Io)?;
        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Error::DownloadHttp {
                status: status.as_u16(),
                body: crate::adapter_github::error_body(res).await,
            });
        }
        res.json()
            .await
            .context("unable to read response")
            .map(Some)
            .map_err(Error::Io)
    }
}

impl crate::domain::prelude::ReleaseLocator for crate::adapter_github::Client {
    #[tracing::instrument(skip(self, token), fields(repository = %repository), err(Display))]
    async fn latest_release(
        &self,
        token: &InstallationToken,
        repository: &Repository,
    ) -> Result<Option<crate::domain::entity::Release>, Error> {
        let release = self.get_latest_release(token, repository).await?;
        if let Some(ref release) = release {
            tracing::info!(
                release_id = release.id,
                tag = %release.tag_name,
                assets = release.assets.len(),
                "latest release found"
            );
        }
        Ok(release.map(Into::into))
    }
}
