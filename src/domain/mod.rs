pub mod entity;
mod error;
pub mod prelude;
pub mod single_flight;

pub use error::Error;

use entity::{DownloadReport, DownloadTarget, HookContext};

/// Fetch-and-save pipeline: pre hook, token, latest release, asset, post hook.
#[derive(Clone, Debug)]
pub struct DownloadService<CP, RL, AF, HR> {
    pub(crate) credentials: CP,
    pub(crate) releases: RL,
    pub(crate) assets: AF,
    pub(crate) hooks: HR,
    pub(crate) target: DownloadTarget,
}

impl<CP, RL, AF, HR> DownloadService<CP, RL, AF, HR> {
    pub fn new(credentials: CP, releases: RL, assets: AF, hooks: HR, target: DownloadTarget) -> Self {
        Self {
            credentials,
            releases,
            assets,
            hooks,
            target,
        }
    }
}

impl<CP, RL, AF, HR> DownloadService<CP, RL, AF, HR>
where
    CP: prelude::CredentialProvider,
    RL: prelude::ReleaseLocator,
    AF: prelude::AssetFetcher,
    HR: prelude::HookRunner,
{
    async fn fetch_and_save(&self) -> Result<DownloadReport, Error> {
        let token = self.credentials.installation_token().await?;

        let repository = &self.target.repository;
        let release = self
            .releases
            .latest_release(&token, repository)
            .await?
            .filter(|release| !release.assets.is_empty())
            .ok_or_else(|| Error::ReleaseNotFound(repository.to_string()))?;

        let asset =
            release
                .find_asset(&self.target.asset_name)
                .ok_or_else(|| Error::AssetNotFound {
                    name: self.target.asset_name.clone(),
                    release: release.tag_name.clone(),
                })?;
        tracing::info!(
            release = %release.tag_name,
            asset.id = asset.id,
            asset.size = asset.size,
            "asset located"
        );

        let bytes = self
            .assets
            .fetch_asset(&token, repository, asset, &self.target.output_path)
            .await?;

        Ok(DownloadReport {
            release_tag: release.tag_name.clone(),
            asset_name: asset.name.clone(),
            bytes,
        })
    }
}

impl<CP, RL, AF, HR> prelude::ReleaseDownloader for DownloadService<CP, RL, AF, HR>
where
    CP: prelude::CredentialProvider,
    RL: prelude::ReleaseLocator,
    AF: prelude::AssetFetcher,
    HR: prelude::HookRunner,
{
    #[tracing::instrument(
        skip_all,
        fields(
            repository = %self.target.repository,
            asset = %self.target.asset_name,
        ),
        err(Display)
    )]
    async fn download_latest(&self) -> Result<DownloadReport, Error> {
        self.hooks.run_hook(&HookContext::pre(&self.target)).await?;

        let report = self.fetch_and_save().await?;
        tracing::info!(bytes = report.bytes, path = ?self.target.output_path, "asset saved");

        if let Err(err) = self
            .hooks
            .run_hook(&HookContext::post(&self.target, &report))
            .await
        {
            tracing::error!(error = %err, "post download hook failed, ignoring");
        }

        Ok(report)
    }
}
