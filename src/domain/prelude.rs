use std::path::Path;

use super::Error;
use super::entity::*;

/// Exchanges the application identity for an installation token.
pub trait CredentialProvider: Send + Sync + 'static {
    fn installation_token(&self)
    -> impl Future<Output = Result<InstallationToken, Error>> + Send;
}

#[cfg(test)]
mockall::mock! {
    pub CredentialProvider {}

    impl Clone for CredentialProvider {
        fn clone(&self) -> Self;
    }

    impl CredentialProvider for CredentialProvider {
        fn installation_token(&self) -> impl Future<Output = Result<InstallationToken, Error>> + Send;
    }
}

/// Finds the latest published release of a repository.
pub trait ReleaseLocator: Send + Sync + 'static {
    /// Returns `None` when the repository has no published release.
    fn latest_release(
        &self,
        token: &InstallationToken,
        repository: &Repository,
    ) -> impl Future<Output = Result<Option<Release>, Error>> + Send;
}

#[cfg(test)]
mockall::mock! {
    pub ReleaseLocator {}

    impl Clone for ReleaseLocator {
        fn clone(&self) -> Self;
    }

    impl ReleaseLocator for ReleaseLocator {
        fn latest_release(
            &self,
            token: &InstallationToken,
            repository: &Repository,
        ) -> impl Future<Output = Result<Option<Release>, Error>> + Send;
    }
}

/// Streams a release asset to a local file.
pub trait AssetFetcher: Send + Sync + 'static {
    /// Returns the number of bytes written to `output`.
    fn fetch_asset(
        &self,
        token: &InstallationToken,
        repository: &Repository,
        asset: &Asset,
        output: &Path,
    ) -> impl Future<Output = Result<u64, Error>> + Send;
}

#[cfg(test)]
mockall::mock! {
    pub AssetFetcher {}

    impl Clone for AssetFetcher {
        fn clone(&self) -> Self;
    }

    impl AssetFetcher for AssetFetcher {
        fn fetch_asset(
            &self,
            token: &InstallationToken,
            repository: &Repository,
            asset: &Asset,
            output: &Path,
        ) -> impl Future<Output = Result<u64, Error>> + Send;
    }
}

/// Runs the optional external commands around a download.
///
/// Implementations return `Ok(())` when no command is configured for the stage.
pub trait HookRunner: Send + Sync + 'static {
    fn run_hook(&self, context: &HookContext) -> impl Future<Output = Result<(), Error>> + Send;
}

#[cfg(test)]
mockall::mock! {
    pub HookRunner {}

    impl Clone for HookRunner {
        fn clone(&self) -> Self;
    }

    impl HookRunner for HookRunner {
        fn run_hook(&self, context: &HookContext) -> impl Future<Output = Result<(), Error>> + Send;
    }
}

/// Entry point used by the webhook handler.
pub trait ReleaseDownloader: Send + Sync + 'static {
    /// Runs hooks, token exchange, release lookup and fetch-and-save once.
    fn download_latest(&self) -> impl Future<Output = Result<DownloadReport, Error>> + Send;
}

#[cfg(test)]
mockall::mock! {
    pub ReleaseDownloader {}

    impl Clone for ReleaseDownloader {
        fn clone(&self) -> Self;
    }

    impl ReleaseDownloader for ReleaseDownloader {
        fn download_latest(&self) -> impl Future<Output = Result<DownloadReport, Error>> + Send;
    }
}
