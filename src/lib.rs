use std::path::PathBuf;

use anyhow::Context;

use crate::domain::entity::{DownloadTarget, Repository};

pub mod adapter_github;
pub mod adapter_hook;
pub mod adapter_http_server;
pub mod domain;
pub mod tracing;

fn with_env_as_or<T>(name: &str, default_value: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    <T as std::str::FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    let Ok(value) = std::env::var(name) else {
        return Ok(default_value);
    };
    value
        .parse::<T>()
        .with_context(|| format!("unable to parse value from {name:?}"))
}

/// Asset to look for and where to store it.
#[derive(Clone, Debug, clap::Args)]
pub struct TargetConfig {
    /// Owner of the watched repository
    #[arg(long = "github-owner", env = "GITHUB_OWNER")]
    owner: String,
    /// Name of the watched repository
    #[arg(long = "github-repo", env = "GITHUB_REPO")]
    repo: String,
    /// Exact, case sensitive name of the release asset
    #[arg(long, env = "ASSET_NAME")]
    asset_name: String,
    /// File written with the asset content, overwritten on every download
    #[arg(long, env = "OUTPUT_PATH")]
    output_path: PathBuf,
}

impl TargetConfig {
    fn build(self) -> anyhow::Result<DownloadTarget> {
        anyhow::ensure!(!self.owner.is_empty(), "repository owner must not be empty");
        anyhow::ensure!(!self.repo.is_empty(), "repository name must not be empty");
        anyhow::ensure!(!self.asset_name.is_empty(), "asset name must not be empty");
        Ok(DownloadTarget {
            repository: Repository::new(self.owner, self.repo),
            asset_name: self.asset_name,
            output_path: self.output_path,
        })
    }
}

/// Downloads the latest release asset of a GitHub repository whenever a webhook is received.
#[derive(Clone, Debug, clap::Parser)]
#[command(version, about)]
pub struct Config {
    #[command(flatten)]
    server: adapter_http_server::Config,
    #[command(flatten)]
    github: adapter_github::Config,
    #[command(flatten)]
    target: TargetConfig,
    #[command(flatten)]
    hook: adapter_hook::Config,
}

impl Config {
    pub fn build(self) -> anyhow::Result<Application> {
        let target = self.target.build()?;
        let github = self.github.build()?;
        let hook = self.hook.build();

        ::tracing::info!(
            repository = %target.repository,
            asset = %target.asset_name,
            output = %target.output_path.display(),
            "watching releases"
        );
        let downloader = domain::DownloadService::new(
            github.clone(),
            github.clone(),
            github,
            hook,
            target,
        );

        let server = self
            .server
            .builder()
            .with_downloader(downloader)
            .build()?;

        Ok(Application { server })
    }
}

pub struct Application {
    server: adapter_http_server::Server,
}

impl Application {
    pub async fn run(self) -> anyhow::Result<()> {
        self.server.run().await
    }

    pub async fn serve(self, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
        self.server.serve(listener).await
    }
}
