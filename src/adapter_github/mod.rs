use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};

mod app_key;
mod download;
pub(crate) mod entity;
mod method;
mod middleware;

pub use app_key::AppKey;

const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// GitHub App credentials and API location.
#[derive(Clone, Debug, clap::Args)]
#[group(id = "github")]
pub struct Config {
    /// Root of the GitHub REST API
    #[arg(long = "github-base-url", env = "GITHUB_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,
    /// Identifier of the GitHub App
    #[arg(long, env = "GITHUB_APP_ID")]
    app_id: u64,
    /// Installation of the app on the repository owner
    #[arg(long, env = "GITHUB_INSTALLATION_ID")]
    installation_id: u64,
    /// PEM encoded private key of the app
    #[arg(long, env = "GITHUB_PRIVATE_KEY_PATH")]
    private_key_path: PathBuf,
}

impl Config {
    pub fn build(self) -> anyhow::Result<Client> {
        let key = AppKey::from_path(self.app_id, &self.private_key_path)?;
        Client::new(&self.base_url, key, self.installation_id)
    }
}

#[derive(Clone, Debug)]
pub struct Client {
    base_url: Arc<str>,
    installation_id: u64,
    key: Arc<AppKey>,
    inner: reqwest_middleware::ClientWithMiddleware,
}

impl Client {
    pub fn new(base_url: &str, key: AppKey, installation_id: u64) -> anyhow::Result<Self> {
        reqwest::Url::parse(base_url)
            .with_context(|| format!("invalid github base url {base_url:?}"))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "Accept",
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "User-Agent",
            HeaderValue::from_static(concat!("hookfetch/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        // no overall timeout, assets can be arbitrarily large
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(std::time::Duration::from_secs(20))
            .tcp_keepalive(std::time::Duration::from_secs(30))
            .build()?;
        let inner = reqwest_middleware::ClientBuilder::new(client)
            .with(middleware::TracingMiddleware::new())
            .build();

        Ok(Self {
            base_url: Arc::from(base_url.trim_end_matches('/')),
            installation_id,
            key: Arc::new(key),
            inner,
        })
    }

    pub(crate) fn asset_url(
        &self,
        repository: &crate::domain::entity::Repository,
        asset_id: u64,
    ) -> String {
        format!(
            "{}/repos/{}/{}/releases/assets/{asset_id}",
            self.base_url, repository.owner, repository.name
        )
    }
}

/// Response body of a failed call, kept short enough for logs and responses.
async fn error_body(res: reqwest::Response) -> String {
    const MAX_LEN: usize = 1024;

    let mut body = res.text().await.unwrap_or_default();
    if body.len() > MAX_LEN {
        let mut end = MAX_LEN;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body
}
