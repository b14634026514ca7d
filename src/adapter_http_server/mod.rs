use anyhow::Context;

use crate::domain::single_flight::SingleFlight;

mod handler;
mod middleware;
pub mod signature;

pub use signature::SignatureVerifier;

const DEFAULT_ADDRESS: std::net::IpAddr = std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED);
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_WEBHOOK_PATH: &str = "/webhook";

/// Inbound webhook listener.
#[derive(Clone, Debug, clap::Args)]
#[group(id = "server")]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "ADDRESS", default_value_t = DEFAULT_ADDRESS)]
    address: std::net::IpAddr,
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Path receiving the webhook deliveries
    #[arg(long, env = "WEBHOOK_PATH", default_value = DEFAULT_WEBHOOK_PATH)]
    webhook_path: String,
    /// Shared secret of the webhook, signature verification is disabled without it
    #[arg(long, env = "WEBHOOK_SECRET", hide_env_values = true)]
    webhook_secret: Option<String>,
}

impl Config {
    pub fn builder<RD>(self) -> ServerBuilder<RD> {
        ServerBuilder {
            config: self,
            downloader: None,
        }
    }
}

pub struct ServerBuilder<RD> {
    config: Config,
    downloader: Option<RD>,
}

impl<RD> ServerBuilder<RD>
where
    RD: crate::domain::prelude::ReleaseDownloader + Clone,
{
    pub fn with_downloader(self, downloader: RD) -> Self {
        Self {
            config: self.config,
            downloader: Some(downloader),
        }
    }

    pub fn build(self) -> anyhow::Result<Server> {
        let Config {
            address,
            port,
            webhook_path,
            webhook_secret,
        } = self.config;
        validate_webhook_path(&webhook_path)?;

        let verifier = SignatureVerifier::new(webhook_secret.as_deref());
        if !verifier.is_enabled() {
            tracing::warn!("no webhook secret configured, signature verification is disabled");
        }

        let state = ServerState {
            downloader: self
                .downloader
                .ok_or_else(|| anyhow::anyhow!("downloader not specified"))?,
            verifier,
            flight: SingleFlight::default(),
        };
        let router = handler::build(&webhook_path)
            .layer(middleware::tracing::layer())
            .with_state(state);

        Ok(Server {
            address: std::net::SocketAddr::from((address, port)),
            webhook_path,
            router,
        })
    }
}

/// The path is routed literally, anything axum would read as a parameter is refused.
fn validate_webhook_path(path: &str) -> anyhow::Result<()> {
    if !path.starts_with('/') {
        anyhow::bail!("webhook path {path:?} must start with '/'");
    }
    if path.contains(['{', '}']) {
        anyhow::bail!("webhook path {path:?} must not contain '{{' or '}}'");
    }
    if path
        .split('/')
        .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
    {
        anyhow::bail!("webhook path {path:?} has a segment starting with ':' or '*'");
    }
    Ok(())
}

#[derive(Clone, Debug)]
pub(crate) struct ServerState<RD> {
    pub(crate) downloader: RD,
    pub(crate) verifier: SignatureVerifier,
    pub(crate) flight: SingleFlight,
}

#[derive(Debug)]
pub struct Server {
    address: std::net::SocketAddr,
    webhook_path: String,
    router: axum::Router,
}

impl Server {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.address)
            .await
            .with_context(|| format!("unable to bind {}", self.address))?;
        self.serve(listener).await
    }

    /// Serves on an already bound listener until ctrl-c.
    pub async fn serve(self, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
        tracing::info!(
            address = ?listener.local_addr().ok(),
            path = %self.webhook_path,
            "starting server"
        );
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("shutting down");
            })
            .await
            .context("server crashed")
    }
}
