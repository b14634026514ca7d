use super::entity::HookStage;

/// Every way a webhook request can fail once configuration is loaded.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unable to obtain installation token: {0:#}")]
    Auth(anyhow::Error),
    #[error("invalid webhook signature: {0}")]
    Signature(&'static str),
    #[error("a download is already in progress")]
    Busy,
    #[error("no release with assets found for {0}")]
    ReleaseNotFound(String),
    #[error("asset {name:?} not found in release {release}")]
    AssetNotFound { name: String, release: String },
    #[error("upstream responded with status {status}: {body}")]
    DownloadHttp { status: u16, body: String },
    #[error("i/o failure: {0:#}")]
    Io(anyhow::Error),
    #[error("{stage} hook failed: {reason:#}")]
    Hook {
        stage: HookStage,
        reason: anyhow::Error,
    },
}

impl Error {
    pub fn io(err: impl Into<anyhow::Error>) -> Self {
        Self::Io(err.into())
    }
}
