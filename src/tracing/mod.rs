use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

pub enum Config {
    Console(ConsoleConfig),
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::Console(ConsoleConfig::from_env()?))
    }

    pub fn install(self) -> anyhow::Result<TracingProvider> {
        match self {
            Self::Console(inner) => inner.install(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConsoleFormat {
    #[default]
    Full,
    Compact,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown tracing format {0:?}, expected \"full\" or \"compact\"")]
pub struct UnknownFormat(String);

impl std::str::FromStr for ConsoleFormat {
    type Err = UnknownFormat;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "compact" => Ok(Self::Compact),
            _ => Err(UnknownFormat(value.to_owned())),
        }
    }
}

pub struct ConsoleConfig {
    color: bool,
    format: ConsoleFormat,
}

impl ConsoleConfig {
    fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            color: crate::with_env_as_or("TRACING_CONSOLE_COLOR", true)?,
            format: crate::with_env_as_or("TRACING_FORMAT", ConsoleFormat::default())?,
        })
    }

    fn layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let layer = tracing_subscriber::fmt::layer().with_ansi(self.color);
        match self.format {
            ConsoleFormat::Full => layer.boxed(),
            ConsoleFormat::Compact => layer.compact().boxed(),
        }
    }

    fn install(self) -> anyhow::Result<TracingProvider> {
        tracing_subscriber::registry()
            .with(self.layer())
            .with(
                EnvFilter::builder()
                    .with_default_directive(LevelFilter::INFO.into())
                    .with_env_var("TRACING_LEVEL")
                    .from_env_lossy(),
            )
            .try_init()?;
        Ok(TracingProvider::Console)
    }
}

pub enum TracingProvider {
    Console,
}

impl TracingProvider {
    pub async fn shutdown(self) {}
}
