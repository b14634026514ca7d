use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let tracing_config = hookfetch::tracing::Config::from_env()?;
    let tracer = tracing_config.install()?;

    let config = hookfetch::Config::parse();
    let res = match config.build() {
        Ok(app) => app.run().await,
        Err(err) => Err(err),
    };
    if let Err(err) = res.as_ref() {
        tracing::error!(error = ?err, "application failed");
    }

    tracer.shutdown().await;

    res
}
