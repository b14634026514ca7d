use std::process::Stdio;
use std::sync::Arc;

use anyhow::Context;

use crate::domain::Error;
use crate::domain::entity::{HookContext, HookStage};

/// External commands wrapping a download, run through the system shell.
#[derive(Clone, Debug, Default, clap::Args)]
#[group(id = "hook")]
pub struct Config {
    /// Command run before downloading, a failure aborts the download
    #[arg(long, env = "PRE_HOOK")]
    pre_hook: Option<String>,
    /// Command run after a successful download, failures are only logged
    #[arg(long, env = "POST_HOOK")]
    post_hook: Option<String>,
}

impl Config {
    pub fn build(self) -> HookClient {
        HookClient {
            pre_hook: self.pre_hook.filter(|cmd| !cmd.trim().is_empty()).map(Arc::from),
            post_hook: self.post_hook.filter(|cmd| !cmd.trim().is_empty()).map(Arc::from),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct HookClient {
    pre_hook: Option<Arc<str>>,
    post_hook: Option<Arc<str>>,
}

impl HookClient {
    fn command(&self, stage: HookStage) -> Option<&str> {
        match stage {
            HookStage::Pre => self.pre_hook.as_deref(),
            HookStage::Post => self.post_hook.as_deref(),
        }
    }
}

fn environment(context: &HookContext) -> Vec<(&'static str, String)> {
    let target = &context.target;
    let mut envs = vec![
        ("HOOKFETCH_STAGE", context.stage.as_str().to_string()),
        ("HOOKFETCH_OWNER", target.repository.owner.clone()),
        ("HOOKFETCH_REPO", target.repository.name.clone()),
        ("HOOKFETCH_ASSET_NAME", target.asset_name.clone()),
        (
            "HOOKFETCH_OUTPUT_PATH",
            target.output_path.to_string_lossy().into_owned(),
        ),
    ];
    if let Some(report) = context.report.as_ref() {
        envs.push(("HOOKFETCH_BYTES", report.bytes.to_string()));
        envs.push(("HOOKFETCH_RELEASE_TAG", report.release_tag.clone()));
    }
    envs
}

#[cfg(unix)]
fn shell(command: &str) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell(command: &str) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

async fn execute(command: &str, context: &HookContext) -> anyhow::Result<()> {
    let status = shell(command)
        .envs(environment(context))
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .with_context(|| format!("unable to execute {command:?}"))?;
    if !status.success() {
        anyhow::bail!("{command:?} exited with {status}");
    }
    Ok(())
}

impl crate::domain::prelude::HookRunner for HookClient {
    #[tracing::instrument(skip_all, fields(stage = %context.stage), err(Display))]
    async fn run_hook(&self, context: &HookContext) -> Result<(), Error> {
        let Some(command) = self.command(context.stage) else {
            return Ok(());
        };
        tracing::info!(command, "running hook");
        execute(command, context)
            .await
            .map_err(|reason| Error::Hook {
                stage: context.stage,
                reason,
            })?;
        tracing::info!(command, "hook completed");
        Ok(())
    }
}
