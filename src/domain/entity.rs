use std::path::PathBuf;

use chrono::{DateTime, Utc};

/// Repository hosting the releases, as `owner/name`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Repository {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// What gets downloaded and where it lands.
#[derive(Clone, Debug)]
pub struct DownloadTarget {
    pub repository: Repository,
    /// exact, case sensitive name of the asset
    pub asset_name: String,
    pub output_path: PathBuf,
}

/// Short lived bearer credential scoped to one installation.
#[derive(Clone)]
pub struct InstallationToken {
    value: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl InstallationToken {
    pub fn new(value: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    pub fn secret(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Debug for InstallationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallationToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// A binary file attached to a published release.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Asset {
    pub id: u64,
    pub name: String,
    pub size: u64,
}

/// Latest published release of the repository.
#[derive(Clone, Debug)]
pub struct Release {
    pub id: u64,
    pub tag_name: String,
    pub assets: Vec<Asset>,
}

impl Release {
    /// Exact name match, no pattern matching, first hit wins.
    pub fn find_asset(&self, name: &str) -> Option<&Asset> {
        self.assets.iter().find(|asset| asset.name == name)
    }
}

/// Outcome of a successful fetch-and-save.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadReport {
    pub release_tag: String,
    pub asset_name: String,
    pub bytes: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookStage {
    Pre,
    Post,
}

impl HookStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pre => "pre",
            Self::Post => "post",
        }
    }
}

impl std::fmt::Display for HookStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values exposed to a hook process.
#[derive(Clone, Debug)]
pub struct HookContext {
    pub stage: HookStage,
    pub target: DownloadTarget,
    pub report: Option<DownloadReport>,
}

impl HookContext {
    pub fn pre(target: &DownloadTarget) -> Self {
        Self {
            stage: HookStage::Pre,
            target: target.clone(),
            report: None,
        }
    }

    pub fn post(target: &DownloadTarget, report: &DownloadReport) -> Self {
        Self {
            stage: HookStage::Post,
            target: target.clone(),
            report: Some(report.clone()),
        }
    }
}
