use chrono::{DateTime, Utc};

#[derive(Debug, serde::Deserialize)]
pub struct Asset {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub size: u64,
}

impl From<Asset> for crate::domain::entity::Asset {
    fn from(value: Asset) -> Self {
        Self {
            id: value.id,
            name: value.name,
            size: value.size,
        }
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct Release {
    pub id: u64,
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

impl From<Release> for crate::domain::entity::Release {
    fn from(value: Release) -> Self {
        Self {
            id: value.id,
            tag_name: value.tag_name,
            assets: value.assets.into_iter().map(Into::into).collect(),
        }
    }
}

/// Response of the installation access token exchange.
#[derive(Debug, serde::Deserialize)]
pub struct AccessToken {
    pub token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Claims of the application JWT.
#[derive(Debug, serde::Serialize)]
pub struct AppClaims {
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}
