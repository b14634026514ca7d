use anyhow::Context;

use crate::adapter_github::entity::AccessToken;
use crate::domain::Error;
use crate::domain::entity::InstallationToken;

impl crate::adapter_github::Client {
    async fn request_access_token(&self) -> anyhow::Result<InstallationToken> {
        let jwt = self.key.encode_jwt(chrono::Utc::now())?;
        let url = format!(
            "{}/app/installations/{}/access_tokens",
            self.base_url, self.installation_id
        );
        let res = self
            .inner
            .post(&url)
            .bearer_auth(jwt)
            .send()
            .await
            .context("unable to request")?;
        let status = res.status();
        if !status.is_success() {
            let body = crate::adapter_github::error_body(res).await;
            anyhow::bail!("token exchange responded with status {status}: {body}");
        }
        let payload: AccessToken = res.json().await.context("unable to read response")?;
        let token = payload
            .token
            .filter(|token| !token.is_empty())
            .context("no token returned")?;
        Ok(InstallationToken::new(token, payload.expires_at))
    }
}

impl crate::domain::prelude::CredentialProvider for crate::adapter_github::Client {
    #[tracing::instrument(
        skip(self),
        fields(app_id = self.key.app_id(), installation_id = self.installation_id),
        err(Display)
    )]
    async fn installation_token(&self) -> Result<InstallationToken, Error> {
        let token = self.request_access_token().await.map_err(Error::Auth)?;
        tracing::debug!(expires_at = ?token.expires_at, "installation token acquired");
        Ok(token)
    }
}
