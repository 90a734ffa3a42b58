use async_trait::async_trait;
use serde::Serialize;

use crate::account::errors::LinkError;
use crate::account::models::AccountId;
use crate::account::models::InvitationId;
use crate::account::ports::GroupService;

/// HTTP client for the group-management service.
///
/// The remote endpoint is idempotent: posting the same invitation/account
/// pair twice has no additional effect.
pub struct HttpGroupServiceClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct AddMemberRequest {
    pending_invitation_id: String,
    account_id: String,
}

impl HttpGroupServiceClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl GroupService for HttpGroupServiceClient {
    async fn add_account_to_group(
        &self,
        invitation: InvitationId,
        account: AccountId,
    ) -> Result<(), LinkError> {
        let url = format!("{}/groups/members", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&AddMemberRequest {
                pending_invitation_id: invitation.to_string(),
                account_id: account.to_string(),
            })
            .send()
            .await
            .map_err(|e| LinkError::Unreachable(e.to_string()))?;

        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(LinkError::Rejected(format!("{}: {}", status, body)))
    }
}
