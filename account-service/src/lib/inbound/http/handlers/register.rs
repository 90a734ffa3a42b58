use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use super::ApiError;
use super::ApiSuccess;
use crate::account::errors::EmailError;
use crate::account::errors::InvitationIdError;
use crate::account::errors::UsernameError;
use crate::account::models::EmailAddress;
use crate::account::models::InvitationId;
use crate::account::models::RegisterCommand;
use crate::account::models::RegisteredAccount;
use crate::account::models::Username;
use crate::account::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<ApiSuccess<RegisterResponseData>, ApiError> {
    state
        .auth_service
        .register(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref registered| ApiSuccess::new(StatusCode::CREATED, registered.into()))
}

/// HTTP request body for registration (raw JSON)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterRequest {
    email: String,
    username: String,
    phone: Option<String>,
    avatar_ref: Option<String>,
    password: String,
    pending_invitation_id: Option<String>,
}

#[derive(Debug, Clone, Error)]
enum ParseRegisterRequestError {
    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("Invalid username: {0}")]
    Username(#[from] UsernameError),

    #[error("Invalid invitation ID: {0}")]
    Invitation(#[from] InvitationIdError),
}

impl RegisterRequest {
    fn try_into_command(self) -> Result<RegisterCommand, ParseRegisterRequestError> {
        let email = EmailAddress::new(self.email)?;
        let username = Username::new(self.username)?;
        let pending_invitation = self
            .pending_invitation_id
            .as_deref()
            .map(InvitationId::from_string)
            .transpose()?;

        Ok(RegisterCommand {
            email,
            username,
            phone: self.phone,
            avatar_ref: self.avatar_ref,
            password: self.password,
            pending_invitation,
        })
    }
}

impl From<ParseRegisterRequestError> for ApiError {
    fn from(err: ParseRegisterRequestError) -> Self {
        ApiError::UnprocessableEntity(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterResponseData {
    pub account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_warning: Option<String>,
}

impl From<&RegisteredAccount> for RegisterResponseData {
    fn from(registered: &RegisteredAccount) -> Self {
        Self {
            account_id: registered.account_id.to_string(),
            link_warning: registered.link_warning.clone(),
        }
    }
}
