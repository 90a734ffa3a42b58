use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::account::models::AuthenticatedSession;
use crate::account::models::InvitationId;
use crate::account::models::LoginCommand;
use crate::account::ports::AuthServicePort;
use crate::inbound::http::router::AppState;

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<ApiSuccess<LoginResponseData>, ApiError> {
    // An unparseable invitation id is a request-shape problem; credentials
    // failures stay uniform below it.
    let pending_invitation = body
        .pending_invitation_id
        .as_deref()
        .map(InvitationId::from_string)
        .transpose()
        .map_err(|e| ApiError::UnprocessableEntity(e.to_string()))?;

    state
        .auth_service
        .login(LoginCommand {
            email_or_username: body.email_or_username,
            password: body.password,
            pending_invitation,
        })
        .await
        .map_err(ApiError::from)
        .map(|ref session| ApiSuccess::new(StatusCode::OK, session.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    email_or_username: String,
    password: String,
    pending_invitation_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponseData {
    pub token: String,
    pub account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_warning: Option<String>,
}

impl From<&AuthenticatedSession> for LoginResponseData {
    fn from(session: &AuthenticatedSession) -> Self {
        Self {
            token: session.token.clone(),
            account_id: session.account_id.to_string(),
            link_warning: session.link_warning.clone(),
        }
    }
}
