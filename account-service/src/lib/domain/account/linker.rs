use std::sync::Arc;

use crate::account::errors::LinkError;
use crate::account::models::AccountId;
use crate::account::models::InvitationId;
use crate::account::ports::GroupService;

/// Binds a pending group invitation placeholder to a real account id.
///
/// An explicit dependency injected into the orchestrator, never a
/// process-wide singleton, so tests can substitute the collaborator.
pub struct InvitationLinker<G: GroupService> {
    groups: Arc<G>,
}

impl<G: GroupService> InvitationLinker<G> {
    pub fn new(groups: Arc<G>) -> Self {
        Self { groups }
    }

    /// Delegate the link to the group service.
    ///
    /// Idempotent at the collaborator: linking the same pair twice has no
    /// additional effect.
    pub async fn link(
        &self,
        invitation: InvitationId,
        account: AccountId,
    ) -> Result<(), LinkError> {
        self.groups.add_account_to_group(invitation, account).await
    }

    /// Link, degrading failure to a warning on the enclosing auth result.
    ///
    /// A failed link never aborts the register/login that triggered it.
    pub async fn link_or_warn(
        &self,
        invitation: InvitationId,
        account: AccountId,
    ) -> Option<String> {
        match self.link(invitation, account).await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(
                    invitation_id = %invitation,
                    account_id = %account,
                    error = %e,
                    "Invitation linking failed; auth result stands"
                );
                Some(format!("Invitation linking failed: {}", e))
            }
        }
    }
}
