//! Team invitation state machine.
//!
//! ```text
//! pending --accept--> accepted
//! pending --reject--> rejected
//! ```
//!
//! Both targets are terminal. Only the invited user may respond.

use crate::error::CoreError;
use crate::types::DbId;

/// Maximum length of the optional message attached to an invitation.
pub const MAX_INVITATION_MESSAGE_LENGTH: usize = 1_000;

define_text_enum! {
    /// Lifecycle status of a team invitation.
    InvitationStatus ("invitation status") {
        Pending = "pending",
        Accepted = "accepted",
        Rejected = "rejected",
    }
}

impl InvitationStatus {
    pub fn is_terminal(self) -> bool {
        self != InvitationStatus::Pending
    }
}

/// Compute the next status for a response, enforcing who may respond and
/// that the invitation has not already been answered.
pub fn respond(
    invitation_id: DbId,
    current: InvitationStatus,
    invited_user_id: DbId,
    responder_id: DbId,
    accept: bool,
) -> Result<InvitationStatus, CoreError> {
    if responder_id != invited_user_id {
        return Err(CoreError::Forbidden(
            "Only the invited user can respond to this invitation".to_string(),
        ));
    }

    if current.is_terminal() {
        return Err(CoreError::Conflict(format!(
            "Invitation {invitation_id} has already been {current}"
        )));
    }

    Ok(if accept {
        InvitationStatus::Accepted
    } else {
        InvitationStatus::Rejected
    })
}

/// Validate the optional free-text message on an invitation.
pub fn validate_message(message: Option<&str>) -> Result<(), CoreError> {
    if let Some(msg) = message {
        if msg.chars().count() > MAX_INVITATION_MESSAGE_LENGTH {
            return Err(CoreError::Validation(format!(
                "Invitation message must not exceed {MAX_INVITATION_MESSAGE_LENGTH} characters"
            )));
        }
    }
    Ok(())
}
