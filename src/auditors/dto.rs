use serde::{Deserialize, Serialize};

use crate::auth::PublicProfile;

/// Admin-side auditor creation; password is chosen by the admin and handed
/// to the auditor through the WhatsApp invite.
#[derive(Debug, Deserialize)]
pub struct CreateAuditorRequest {
    pub name: String,
    pub email: String,
    pub whatsapp: Option<String>,
    pub password: String,
}

/// Invite the client opens as a wa.me conversation. The phone is normalized
/// to digits; the message is plain text, encoding is left to the caller.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct WhatsAppInvite {
    pub phone: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CreateAuditorResponse {
    pub auditor: PublicProfile,
    pub invite: Option<WhatsAppInvite>,
}
