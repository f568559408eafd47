use serde::{Deserialize, Serialize};

/// The identity payload of one session row.
///
/// A session carries two independent optional identity slots rather than a
/// single exclusive role, because role-scoped logout must leave the other
/// slot undisturbed (an admin may browse the public site as a logged-in
/// player in the same browser). Each authorization guard reads only the
/// slot relevant to it, and every successful login writes exactly one slot
/// while clearing the other in the same write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_username: Option<String>,
}

impl SessionData {
    /// Authenticate the admin slot, clearing any player identity.
    pub fn login_admin(&mut self, id: &str, username: &str) {
        self.player_id = None;
        self.player_username = None;
        self.admin_id = Some(id.to_owned());
        self.admin_username = Some(username.to_owned());
    }

    /// Authenticate the player slot, clearing any admin identity.
    pub fn login_player(&mut self, id: &str, username: &str) {
        self.admin_id = None;
        self.admin_username = None;
        self.player_id = Some(id.to_owned());
        self.player_username = Some(username.to_owned());
    }

    /// Clear only the admin slot; a player identity survives.
    pub fn logout_admin(&mut self) {
        self.admin_id = None;
        self.admin_username = None;
    }

    /// Clear only the player slot; an admin identity survives.
    pub fn logout_player(&mut self) {
        self.player_id = None;
        self.player_username = None;
    }

    pub fn is_empty(&self) -> bool {
        self.admin_id.is_none() && self.player_id.is_none()
    }
}
