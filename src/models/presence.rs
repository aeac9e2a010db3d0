use serde::{Deserialize, Serialize};

/// One client's last-seen record, keyed by network address
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceEntry {
    pub ip: String,
    /// Unix milliseconds
    pub last_seen: i64,
    pub user_agent: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OnlineUsersResponse {
    pub count: usize,
    pub users: Vec<PresenceEntry>,
}
