use serde::{Deserialize, Serialize};

/// The canonical user entity. Destroyed only by merge (§3 Lifecycles);
/// a merged-away identity's row is kept for audit, pointed at by `IdLinkMap`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: i64,
    pub display_name: String,
    pub created_at: String,
    pub updated_at: String,
}

/// An account on an external platform, bound to exactly one Identity at
/// any time. Keyed by `(platform, external_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformProfile {
    pub platform: String,
    pub external_id: String,
    pub user_id: i64,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkTokenStatus {
    Active,
    Consumed,
    Replaced,
    Expired,
}

impl std::fmt::Display for LinkTokenStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkTokenStatus::Active => write!(f, "active"),
            LinkTokenStatus::Consumed => write!(f, "consumed"),
            LinkTokenStatus::Replaced => write!(f, "replaced"),
            LinkTokenStatus::Expired => write!(f, "expired"),
        }
    }
}

impl std::str::FromStr for LinkTokenStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "active" => Ok(LinkTokenStatus::Active),
            "consumed" => Ok(LinkTokenStatus::Consumed),
            "replaced" => Ok(LinkTokenStatus::Replaced),
            "expired" => Ok(LinkTokenStatus::Expired),
            other => Err(format!("unknown link token status: {other}")),
        }
    }
}

/// A short-lived one-time code binding a Discord identity to a future
/// YouTube identity exchange. 8 upper-alphanumeric characters, TTL 10
/// minutes (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkToken {
    pub code: String,
    pub discord_external_id: String,
    pub owner_user_id: i64,
    pub status: LinkTokenStatus,
    pub created_at: String,
    pub expires_at: String,
    pub consumed_at: Option<String>,
    pub consumed_by: Option<String>,
}

/// Outcome of `consume_link_code`. `merged_from` is set only when the
/// YouTube profile previously belonged to a distinct Identity that has
/// now been merged away.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeResult {
    pub primary_user_id: i64,
    pub merged_from: Option<i64>,
}

/// Outcome of `unlink`. `new_owner_user_id` is either a freshly created
/// identity or a reused inactive one, per §4.2.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlinkResult {
    pub kept_user_id: i64,
    pub new_owner_user_id: i64,
}
