//! Wire types shared between the API client, the session manager, and the
//! notification stream. Shapes are backend-defined; fields the backend may
//! omit are defaulted so partial payloads still deserialize.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    /// `avatar` is canonical; `profile_image` is a legacy alias some
    /// endpoints still emit.
    #[serde(default, alias = "profile_image")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub two_factor_enabled: bool,
    #[serde(default)]
    pub is_verified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityRule {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Moderator {
    pub user: ModeratorUser,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeratorUser {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Community {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon_image: Option<String>,
    #[serde(default)]
    pub banner_image: Option<String>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_nsfw: bool,
    /// Authoritative from the server; callers may toggle it optimistically
    /// after a join/leave ack.
    #[serde(default)]
    pub is_member: bool,
    #[serde(default)]
    pub member_count: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rules: Vec<CommunityRule>,
    #[serde(default)]
    pub moderators: Vec<Moderator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub media_url: String,
    pub media_type: MediaType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    /// Canonical URL path of the post, when the server provides one.
    #[serde(default)]
    pub path: Option<String>,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub community_id: i64,
    #[serde(default)]
    pub is_nsfw: bool,
    #[serde(default)]
    pub is_spoiler: bool,
    #[serde(default)]
    pub media: Vec<MediaItem>,
}

/// A validated upload: both fields are guaranteed present.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadResult {
    pub url: String,
    pub media_type: MediaType,
}

/// A decoded notification frame. `kind` is the wire `type` field; everything
/// else rides along verbatim so unknown event types reach subscribers intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub payload: serde_json::Map<String, Value>,
}

pub const CONNECTION_STATUS: &str = "connection_status";
pub const STATUS_CONNECTED: &str = "connected";
pub const STATUS_DISCONNECTED: &str = "disconnected";

impl NotificationEvent {
    /// Synthetic event emitted by the stream client itself on open/close.
    pub fn connection_status(status: &str) -> Self {
        let mut payload = serde_json::Map::new();
        payload.insert("status".to_string(), Value::String(status.to_string()));
        Self {
            kind: CONNECTION_STATUS.to_string(),
            payload,
        }
    }

    /// The `status` payload field, for `connection_status` events.
    pub fn status(&self) -> Option<&str> {
        self.payload.get("status")?.as_str()
    }
}
