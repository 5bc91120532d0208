//! Channel records as returned by the Mattermost v4 API

use crate::model::{ChannelId, TeamId, UserId};
use serde::{Deserialize, Serialize};

/// Channel type tag (`type` field on the wire)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChannelType {
    /// `O`
    Open,
    /// `P`
    Private,
    /// `D`
    Direct,
    /// `G`
    Group,
    /// Any tag this client does not know about, kept verbatim
    Other(String),
}

impl ChannelType {
    pub fn as_tag(&self) -> &str {
        match self {
            ChannelType::Open => "O",
            ChannelType::Private => "P",
            ChannelType::Direct => "D",
            ChannelType::Group => "G",
            ChannelType::Other(tag) => tag,
        }
    }
}

impl From<String> for ChannelType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "O" => ChannelType::Open,
            "P" => ChannelType::Private,
            "D" => ChannelType::Direct,
            "G" => ChannelType::Group,
            _ => ChannelType::Other(tag),
        }
    }
}

impl From<ChannelType> for String {
    fn from(channel_type: ChannelType) -> Self {
        channel_type.as_tag().to_string()
    }
}

/// Snapshot of a channel. Replaced wholesale on every refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,

    /// Owning team; empty for direct and group messages
    #[serde(default)]
    pub team_id: TeamId,

    #[serde(rename = "type")]
    pub channel_type: ChannelType,

    /// URL-safe handle (e.g. "town-square")
    pub name: String,

    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub header: String,

    #[serde(default)]
    pub purpose: String,

    #[serde(default)]
    pub create_at: i64,

    #[serde(default)]
    pub update_at: i64,

    #[serde(default)]
    pub delete_at: i64,

    #[serde(default)]
    pub last_post_at: i64,

    #[serde(default)]
    pub total_msg_count: i64,
}

impl Channel {
    pub fn new(
        id: impl Into<String>,
        team_id: impl Into<String>,
        channel_type: ChannelType,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: ChannelId::new(id),
            team_id: TeamId::new(team_id),
            channel_type,
            name: name.into(),
            display_name: String::new(),
            header: String::new(),
            purpose: String::new(),
            create_at: 0,
            update_at: 0,
            delete_at: 0,
            last_post_at: 0,
            total_msg_count: 0,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    pub fn is_group(&self) -> bool {
        self.channel_type == ChannelType::Group
    }
}

/// A user's membership record in one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMember {
    pub channel_id: ChannelId,
    pub user_id: UserId,

    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub last_viewed_at: i64,

    #[serde(default)]
    pub msg_count: i64,

    #[serde(default)]
    pub mention_count: i64,
}
