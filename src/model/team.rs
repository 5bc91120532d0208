use crate::model::{Channel, TeamId, UserId};
use serde::{Deserialize, Serialize};

/// Identifier of the virtual team that group messages belong to
pub const GROUP_TEAM_ID: &str = "G";

/// A team and the channels mirrored for it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Team {
    pub id: TeamId,

    /// Team handle, used to pick the primary team from configuration
    pub name: String,

    /// Channels the user is a member of
    pub channels: Vec<Channel>,

    /// Public channels the user has not joined
    pub more_channels: Vec<Channel>,
}

impl Team {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: TeamId::new(id),
            name: name.into(),
            channels: Vec::new(),
            more_channels: Vec::new(),
        }
    }

    /// Joined channels followed by joinable ones
    pub fn all_channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter().chain(self.more_channels.iter())
    }
}

impl From<TeamSummary> for Team {
    fn from(summary: TeamSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            channels: Vec::new(),
            more_channels: Vec::new(),
        }
    }
}

/// Team record from `GET /users/me/teams`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSummary {
    pub id: TeamId,
    pub name: String,
    #[serde(default)]
    pub display_name: String,
}

/// The authenticated user, from `GET /users/me`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
}
