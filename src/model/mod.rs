//! Mattermost data model: identifiers, channels, teams

mod channel;
mod ids;
mod team;

pub use channel::{Channel, ChannelMember, ChannelType};
pub use ids::{ChannelId, TeamId, UserId};
pub use team::{GROUP_TEAM_ID, Team, TeamSummary, UserRecord};
