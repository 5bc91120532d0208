//! In-memory mirror of team channel membership

use crate::model::{Channel, ChannelId, GROUP_TEAM_ID, Team, TeamId};
use crate::store::normalized_name;
use std::collections::HashSet;
use tokio::sync::RwLock;

/// Collection sizes, for logging
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StoreSizes {
    pub teams: usize,
    pub joined: usize,
    pub joinable: usize,
}

/// Channel lists of every team the user belongs to.
///
/// The primary team is always the first entry of `teams`. Readers share the
/// lock; replacements take it exclusively and only for the assignment itself,
/// so callers must finish their network I/O before calling `replace_*`.
pub struct ChannelStore {
    primary_team_id: TeamId,
    teams: RwLock<Vec<Team>>,
}

impl ChannelStore {
    /// Create a store from the primary team and the user's other teams.
    /// A copy of the primary team inside `others` is ignored.
    pub fn new(primary: Team, others: impl IntoIterator<Item = Team>) -> Self {
        let primary_team_id = primary.id.clone();
        let mut seen = HashSet::from([primary_team_id.clone()]);
        let mut teams = vec![primary];
        teams.extend(others.into_iter().filter(|t| seen.insert(t.id.clone())));

        tracing::info!(
            primary_team = %primary_team_id,
            team_count = teams.len(),
            "Created channel store"
        );

        Self {
            primary_team_id,
            teams: RwLock::new(teams),
        }
    }

    pub fn primary_team_id(&self) -> &TeamId {
        &self.primary_team_id
    }

    /// Team ids in store order, primary first
    pub async fn team_ids(&self) -> Vec<TeamId> {
        self.teams.read().await.iter().map(|t| t.id.clone()).collect()
    }

    /// Joined channels: the primary team's first, then each other team's.
    /// Not de-duplicated.
    pub async fn all_joined_channels(&self) -> Vec<Channel> {
        let teams = self.teams.read().await;
        let (primary, others): (Vec<&Team>, Vec<&Team>) = teams
            .iter()
            .partition(|t| t.id == self.primary_team_id);

        primary
            .into_iter()
            .chain(others)
            .flat_map(|t| t.channels.iter().cloned())
            .collect()
    }

    /// Joinable channels of every team, in store order
    pub async fn all_joinable_channels(&self) -> Vec<Channel> {
        self.teams
            .read()
            .await
            .iter()
            .flat_map(|t| t.more_channels.iter().cloned())
            .collect()
    }

    pub async fn find_by_id(&self, channel_id: &ChannelId) -> Option<Channel> {
        self.teams
            .read()
            .await
            .iter()
            .flat_map(|t| t.all_channels())
            .find(|c| &c.id == channel_id)
            .cloned()
    }

    /// Id of the channel whose normalized name is `name`, looking only at the
    /// given team when one is passed
    pub async fn find_id_by_name(&self, name: &str, team_id: Option<&TeamId>) -> Option<ChannelId> {
        self.teams
            .read()
            .await
            .iter()
            .filter(|t| team_id.is_none_or(|id| &t.id == id))
            .flat_map(|t| t.all_channels())
            .find(|c| normalized_name(c) == name)
            .map(|c| c.id.clone())
    }

    pub async fn name_for_channel(&self, channel_id: &ChannelId) -> Option<String> {
        self.find_by_id(channel_id)
            .await
            .map(|c| normalized_name(&c).into_owned())
    }

    pub async fn header_for_channel(&self, channel_id: &ChannelId) -> Option<String> {
        self.find_by_id(channel_id).await.map(|c| c.header)
    }

    /// `team_id` recorded on the channel itself (empty for direct messages)
    pub async fn channel_team_id(&self, channel_id: &ChannelId) -> Option<TeamId> {
        self.find_by_id(channel_id).await.map(|c| c.team_id)
    }

    /// Store team holding the channel, or the virtual [`GROUP_TEAM_ID`] for
    /// group messages
    pub async fn team_for_channel(&self, channel_id: &ChannelId) -> Option<TeamId> {
        let teams = self.teams.read().await;
        teams.iter().find_map(|t| {
            t.all_channels().find(|c| &c.id == channel_id).map(|c| {
                if c.is_group() {
                    TeamId::new(GROUP_TEAM_ID)
                } else {
                    t.id.clone()
                }
            })
        })
    }

    /// Whether the channel is in the primary team's joined list
    pub async fn is_joined_in_primary(&self, channel_id: &ChannelId) -> bool {
        self.teams
            .read()
            .await
            .iter()
            .filter(|t| t.id == self.primary_team_id)
            .flat_map(|t| t.channels.iter())
            .any(|c| &c.id == channel_id)
    }

    /// Replace a team's joined channels. Returns false if the team is unknown.
    pub async fn replace_team_channels(&self, team_id: &TeamId, channels: Vec<Channel>) -> bool {
        let channels = dedup_by_id(team_id, channels);
        let mut teams = self.teams.write().await;
        match teams.iter_mut().find(|t| &t.id == team_id) {
            Some(team) => {
                team.channels = channels;
                true
            }
            None => false,
        }
    }

    /// Replace a team's joinable channels. Returns false if the team is unknown.
    pub async fn replace_team_more_channels(
        &self,
        team_id: &TeamId,
        channels: Vec<Channel>,
    ) -> bool {
        let mut teams = self.teams.write().await;
        match teams.iter_mut().find(|t| &t.id == team_id) {
            Some(team) => {
                team.more_channels = channels;
                true
            }
            None => false,
        }
    }

    pub async fn sizes(&self) -> StoreSizes {
        let teams = self.teams.read().await;
        StoreSizes {
            teams: teams.len(),
            joined: teams.iter().map(|t| t.channels.len()).sum(),
            joinable: teams.iter().map(|t| t.more_channels.len()).sum(),
        }
    }
}

/// Keep the first occurrence of each channel id
fn dedup_by_id(team_id: &TeamId, channels: Vec<Channel>) -> Vec<Channel> {
    let total = channels.len();
    let mut seen = HashSet::new();
    let unique: Vec<Channel> = channels
        .into_iter()
        .filter(|c| seen.insert(c.id.clone()))
        .collect();

    if unique.len() != total {
        tracing::debug!(
            team_id = %team_id,
            dropped = total - unique.len(),
            "Dropped duplicate joined channels"
        );
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChannelType;

    fn open(id: &str, team: &str, name: &str) -> Channel {
        Channel::new(id, team, ChannelType::Open, name)
    }

    fn ids(channels: &[Channel]) -> Vec<&str> {
        channels.iter().map(|c| c.id.as_str()).collect()
    }

    fn store() -> ChannelStore {
        ChannelStore::new(
            Team::new("primary", "main"),
            vec![Team::new("a", "alpha"), Team::new("b", "beta")],
        )
    }

    #[tokio::test]
    async fn test_primary_team_is_present_once() {
        let store = ChannelStore::new(
            Team::new("primary", "main"),
            vec![Team::new("a", "alpha"), Team::new("primary", "main")],
        );

        assert_eq!(
            store.team_ids().await,
            vec![TeamId::new("primary"), TeamId::new("a")]
        );
        assert_eq!(store.primary_team_id().as_str(), "primary");
    }

    #[tokio::test]
    async fn test_all_joined_channels_primary_first() {
        let store = ChannelStore::new(
            Team::new("primary", "main"),
            vec![Team::new("a", "alpha")],
        );
        let a = TeamId::new("a");
        let primary = TeamId::new("primary");

        store
            .replace_team_channels(&a, vec![open("a1", "a", "x"), open("shared", "a", "s")])
            .await;
        store
            .replace_team_channels(
                &primary,
                vec![open("p1", "primary", "y"), open("shared", "primary", "s")],
            )
            .await;

        let joined = store.all_joined_channels().await;
        assert_eq!(ids(&joined), vec!["p1", "shared", "a1", "shared"]);
    }

    #[tokio::test]
    async fn test_all_joinable_channels_concatenates_teams() {
        let store = store();
        store
            .replace_team_more_channels(&TeamId::new("b"), vec![open("b9", "b", "z")])
            .await;
        store
            .replace_team_more_channels(&TeamId::new("primary"), vec![open("p9", "primary", "w")])
            .await;

        let joinable = store.all_joinable_channels().await;
        assert_eq!(ids(&joinable), vec!["p9", "b9"]);
    }

    #[tokio::test]
    async fn test_find_by_id_after_replace() {
        let store = store();
        let team = TeamId::new("a");
        let c1 = open("c1", "a", "one");
        let c2 = open("c2", "a", "two");

        assert!(store.replace_team_channels(&team, vec![c1.clone(), c2.clone()]).await);

        assert_eq!(store.find_by_id(&ChannelId::new("c1")).await, Some(c1));
        assert_eq!(store.find_by_id(&ChannelId::new("c2")).await, Some(c2));
        assert_eq!(store.find_by_id(&ChannelId::new("c3")).await, None);
    }

    #[tokio::test]
    async fn test_replace_is_wholesale() {
        let store = store();
        let team = TeamId::new("a");

        store.replace_team_channels(&team, vec![open("old", "a", "old")]).await;
        store.replace_team_channels(&team, vec![open("new", "a", "new")]).await;

        assert_eq!(store.find_by_id(&ChannelId::new("old")).await, None);
        assert!(store.find_by_id(&ChannelId::new("new")).await.is_some());
    }

    #[tokio::test]
    async fn test_replace_unknown_team() {
        let store = store();
        let unknown = TeamId::new("nope");

        assert!(!store.replace_team_channels(&unknown, vec![open("c1", "nope", "x")]).await);
        assert!(!store.replace_team_more_channels(&unknown, vec![]).await);
        assert_eq!(store.find_by_id(&ChannelId::new("c1")).await, None);
    }

    #[tokio::test]
    async fn test_replace_drops_duplicate_joined_ids() {
        let store = store();
        let team = TeamId::new("a");

        store
            .replace_team_channels(&team, vec![open("c1", "a", "first"), open("c1", "a", "second")])
            .await;

        let joined = store.all_joined_channels().await;
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].name, "first");
    }

    #[tokio::test]
    async fn test_find_id_by_name_scoped_to_team() {
        let store = store();
        store
            .replace_team_channels(&TeamId::new("a"), vec![open("a-general", "a", "general")])
            .await;
        store
            .replace_team_more_channels(&TeamId::new("b"), vec![open("b-general", "b", "general")])
            .await;

        let b = TeamId::new("b");
        assert_eq!(
            store.find_id_by_name("general", Some(&b)).await,
            Some(ChannelId::new("b-general"))
        );
        assert_eq!(
            store.find_id_by_name("general", None).await,
            Some(ChannelId::new("a-general"))
        );
        assert_eq!(store.find_id_by_name("random", None).await, None);
    }

    #[tokio::test]
    async fn test_find_id_by_name_uses_normalized_group_name() {
        let store = store();
        let group = Channel::new("g1", "", ChannelType::Group, "8d7c6b5a")
            .with_display_name("alice, bob smith");
        store.replace_team_channels(&TeamId::new("a"), vec![group]).await;

        assert_eq!(
            store.find_id_by_name("alice-bob_smith", None).await,
            Some(ChannelId::new("g1"))
        );
        assert_eq!(store.find_id_by_name("8d7c6b5a", None).await, None);
        assert_eq!(
            store.name_for_channel(&ChannelId::new("g1")).await.as_deref(),
            Some("alice-bob_smith")
        );
    }

    #[tokio::test]
    async fn test_team_for_channel() {
        let store = store();
        let group = Channel::new("g1", "", ChannelType::Group, "x").with_display_name("a, b");
        store
            .replace_team_channels(&TeamId::new("a"), vec![open("c1", "a", "one"), group])
            .await;
        store
            .replace_team_more_channels(&TeamId::new("b"), vec![open("c2", "b", "two")])
            .await;

        assert_eq!(
            store.team_for_channel(&ChannelId::new("c1")).await,
            Some(TeamId::new("a"))
        );
        assert_eq!(
            store.team_for_channel(&ChannelId::new("c2")).await,
            Some(TeamId::new("b"))
        );
        assert_eq!(
            store.team_for_channel(&ChannelId::new("g1")).await,
            Some(TeamId::new(GROUP_TEAM_ID))
        );
        assert_eq!(store.team_for_channel(&ChannelId::new("zz")).await, None);
    }

    #[tokio::test]
    async fn test_channel_team_id_reads_record() {
        let store = store();
        let dm = Channel::new("d1", "", ChannelType::Direct, "u1__u2");
        store
            .replace_team_channels(&TeamId::new("primary"), vec![open("c1", "a", "one"), dm])
            .await;

        assert_eq!(
            store.channel_team_id(&ChannelId::new("c1")).await,
            Some(TeamId::new("a"))
        );
        assert_eq!(
            store.channel_team_id(&ChannelId::new("d1")).await,
            Some(TeamId::default())
        );
    }

    #[tokio::test]
    async fn test_header_for_channel() {
        let store = store();
        store
            .replace_team_more_channels(
                &TeamId::new("a"),
                vec![open("c1", "a", "one").with_header("Release notes")],
            )
            .await;

        assert_eq!(
            store.header_for_channel(&ChannelId::new("c1")).await.as_deref(),
            Some("Release notes")
        );
        assert_eq!(store.header_for_channel(&ChannelId::new("c2")).await, None);
    }

    #[tokio::test]
    async fn test_is_joined_in_primary_ignores_other_teams() {
        let store = store();
        store
            .replace_team_channels(&TeamId::new("primary"), vec![open("p1", "primary", "x")])
            .await;
        store
            .replace_team_channels(&TeamId::new("a"), vec![open("a1", "a", "y")])
            .await;
        store
            .replace_team_more_channels(&TeamId::new("primary"), vec![open("p2", "primary", "z")])
            .await;

        assert!(store.is_joined_in_primary(&ChannelId::new("p1")).await);
        assert!(!store.is_joined_in_primary(&ChannelId::new("a1")).await);
        assert!(!store.is_joined_in_primary(&ChannelId::new("p2")).await);
    }

    #[tokio::test]
    async fn test_sizes() {
        let store = store();
        store
            .replace_team_channels(
                &TeamId::new("a"),
                vec![open("a1", "a", "x"), open("a2", "a", "y")],
            )
            .await;
        store
            .replace_team_more_channels(&TeamId::new("b"), vec![open("b1", "b", "z")])
            .await;

        assert_eq!(
            store.sizes().await,
            StoreSizes {
                teams: 3,
                joined: 2,
                joinable: 1,
            }
        );
    }
}
