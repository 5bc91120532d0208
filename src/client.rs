//! Bridge-facing channel operations over the store and the remote API

use crate::api::MattermostApi;
use crate::config::Settings;
use crate::error::{ChannelSyncError, Result};
use crate::logging::log_error;
use crate::model::{Channel, ChannelId, Team, TeamId, UserId};
use crate::store::{ChannelStore, StoreSizes};
use crate::sync::{Cancellation, RateLimitRetrier, RetryStats, SyncOrchestrator};
use std::sync::Arc;

/// Last-viewed time of a channel, in milliseconds since the Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastViewed {
    /// Read from the membership record
    Known(i64),
    /// The lookup failed; this is the local clock at the time of the call
    Approximate(i64),
}

impl LastViewed {
    pub fn millis(&self) -> i64 {
        match self {
            LastViewed::Known(ms) | LastViewed::Approximate(ms) => *ms,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, LastViewed::Known(_))
    }
}

/// Channel cache for one session.
///
/// Lookups answer from the store and return empty values for unknown
/// channels. Every remote call goes through the rate-limit retrier.
pub struct ChannelClient<A> {
    api: Arc<A>,
    user_id: UserId,
    store: Arc<ChannelStore>,
    retrier: Arc<RateLimitRetrier>,
    sync: SyncOrchestrator<A>,
    cancel: Cancellation,
}

impl<A: MattermostApi> ChannelClient<A> {
    pub fn new(
        api: Arc<A>,
        user_id: UserId,
        store: Arc<ChannelStore>,
        retrier: Arc<RateLimitRetrier>,
        cancel: Cancellation,
    ) -> Self {
        let sync = SyncOrchestrator::new(
            api.clone(),
            store.clone(),
            retrier.clone(),
            user_id.clone(),
            cancel.clone(),
        );

        Self {
            api,
            user_id,
            store,
            retrier,
            sync,
            cancel,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.sync = self.sync.with_page_size(page_size);
        self
    }

    /// Start a session: resolve the user and their teams, pick the primary
    /// team and populate the store
    pub async fn connect(api: Arc<A>, settings: &Settings, cancel: Cancellation) -> Result<Self> {
        let retrier = Arc::new(RateLimitRetrier::from_config(&settings.sync));

        let me = retrier
            .invoke("GetMe", &cancel, || api.get_me())
            .await?;
        tracing::info!(user_id = %me.id, username = %me.username, "Authenticated");

        let summaries = retrier
            .invoke("GetTeamsForUser", &cancel, || api.get_teams_for_me())
            .await?;
        let mut teams: Vec<Team> = summaries.into_iter().map(Team::from).collect();

        let wanted = settings.mattermost.team.as_deref();
        let primary_index = match wanted {
            Some(wanted) => teams
                .iter()
                .position(|t| t.name == wanted || t.id.as_str() == wanted)
                .ok_or_else(|| {
                    ChannelSyncError::Config(format!(
                        "Team {} not found for {}",
                        wanted, me.username
                    ))
                })?,
            None if teams.is_empty() => return Err(ChannelSyncError::NoTeams(me.username)),
            None => 0,
        };
        let primary = teams.remove(primary_index);
        tracing::info!(
            primary_team = %primary.id,
            primary_name = %primary.name,
            other_teams = teams.len(),
            "Selected primary team"
        );

        let store = Arc::new(ChannelStore::new(primary, teams));
        let client = Self::new(api, me.id, store, retrier, cancel)
            .with_page_size(settings.sync.page_size);

        client.update_channels().await?;
        Ok(client)
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn store(&self) -> &Arc<ChannelStore> {
        &self.store
    }

    pub async fn retry_stats(&self) -> RetryStats {
        self.retrier.get_stats().await
    }

    pub async fn log_retry_stats(&self) {
        self.retrier.log_stats().await;
    }

    pub async fn store_sizes(&self) -> StoreSizes {
        self.store.sizes().await
    }

    /// Channels we are a member of, primary team first
    pub async fn get_channels(&self) -> Vec<Channel> {
        self.store.all_joined_channels().await
    }

    /// Existing channels we are not a member of
    pub async fn get_more_channels(&self) -> Vec<Channel> {
        self.store.all_joinable_channels().await
    }

    /// Channel id for a normalized name.
    ///
    /// With a team, a cache miss falls back to asking the server, which also
    /// finds private channels the cache never lists. Without a team only the
    /// cache is searched.
    pub async fn get_channel_id(&self, name: &str, team_id: Option<&TeamId>) -> Option<ChannelId> {
        if let Some(id) = self.store.find_id_by_name(name, team_id).await {
            return Some(id);
        }

        let team_id = team_id?;
        tracing::debug!(team_id = %team_id, name = %name, "Channel not cached, asking server");

        match self
            .retrier
            .invoke("GetChannelByName", &self.cancel, || {
                self.api.get_channel_by_name(team_id, name)
            })
            .await
        {
            Ok(channel) => Some(channel.id),
            Err(e) => {
                tracing::debug!(
                    team_id = %team_id,
                    name = %name,
                    error = %e,
                    "Channel lookup by name failed"
                );
                None
            }
        }
    }

    /// Normalized name of a channel, empty if unknown
    pub async fn get_channel_name(&self, channel_id: &ChannelId) -> String {
        self.store
            .name_for_channel(channel_id)
            .await
            .unwrap_or_default()
    }

    /// `team_id` recorded on the channel, empty if unknown or a direct message
    pub async fn get_channel_team_id(&self, channel_id: &ChannelId) -> String {
        self.store
            .channel_team_id(channel_id)
            .await
            .map(|id| id.0)
            .unwrap_or_default()
    }

    pub async fn get_channel_header(&self, channel_id: &ChannelId) -> String {
        self.store
            .header_for_channel(channel_id)
            .await
            .unwrap_or_default()
    }

    /// Team holding the channel in the store, `"G"` for group messages,
    /// empty if unknown
    pub async fn get_team_from_channel(&self, channel_id: &ChannelId) -> String {
        self.store
            .team_for_channel(channel_id)
            .await
            .map(|id| id.0)
            .unwrap_or_default()
    }

    /// When we last viewed the channel. Falls back to the current time,
    /// marked [`LastViewed::Approximate`], when the lookup fails.
    pub async fn get_last_viewed_at(&self, channel_id: &ChannelId) -> LastViewed {
        match self
            .retrier
            .invoke("GetChannelMember", &self.cancel, || {
                self.api.get_channel_member(channel_id, &self.user_id)
            })
            .await
        {
            Ok(member) => LastViewed::Known(member.last_viewed_at),
            Err(e) => {
                tracing::debug!(
                    channel_id = %channel_id,
                    error = %e,
                    "Using current time as last viewed"
                );
                LastViewed::Approximate(chrono::Utc::now().timestamp_millis())
            }
        }
    }

    /// Join a channel unless the primary team already lists it as joined
    pub async fn join_channel(&self, channel_id: &ChannelId) -> Result<()> {
        if self.store.is_joined_in_primary(channel_id).await {
            tracing::debug!(channel_id = %channel_id, "Not joining, already joined");
            return Ok(());
        }

        tracing::debug!(channel_id = %channel_id, "Joining channel");
        self.retrier
            .invoke("AddChannelMember", &self.cancel, || {
                self.api.add_channel_member(channel_id, &self.user_id)
            })
            .await?;
        Ok(())
    }

    /// Refresh every team, primary first
    pub async fn update_channels(&self) -> Result<()> {
        self.sync.refresh_all().await
    }

    pub async fn update_channels_team(&self, team_id: &TeamId) -> Result<()> {
        self.sync.refresh_team(team_id).await
    }

    /// Set a channel header on the server. Best effort: failures are logged.
    /// The cached header stays stale until the next refresh.
    pub async fn update_channel_header(&self, channel_id: &ChannelId, header: &str) {
        tracing::debug!(channel_id = %channel_id, header = %header, "Updating channel header");

        if let Err(e) = self
            .retrier
            .invoke("UpdateChannel", &self.cancel, || {
                self.api.patch_channel_header(channel_id, header)
            })
            .await
        {
            log_error("update_channel_header", channel_id.as_str(), &e);
        }
    }

    /// Mark a channel as viewed
    pub async fn update_last_viewed(&self, channel_id: &ChannelId) -> Result<()> {
        tracing::debug!(channel_id = %channel_id, "Posting last viewed");

        self.retrier
            .invoke("ViewChannel", &self.cancel, || {
                self.api.view_channel(&self.user_id, channel_id)
            })
            .await
            .inspect_err(|e| log_error("update_last_viewed", channel_id.as_str(), e))
    }
}
