//! Full and per-team refresh of the channel store

use crate::api::MattermostApi;
use crate::error::Result;
use crate::logging::Timer;
use crate::model::{Channel, TeamId, UserId};
use crate::store::ChannelStore;
use crate::sync::{Cancellation, RateLimitRetrier};
use std::sync::Arc;

/// Default number of public channels requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 200;

/// Pulls channel lists from the server and writes them into the store.
///
/// All fetching happens before the store lock is taken; only the final
/// assignment runs under it.
pub struct SyncOrchestrator<A> {
    api: Arc<A>,
    store: Arc<ChannelStore>,
    retrier: Arc<RateLimitRetrier>,
    user_id: UserId,
    page_size: u32,
    cancel: Cancellation,
}

impl<A: MattermostApi> SyncOrchestrator<A> {
    pub fn new(
        api: Arc<A>,
        store: Arc<ChannelStore>,
        retrier: Arc<RateLimitRetrier>,
        user_id: UserId,
        cancel: Cancellation,
    ) -> Self {
        Self {
            api,
            store,
            retrier,
            user_id,
            page_size: DEFAULT_PAGE_SIZE,
            cancel,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Refresh the joined and joinable channel lists of one team
    pub async fn refresh_team(&self, team_id: &TeamId) -> Result<()> {
        let _timer = Timer::new("refresh_team").with_subject(team_id.as_str());

        let joined = self
            .retrier
            .invoke("GetChannelsForTeamForUser", &self.cancel, || {
                self.api.get_channels_for_team_for_user(team_id, &self.user_id)
            })
            .await?;
        let joined_count = joined.len();

        if !self.store.replace_team_channels(team_id, joined).await {
            tracing::debug!(team_id = %team_id, "Team not in store, joined channels discarded");
        }

        let more = self.fetch_public_channels(team_id).await?;
        let more_count = more.len();

        if !self.store.replace_team_more_channels(team_id, more).await {
            tracing::debug!(team_id = %team_id, "Team not in store, joinable channels discarded");
        }

        tracing::debug!(
            team_id = %team_id,
            joined = joined_count,
            joinable = more_count,
            "Refreshed team channels"
        );
        Ok(())
    }

    /// Page through the team's public channels until an empty page
    async fn fetch_public_channels(&self, team_id: &TeamId) -> Result<Vec<Channel>> {
        let mut channels = Vec::new();
        let mut page = 0u32;

        loop {
            let batch = self
                .retrier
                .invoke("GetPublicChannelsForTeam", &self.cancel, || {
                    self.api
                        .get_public_channels_for_team(team_id, page, self.page_size)
                })
                .await?;

            if batch.is_empty() {
                break;
            }

            tracing::trace!(
                team_id = %team_id,
                page,
                count = batch.len(),
                "Fetched public channel page"
            );
            channels.extend(batch);
            page += 1;
        }

        Ok(channels)
    }

    /// Refresh the primary team, then every other team.
    ///
    /// Stops at the first fatal error. Teams refreshed before it keep their
    /// new data.
    pub async fn refresh_all(&self) -> Result<()> {
        let _timer = Timer::new("refresh_all");
        let primary = self.store.primary_team_id().clone();

        self.refresh_team(&primary).await?;

        for team_id in self.store.team_ids().await {
            if team_id == primary {
                continue;
            }
            self.refresh_team(&team_id).await?;
        }

        let sizes = self.store.sizes().await;
        tracing::info!(
            teams = sizes.teams,
            joined = sizes.joined,
            joinable = sizes.joinable,
            "Channel store refreshed"
        );
        Ok(())
    }
}
