//! Scripted in-memory `MattermostApi` for unit tests

use crate::api::{ApiError, ApiFailure, ApiResult, MattermostApi, ResponseMeta};
use crate::model::{Channel, ChannelId, ChannelMember, TeamId, TeamSummary, UserId, UserRecord};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// 429 with a wait hint in milliseconds
pub fn throttled(wait_ms: u64) -> ApiFailure {
    ApiFailure::new(
        ResponseMeta::new(429).with_retry_after(Duration::from_millis(wait_ms)),
        status_error("api.context.rate_limit", "Too many requests"),
    )
}

pub fn fatal(status: u16) -> ApiFailure {
    ApiFailure::new(
        ResponseMeta::new(status),
        status_error("api.test.fatal", "Scripted failure"),
    )
}

fn status_error(id: &str, message: &str) -> ApiError {
    ApiError::Status {
        id: id.to_string(),
        message: message.to_string(),
    }
}

/// Queue of scripted responses per key, plus a call counter
pub struct Script<T> {
    queues: Mutex<HashMap<String, VecDeque<ApiResult<T>>>>,
    calls: Mutex<Vec<String>>,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            queues: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl<T> Script<T> {
    pub fn push(&self, key: &str, response: ApiResult<T>) {
        self.queues
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, key: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|k| *k == key).count()
    }

    /// Next scripted response, or the result of `exhausted` when none is queued
    fn next_or(&self, key: &str, exhausted: impl FnOnce() -> ApiResult<T>) -> ApiResult<T> {
        self.calls.lock().unwrap().push(key.to_string());
        self.queues
            .lock()
            .unwrap()
            .get_mut(key)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(exhausted)
    }

    fn next(&self, key: &str) -> ApiResult<T> {
        self.next_or(key, || Err(fatal(404)))
    }
}

#[derive(Default)]
pub struct MockApi {
    pub me: Script<UserRecord>,
    pub teams: Script<Vec<TeamSummary>>,
    /// Keyed by team id
    pub joined: Script<Vec<Channel>>,
    /// Keyed by `"{team}:{page}"`; unscripted pages are empty
    pub public_pages: Script<Vec<Channel>>,
    /// Keyed by `"{team}:{name}"`
    pub by_name: Script<Channel>,
    /// Keyed by channel id
    pub members: Script<ChannelMember>,
    /// Keyed by channel id
    pub joins: Script<ChannelMember>,
    /// Keyed by channel id
    pub headers: Script<Channel>,
    /// Keyed by channel id
    pub views: Script<()>,
}

impl MockApi {
    /// Script a complete, unthrottled refresh of one team
    pub fn script_team(&self, team: &str, joined: Vec<Channel>, pages: Vec<Vec<Channel>>) {
        self.joined.push(team, Ok(joined));
        for (page, channels) in pages.into_iter().enumerate() {
            self.public_pages.push(&format!("{team}:{page}"), Ok(channels));
        }
    }
}

pub fn member(channel_id: &ChannelId, user_id: &UserId, last_viewed_at: i64) -> ChannelMember {
    ChannelMember {
        channel_id: channel_id.clone(),
        user_id: user_id.clone(),
        last_viewed_at,
        msg_count: 0,
        mention_count: 0,
    }
}

impl MattermostApi for MockApi {
    async fn get_me(&self) -> ApiResult<UserRecord> {
        self.me.next("me")
    }

    async fn get_teams_for_me(&self) -> ApiResult<Vec<TeamSummary>> {
        self.teams.next("me")
    }

    async fn get_channels_for_team_for_user(
        &self,
        team_id: &TeamId,
        _user_id: &UserId,
    ) -> ApiResult<Vec<Channel>> {
        self.joined.next(team_id.as_str())
    }

    async fn get_public_channels_for_team(
        &self,
        team_id: &TeamId,
        page: u32,
        _per_page: u32,
    ) -> ApiResult<Vec<Channel>> {
        self.public_pages
            .next_or(&format!("{team_id}:{page}"), || Ok(Vec::new()))
    }

    async fn get_channel_by_name(&self, team_id: &TeamId, name: &str) -> ApiResult<Channel> {
        self.by_name.next(&format!("{team_id}:{name}"))
    }

    async fn get_channel_member(
        &self,
        channel_id: &ChannelId,
        _user_id: &UserId,
    ) -> ApiResult<ChannelMember> {
        self.members.next(channel_id.as_str())
    }

    async fn add_channel_member(
        &self,
        channel_id: &ChannelId,
        user_id: &UserId,
    ) -> ApiResult<ChannelMember> {
        self.joins
            .next_or(channel_id.as_str(), || Ok(member(channel_id, user_id, 0)))
    }

    async fn patch_channel_header(
        &self,
        channel_id: &ChannelId,
        _header: &str,
    ) -> ApiResult<Channel> {
        self.headers.next(channel_id.as_str())
    }

    async fn view_channel(&self, _user_id: &UserId, channel_id: &ChannelId) -> ApiResult<()> {
        self.views.next_or(channel_id.as_str(), || Ok(()))
    }
}
