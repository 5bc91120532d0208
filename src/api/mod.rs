//! Transport seam to the Mattermost REST API
//!
//! Every remote call returns either its payload or an [`ApiFailure`] that pairs
//! the underlying error with the response metadata. The metadata is the only
//! thing the rate-limit retrier looks at.

mod http;
#[cfg(test)]
pub(crate) mod mock;

pub use http::{HttpApi, retry_after_from_headers};

use crate::model::{Channel, ChannelId, ChannelMember, TeamId, TeamSummary, UserId, UserRecord};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// HTTP status Mattermost uses for throttled requests
pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Response metadata attached to a failed call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseMeta {
    /// HTTP status; 0 when no response was received
    pub status_code: u16,

    /// Server-provided wait hint
    pub retry_after: Option<Duration>,
}

impl ResponseMeta {
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            retry_after: None,
        }
    }

    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status_code == STATUS_TOO_MANY_REQUESTS
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message} ({id})")]
    Status { id: String, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug)]
pub struct ApiFailure {
    pub meta: ResponseMeta,
    pub error: ApiError,
}

impl ApiFailure {
    pub fn new(meta: ResponseMeta, error: impl Into<ApiError>) -> Self {
        Self {
            meta,
            error: error.into(),
        }
    }

    /// A failure for which no HTTP response exists (connect, TLS, timeout)
    pub fn transport(error: reqwest::Error) -> Self {
        let status_code = error.status().map(|s| s.as_u16()).unwrap_or(0);
        Self::new(ResponseMeta::new(status_code), error)
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiFailure>;

/// Remote operations the channel cache depends on
pub trait MattermostApi: Send + Sync {
    /// The authenticated user
    fn get_me(&self) -> impl Future<Output = ApiResult<UserRecord>> + Send;

    /// Teams the authenticated user belongs to
    fn get_teams_for_me(&self) -> impl Future<Output = ApiResult<Vec<TeamSummary>>> + Send;

    /// Channels of `team_id` that `user_id` is a member of
    fn get_channels_for_team_for_user(
        &self,
        team_id: &TeamId,
        user_id: &UserId,
    ) -> impl Future<Output = ApiResult<Vec<Channel>>> + Send;

    /// One page of the team's public channels; page numbering starts at 0
    fn get_public_channels_for_team(
        &self,
        team_id: &TeamId,
        page: u32,
        per_page: u32,
    ) -> impl Future<Output = ApiResult<Vec<Channel>>> + Send;

    fn get_channel_by_name(
        &self,
        team_id: &TeamId,
        name: &str,
    ) -> impl Future<Output = ApiResult<Channel>> + Send;

    fn get_channel_member(
        &self,
        channel_id: &ChannelId,
        user_id: &UserId,
    ) -> impl Future<Output = ApiResult<ChannelMember>> + Send;

    fn add_channel_member(
        &self,
        channel_id: &ChannelId,
        user_id: &UserId,
    ) -> impl Future<Output = ApiResult<ChannelMember>> + Send;

    fn patch_channel_header(
        &self,
        channel_id: &ChannelId,
        header: &str,
    ) -> impl Future<Output = ApiResult<Channel>> + Send;

    /// Record that `user_id` has viewed `channel_id`
    fn view_channel(
        &self,
        user_id: &UserId,
        channel_id: &ChannelId,
    ) -> impl Future<Output = ApiResult<()>> + Send;
}
