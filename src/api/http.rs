use crate::api::{ApiError, ApiFailure, ApiResult, MattermostApi, ResponseMeta};
use crate::config::MattermostConfig;
use crate::error::{ChannelSyncError, Result};
use crate::model::{Channel, ChannelId, ChannelMember, TeamId, TeamSummary, UserId, UserRecord};
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

const API_PREFIX: [&str; 2] = ["api", "v4"];
const RATELIMIT_RESET_HEADER: &str = "X-Ratelimit-Reset";
const RETRY_AFTER_HEADER: &str = "Retry-After";

/// Error body Mattermost returns with non-2xx responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    id: String,
    #[serde(default)]
    message: String,
}

/// Mattermost REST v4 client authenticated with a personal access token
pub struct HttpApi {
    http: Client,
    base_url: Url,
    token: String,
}

impl HttpApi {
    pub fn new(config: &MattermostConfig) -> Result<Self> {
        let base_url = Url::parse(&config.server_url).map_err(|e| {
            ChannelSyncError::Config(format!("Invalid MATTERMOST_URL {}: {}", config.server_url, e))
        })?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ChannelSyncError::Config(format!(
                "MATTERMOST_URL must be http(s), got {}",
                base_url.scheme()
            )));
        }

        let http = Client::builder()
            .user_agent(concat!("mattermost-channel-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        tracing::debug!(server = %base_url, "Created Mattermost HTTP client");

        Ok(Self {
            http,
            base_url,
            token: config.token.clone(),
        })
    }

    /// Build `{base}/api/v4/{segments...}`, percent-encoding each segment
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(API_PREFIX.iter().chain(segments.iter()));
        }
        url
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(ApiFailure::transport)?;

        let status = response.status();
        let mut meta = ResponseMeta::new(status.as_u16());
        meta.retry_after = retry_after_from_headers(response.headers());

        let body = response
            .bytes()
            .await
            .map_err(|e| ApiFailure::new(meta.clone(), e))?;

        if !status.is_success() {
            let error = match serde_json::from_slice::<ErrorBody>(&body) {
                Ok(parsed) => ApiError::Status {
                    id: parsed.id,
                    message: parsed.message,
                },
                Err(_) => ApiError::Status {
                    id: String::new(),
                    message: String::from_utf8_lossy(&body).into_owned(),
                },
            };
            tracing::trace!(status = status.as_u16(), error = %error, "Mattermost request failed");
            return Err(ApiFailure::new(meta, error));
        }

        serde_json::from_slice(&body).map_err(|e| ApiFailure::new(meta, e))
    }
}

/// Wait hint of a throttled response.
///
/// Mattermost sends `X-Ratelimit-Reset` in whole seconds; `Retry-After` is
/// honoured when that is missing.
pub fn retry_after_from_headers(headers: &HeaderMap) -> Option<Duration> {
    [RATELIMIT_RESET_HEADER, RETRY_AFTER_HEADER]
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

impl MattermostApi for HttpApi {
    async fn get_me(&self) -> ApiResult<UserRecord> {
        self.send(self.http.get(self.endpoint(&["users", "me"])))
            .await
    }

    async fn get_teams_for_me(&self) -> ApiResult<Vec<TeamSummary>> {
        self.send(self.http.get(self.endpoint(&["users", "me", "teams"])))
            .await
    }

    async fn get_channels_for_team_for_user(
        &self,
        team_id: &TeamId,
        user_id: &UserId,
    ) -> ApiResult<Vec<Channel>> {
        let url = self.endpoint(&[
            "users",
            user_id.as_str(),
            "teams",
            team_id.as_str(),
            "channels",
        ]);
        self.send(self.http.get(url).query(&[("include_deleted", "false")]))
            .await
    }

    async fn get_public_channels_for_team(
        &self,
        team_id: &TeamId,
        page: u32,
        per_page: u32,
    ) -> ApiResult<Vec<Channel>> {
        let url = self.endpoint(&["teams", team_id.as_str(), "channels"]);
        self.send(
            self.http
                .get(url)
                .query(&[("page", page), ("per_page", per_page)]),
        )
        .await
    }

    async fn get_channel_by_name(&self, team_id: &TeamId, name: &str) -> ApiResult<Channel> {
        let url = self.endpoint(&["teams", team_id.as_str(), "channels", "name", name]);
        self.send(self.http.get(url)).await
    }

    async fn get_channel_member(
        &self,
        channel_id: &ChannelId,
        user_id: &UserId,
    ) -> ApiResult<ChannelMember> {
        let url = self.endpoint(&["channels", channel_id.as_str(), "members", user_id.as_str()]);
        self.send(self.http.get(url)).await
    }

    async fn add_channel_member(
        &self,
        channel_id: &ChannelId,
        user_id: &UserId,
    ) -> ApiResult<ChannelMember> {
        let url = self.endpoint(&["channels", channel_id.as_str(), "members"]);
        self.send(self.http.post(url).json(&json!({ "user_id": user_id })))
            .await
    }

    async fn patch_channel_header(
        &self,
        channel_id: &ChannelId,
        header: &str,
    ) -> ApiResult<Channel> {
        let url = self.endpoint(&["channels", channel_id.as_str(), "patch"]);
        self.send(self.http.put(url).json(&json!({ "header": header })))
            .await
    }

    async fn view_channel(&self, user_id: &UserId, channel_id: &ChannelId) -> ApiResult<()> {
        let url = self.endpoint(&["channels", "members", user_id.as_str(), "view"]);
        let _: serde_json::Value = self
            .send(self.http.post(url).json(&json!({ "channel_id": channel_id })))
            .await?;
        Ok(())
    }
}
