use mattermost_channel_sync::ChannelClient;
use mattermost_channel_sync::api::HttpApi;
use mattermost_channel_sync::config::load_settings;
use mattermost_channel_sync::error::{ChannelSyncError, Result};
use mattermost_channel_sync::logging::init_tracing;
use mattermost_channel_sync::store::normalized_name;
use mattermost_channel_sync::sync::Cancellation;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(std::env::var("LOG_FORMAT").is_ok_and(|f| f == "json"));

    tracing::info!("Starting Mattermost channel sync");

    // Load configuration
    let settings = load_settings()?;
    tracing::debug!(
        server = %settings.mattermost.server_url,
        team = ?settings.mattermost.team,
        page_size = settings.sync.page_size,
        "Configuration loaded"
    );

    let api = Arc::new(HttpApi::new(&settings.mattermost)?);

    // Signals cancel any retry backoff in progress
    let (cancel_handle, cancel) = Cancellation::new();
    tokio::spawn(async move {
        let signal_name = shutdown_signal().await;
        tracing::info!(signal = %signal_name, "Received shutdown signal, cancelling sync");
        cancel_handle.cancel();
    });

    // A refresh that outlives the deadline is dropped, which aborts it
    let timeout = settings.sync.refresh_timeout;
    let client = match tokio::time::timeout(timeout, ChannelClient::connect(api, &settings, cancel))
        .await
    {
        Ok(result) => result?,
        Err(_) => {
            tracing::error!(timeout_secs = timeout.as_secs(), "Channel sync timed out");
            return Err(ChannelSyncError::cancelled("connect"));
        }
    };

    let sizes = client.store_sizes().await;
    tracing::info!(
        teams = sizes.teams,
        joined = sizes.joined,
        joinable = sizes.joinable,
        "Channel sync complete"
    );

    for channel in client.get_channels().await {
        let team_id = client.get_team_from_channel(&channel.id).await;
        tracing::info!(
            channel_id = %channel.id,
            team_id = %team_id,
            name = %normalized_name(&channel),
            "Joined channel"
        );
    }

    client.log_retry_stats().await;

    Ok(())
}

/// Wait for SIGINT or SIGTERM (Ctrl+C only on non-Unix)
async fn shutdown_signal() -> &'static str {
    #[cfg(unix)]
    {
        use signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => "SIGINT (Ctrl+C)",
                    _ = sigterm.recv() => "SIGTERM",
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                let _ = signal::ctrl_c().await;
                "SIGINT (Ctrl+C)"
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = signal::ctrl_c().await;
        "Ctrl+C"
    }
}
