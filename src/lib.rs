pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod store;
pub mod sync;

pub use client::{ChannelClient, LastViewed};
pub use error::{ChannelSyncError, Result};
