mod settings;

pub use settings::{MattermostConfig, Settings, SyncConfig, load_settings};
