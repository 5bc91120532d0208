//! Refresh orchestration and the retry policy around remote calls

mod cancel;
mod orchestrator;
mod retry;

pub use cancel::{CancelHandle, Cancellation};
pub use orchestrator::{DEFAULT_PAGE_SIZE, SyncOrchestrator};
pub use retry::{RateLimitRetrier, RetryStats};
