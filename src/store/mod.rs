//! Channel membership mirror and name normalization

mod normalize;
#[allow(clippy::module_inception)]
mod store;

pub use normalize::normalized_name;
pub use store::{ChannelStore, StoreSizes};
