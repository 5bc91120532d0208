use crate::model::Channel;
use std::borrow::Cow;

/// Canonical lookup name of a channel.
///
/// Group messages have machine-generated handles, so they are addressed by
/// their member list instead: `"alice, bob smith"` becomes `"alice-bob_smith"`.
/// `", "` must be replaced before the remaining spaces. Every other channel
/// type uses its handle unchanged.
pub fn normalized_name(channel: &Channel) -> Cow<'_, str> {
    if channel.is_group() {
        Cow::Owned(channel.display_name.replace(", ", "-").replace(' ', "_"))
    } else {
        Cow::Borrowed(&channel.name)
    }
}
