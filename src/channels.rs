use std::collections::BTreeSet;

use crate::video::Video;

/// Distinct channel names across `videos`, sorted lexicographically.
///
/// Recomputed on every call; it is a single linear pass over the feed.
pub fn channel_index(videos: &[Video]) -> Vec<String> {
  videos.iter().map(|v| v.channel.as_str()).collect::<BTreeSet<_>>().into_iter().map(str::to_string).collect()
}
