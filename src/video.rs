use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Deserializer};

/// A single video record as served by the listing API.
///
/// Records are never edited after they are fetched; the feed only appends them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Video {
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub description: String,
  #[serde(default, rename = "thumbnail_url")]
  pub thumbnail: String,
  pub published_at: DateTime<Utc>,
  /// Channel name; this is what the channel filter and channel index key on.
  #[serde(rename = "channel_title")]
  pub channel: String,
  #[serde(default)]
  pub channel_id: Option<String>,
}

/// One page of the listing plus the token for the page after it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PageResult {
  /// A `null` list decodes as an empty page.
  #[serde(default, deserialize_with = "null_as_empty")]
  pub videos: Vec<Video>,
  /// Empty cursors on the wire are normalised to `None`.
  #[serde(default, deserialize_with = "non_empty_cursor")]
  pub next_cursor: Option<String>,
  /// Backends that do not page by cursor omit this; absent means there is nothing more.
  #[serde(default)]
  pub has_more: bool,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Video>, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(Option::<Vec<Video>>::deserialize(deserializer)?.unwrap_or_default())
}

fn non_empty_cursor<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  let raw: Option<String> = Option::deserialize(deserializer)?;
  Ok(raw.filter(|s| !s.is_empty()))
}

impl Video {
  pub fn watch_url(&self) -> String {
    format!("https://www.youtube.com/watch?v={}", self.id)
  }

  /// Publish time on the local clock, e.g. `March 1, 2024 14:05`.
  pub fn published_label(&self) -> String {
    self.published_at.with_timezone(&Local).format("%B %-d, %Y %H:%M").to_string()
  }
}
