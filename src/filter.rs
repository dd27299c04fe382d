//! Client-side filtering of the accumulated feed.
//!
//! A video is visible when it passes every criterion that is set: text, start date,
//! end date and channel. Unset criteria match everything. Evaluation never touches the
//! feed or the criteria, so the visible set can be recomputed on every keystroke.

use chrono::{DateTime, Days, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use std::collections::BTreeSet;

use crate::video::Video;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
  search: String,
  start: Option<NaiveDate>,
  end: Option<NaiveDate>,
  channels: BTreeSet<String>,
}

impl FilterCriteria {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn search(&self) -> &str {
    &self.search
  }

  pub fn start(&self) -> Option<NaiveDate> {
    self.start
  }

  pub fn end(&self) -> Option<NaiveDate> {
    self.end
  }

  pub fn channels(&self) -> &BTreeSet<String> {
    &self.channels
  }

  pub fn is_channel_selected(&self, channel: &str) -> bool {
    self.channels.contains(channel)
  }

  pub fn set_search(&mut self, text: impl Into<String>) {
    self.search = text.into();
  }

  pub fn set_start(&mut self, date: Option<NaiveDate>) {
    self.start = date;
  }

  pub fn set_end(&mut self, date: Option<NaiveDate>) {
    self.end = date;
  }

  /// Select `channel` if it is not selected, deselect it otherwise.
  /// Deselecting the last channel lifts the channel restriction entirely.
  pub fn toggle_channel(&mut self, channel: &str) {
    if !self.channels.remove(channel) {
      self.channels.insert(channel.to_string());
    }
  }

  /// Reset every criterion in one step.
  pub fn clear(&mut self) {
    *self = Self::default();
  }

  /// Whether any criterion currently restricts the feed.
  pub fn is_active(&self) -> bool {
    !self.search.is_empty() || self.start.is_some() || self.end.is_some() || !self.channels.is_empty()
  }
}

/// Case-insensitive substring match against title or description.
fn matches_text(video: &Video, needle: &str) -> bool {
  if needle.is_empty() {
    return true;
  }
  let needle = needle.to_lowercase();
  video.title.to_lowercase().contains(&needle) || video.description.to_lowercase().contains(&needle)
}

/// Midnight at the start of `date` on the user's local clock.
///
/// Where local midnight falls in a DST gap, UTC midnight stands in for it.
fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
  let naive = date.and_time(NaiveTime::MIN);
  Local.from_local_datetime(&naive).earliest().map(|t| t.with_timezone(&Utc)).unwrap_or_else(|| naive.and_utc())
}

fn matches_start(video: &Video, start: Option<NaiveDate>) -> bool {
  start.is_none_or(|d| video.published_at >= start_of_day(d))
}

/// The end date covers the whole day: anything before the next midnight passes.
fn matches_end(video: &Video, end: Option<NaiveDate>) -> bool {
  end.is_none_or(|d| match d.checked_add_days(Days::new(1)) {
    Some(next) => video.published_at < start_of_day(next),
    None => true,
  })
}

fn matches_channel(video: &Video, channels: &BTreeSet<String>) -> bool {
  channels.is_empty() || channels.contains(&video.channel)
}

/// Whether `video` passes every criterion in `criteria`.
pub fn evaluate(video: &Video, criteria: &FilterCriteria) -> bool {
  matches_text(video, &criteria.search)
    && matches_start(video, criteria.start)
    && matches_end(video, criteria.end)
    && matches_channel(video, &criteria.channels)
}

/// The videos that pass `criteria`, in feed order.
pub fn visible_set<'a>(videos: &'a [Video], criteria: &FilterCriteria) -> Vec<&'a Video> {
  videos.iter().filter(|v| evaluate(v, criteria)).collect()
}

/// Parse a `YYYY-MM-DD` date entry. Blank input means "no bound".
pub fn parse_date_entry(input: &str) -> Result<Option<NaiveDate>, chrono::ParseError> {
  let trimmed = input.trim();
  if trimmed.is_empty() {
    return Ok(None);
  }
  NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map(Some)
}
