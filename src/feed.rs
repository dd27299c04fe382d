//! Client-side accumulation of the paginated video listing.
//!
//! The feed only grows: each successful page is appended after the records already
//! held, in the order the source returned them. A failed page leaves everything as it
//! was so the same cursor can be retried. At most one page request is outstanding.

use tracing::{debug, info, warn};

use crate::source::{FetchError, VideoSource};
use crate::video::{PageResult, Video};

/// Where the feed is in its fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStatus {
  #[default]
  Idle,
  Loading,
  Failed,
}

/// Permission to run exactly one page request, issued by [`Feed::begin_load`].
///
/// Carries the cursor to request and the generation it was issued for. Every
/// [`Feed::begin_load`] and [`Feed::reset`] starts a new generation, so a ticket is
/// honoured at most once and never after a reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
  cursor: Option<String>,
  generation: u64,
}

impl FetchTicket {
  pub fn cursor(&self) -> Option<&str> {
    self.cursor.as_deref()
  }
}

/// What happened to a [`Feed::load_next`] / [`Feed::complete`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
  /// A page was appended; holds the number of new records.
  Appended(usize),
  /// The page request failed; state is unchanged apart from the status.
  Failed(FetchError),
  /// A request was already in flight, so nothing was started.
  AlreadyLoading,
  /// The ticket was already used or the feed has been reset since it was issued.
  Stale,
}

#[derive(Debug, Clone)]
pub struct Feed {
  videos: Vec<Video>,
  cursor: Option<String>,
  has_more: bool,
  status: FetchStatus,
  last_error: Option<String>,
  pages: usize,
  generation: u64,
}

impl Default for Feed {
  fn default() -> Self {
    Self::new()
  }
}

impl Feed {
  pub fn new() -> Self {
    Self {
      videos: Vec::new(),
      cursor: None,
      has_more: true,
      status: FetchStatus::Idle,
      last_error: None,
      pages: 0,
      generation: 0,
    }
  }

  pub fn videos(&self) -> &[Video] {
    &self.videos
  }

  pub fn cursor(&self) -> Option<&str> {
    self.cursor.as_deref()
  }

  pub fn has_more(&self) -> bool {
    self.has_more
  }

  pub fn status(&self) -> FetchStatus {
    self.status
  }

  pub fn is_loading(&self) -> bool {
    self.status == FetchStatus::Loading
  }

  pub fn last_error(&self) -> Option<&str> {
    self.last_error.as_deref()
  }

  /// Number of pages successfully appended since the last reset.
  pub fn page_count(&self) -> usize {
    self.pages
  }

  /// True when another page exists and no request is in flight.
  pub fn can_load_more(&self) -> bool {
    self.has_more && self.status != FetchStatus::Loading
  }

  /// Drop everything fetched so far and start over from the first page.
  ///
  /// Any request still in flight becomes stale: its completion will be ignored.
  pub fn reset(&mut self) {
    info!(discarded = self.videos.len(), "feed: reset");
    self.videos.clear();
    self.cursor = None;
    self.has_more = true;
    self.status = FetchStatus::Idle;
    self.last_error = None;
    self.pages = 0;
    self.generation += 1;
  }

  /// Start a page request. Returns `None` while another request is in flight.
  pub fn begin_load(&mut self) -> Option<FetchTicket> {
    if self.status == FetchStatus::Loading {
      debug!("feed: load requested while loading, ignoring");
      return None;
    }
    self.status = FetchStatus::Loading;
    self.generation += 1;
    info!(cursor = ?self.cursor, fetched = self.videos.len(), "feed: loading page");
    Some(FetchTicket { cursor: self.cursor.clone(), generation: self.generation })
  }

  /// Apply the result of the request started with `ticket`.
  pub fn complete(&mut self, ticket: FetchTicket, result: Result<PageResult, FetchError>) -> LoadOutcome {
    if ticket.generation != self.generation || self.status != FetchStatus::Loading {
      debug!(ticket = ticket.generation, current = self.generation, status = ?self.status, "feed: dropping stale page");
      return LoadOutcome::Stale;
    }
    match result {
      Ok(page) => {
        let added = page.videos.len();
        self.videos.extend(page.videos);
        self.cursor = page.next_cursor;
        self.has_more = page.has_more;
        self.status = FetchStatus::Idle;
        self.last_error = None;
        self.pages += 1;
        info!(added, total = self.videos.len(), has_more = self.has_more, "feed: page appended");
        LoadOutcome::Appended(added)
      }
      Err(e) => {
        warn!(err = %e, cursor = ?self.cursor, "feed: page request failed");
        self.status = FetchStatus::Failed;
        self.last_error = Some(e.to_string());
        LoadOutcome::Failed(e)
      }
    }
  }

  /// Fetch the next page from `source` and apply it.
  pub async fn load_next<S: VideoSource>(&mut self, source: &S) -> LoadOutcome {
    let Some(ticket) = self.begin_load() else { return LoadOutcome::AlreadyLoading };
    let result = source.fetch_page(ticket.cursor()).await;
    self.complete(ticket, result)
  }
}
