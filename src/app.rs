use ratatui::widgets::ListState;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::channels::channel_index;
use crate::config::PrefStore;
use crate::constants::constants;
use crate::feed::{Feed, FetchTicket, LoadOutcome};
use crate::filter::{FilterCriteria, parse_date_entry, visible_set};
use crate::input::LineEditor;
use crate::source::{FetchError, VideoSource};
use crate::theme::{Theme, theme_for};
use crate::video::{PageResult, Video};
use crate::view::{ViewMode, ViewState};

// --- Types ---

pub type PageReply = (FetchTicket, Result<PageResult, FetchError>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  /// Navigating the results.
  Browse,
  /// Typing into the search box; the results narrow on every keystroke.
  Search,
  StartDate,
  EndDate,
  /// Picking channels from the channel index.
  Channels,
}

/// The one page request that may be in flight.
pub(crate) struct PendingPage {
  ticket: FetchTicket,
  rx: oneshot::Receiver<PageReply>,
}

pub struct App<S: VideoSource + 'static> {
  source: Arc<S>,
  pub feed: Feed,
  pub criteria: FilterCriteria,
  pub view: ViewState<Box<dyn PrefStore + Send>>,
  pub mode: AppMode,
  /// Selection within the visible set (used by both layouts).
  pub list_state: ListState,
  /// Selection within the channel index while picking channels.
  pub channel_state: ListState,
  /// First grid row on screen; adjusted while rendering to keep the selection visible.
  pub grid_offset: usize,
  pub search_input: LineEditor,
  pub date_input: LineEditor,
  pub last_error: Option<String>,
  pub info_message: Option<String>,
  pub should_quit: bool,
  pending: Option<PendingPage>,
  /// When the last error was set; used for auto-dismiss after 5 seconds.
  error_time: Option<Instant>,
}

impl<S: VideoSource + 'static> App<S> {
  pub fn new(source: Arc<S>, prefs: Box<dyn PrefStore + Send>) -> Self {
    Self {
      source,
      feed: Feed::new(),
      criteria: FilterCriteria::new(),
      view: ViewState::load(prefs),
      mode: AppMode::Browse,
      list_state: ListState::default(),
      channel_state: ListState::default(),
      grid_offset: 0,
      search_input: LineEditor::default(),
      date_input: LineEditor::default(),
      last_error: None,
      info_message: None,
      should_quit: false,
      pending: None,
      error_time: None,
    }
  }

  pub fn theme(&self) -> &'static Theme {
    theme_for(self.view.scheme())
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages after 5 seconds.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(5)
    {
      self.clear_error();
    }
  }

  // --- Derived views ---

  pub fn visible(&self) -> Vec<&Video> {
    visible_set(self.feed.videos(), &self.criteria)
  }

  pub fn channels(&self) -> Vec<String> {
    channel_index(self.feed.videos())
  }

  pub fn selected_video(&self) -> Option<&Video> {
    let idx = self.list_state.selected()?;
    self.visible().get(idx).copied()
  }

  /// Keep the selection inside the visible set after it shrinks or grows.
  pub fn clamp_selection(&mut self) {
    let count = self.visible().len();
    if count == 0 {
      self.list_state.select(None);
    } else {
      let sel = self.list_state.selected().unwrap_or(0);
      self.list_state.select(Some(sel.min(count - 1)));
    }
  }

  // --- Paging ---

  /// Request the next page on a background task, unless one is already running or the
  /// listing is exhausted.
  pub fn trigger_load_more(&mut self) {
    if !self.feed.can_load_more() {
      debug!(loading = self.feed.is_loading(), has_more = self.feed.has_more(), "load more: nothing to do");
      return;
    }
    let Some(ticket) = self.feed.begin_load() else { return };
    self.info_message = None;

    let source = Arc::clone(&self.source);
    let task_ticket = ticket.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let result = source.fetch_page(task_ticket.cursor()).await;
      let _ = tx.send((task_ticket, result));
    });
    self.pending = Some(PendingPage { ticket, rx });
  }

  /// Throw away everything fetched and start again from the first page.
  pub fn reload(&mut self) {
    info!("reload requested");
    self.pending = None;
    self.feed.reset();
    self.list_state.select(None);
    self.channel_state.select(None);
    self.grid_offset = 0;
    self.clear_error();
    self.trigger_load_more();
  }

  /// Apply a finished page request, if there is one. Called once per frame.
  pub fn check_pending(&mut self) {
    let Some(mut pending) = self.pending.take() else { return };
    let highlighted = self.highlighted_channel();
    let outcome = match pending.rx.try_recv() {
      Ok((ticket, result)) => self.feed.complete(ticket, result),
      Err(oneshot::error::TryRecvError::Empty) => {
        self.pending = Some(pending);
        return;
      }
      Err(oneshot::error::TryRecvError::Closed) => {
        warn!("page task ended without a result");
        self.feed.complete(pending.ticket, Err(FetchError::Transport("page request was aborted".to_string())))
      }
    };

    match outcome {
      LoadOutcome::Appended(added) => {
        // New channels can sort ahead of the highlighted one; follow it by name.
        if let Some(name) = highlighted
          && let Some(pos) = self.channels().iter().position(|c| *c == name)
        {
          self.channel_state.select(Some(pos));
        }
        if self.list_state.selected().is_none() {
          self.list_state.select(Some(0));
        }
        self.clamp_selection();
        if added == 0 && self.feed.videos().is_empty() {
          self.info_message = Some("No videos found.".to_string());
        } else if !self.feed.has_more() {
          self.info_message = Some(format!("All {} videos loaded.", self.feed.videos().len()));
        }
      }
      LoadOutcome::Failed(e) => {
        self.set_error(format!("Failed to fetch videos: {}", e));
      }
      LoadOutcome::AlreadyLoading | LoadOutcome::Stale => {}
    }
  }

  // --- Filters ---

  pub fn begin_search(&mut self) {
    self.search_input = LineEditor::from_text(self.criteria.search());
    self.mode = AppMode::Search;
  }

  /// Push the search box contents into the criteria.
  pub fn sync_search(&mut self) {
    self.criteria.set_search(self.search_input.text());
    self.clamp_selection();
  }

  pub fn begin_date_entry(&mut self, mode: AppMode) {
    let current = match mode {
      AppMode::StartDate => self.criteria.start(),
      AppMode::EndDate => self.criteria.end(),
      _ => return,
    };
    let text = current.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
    self.date_input = LineEditor::from_text(&text);
    self.mode = mode;
  }

  /// Parse the date box and apply it to the bound being edited.
  /// An unparsable entry keeps the current bound and stays in date entry.
  pub fn commit_date_entry(&mut self) {
    match parse_date_entry(self.date_input.text()) {
      Ok(date) => {
        match self.mode {
          AppMode::StartDate => self.criteria.set_start(date),
          AppMode::EndDate => self.criteria.set_end(date),
          _ => return,
        }
        self.clear_error();
        self.clamp_selection();
        self.mode = AppMode::Browse;
      }
      Err(e) => {
        debug!(input = self.date_input.text(), err = %e, "rejected date entry");
        self.set_error(format!("Invalid date '{}': use YYYY-MM-DD", self.date_input.text().trim()));
      }
    }
  }

  pub fn begin_channel_pick(&mut self) {
    if self.channels().is_empty() {
      self.set_error("No channels to filter by yet.".to_string());
      return;
    }
    if self.channel_state.selected().is_none() {
      self.channel_state.select(Some(0));
    }
    self.mode = AppMode::Channels;
  }

  /// The channel under the picker's cursor.
  pub fn highlighted_channel(&self) -> Option<String> {
    let idx = self.channel_state.selected()?;
    self.channels().get(idx).cloned()
  }

  pub fn toggle_selected_channel(&mut self) {
    let Some(channel) = self.highlighted_channel() else { return };
    self.criteria.toggle_channel(&channel);
    self.clamp_selection();
  }

  pub fn clear_filters(&mut self) {
    self.criteria.clear();
    self.search_input = LineEditor::default();
    self.date_input = LineEditor::default();
    self.clamp_selection();
  }

  // --- View ---

  pub fn toggle_view_mode(&mut self) {
    self.view.toggle_mode();
  }

  pub fn toggle_color_scheme(&mut self) {
    self.view.toggle_scheme();
  }

  /// Columns per row in the current layout.
  pub fn columns(&self) -> usize {
    match self.view.mode() {
      ViewMode::Grid => constants().grid_columns.max(1),
      ViewMode::List => 1,
    }
  }

  /// Move the selection by `delta` items, prefetching when it reaches the last one.
  pub fn move_selection(&mut self, delta: isize) {
    let count = self.visible().len();
    if count == 0 {
      return;
    }
    let current = self.list_state.selected().unwrap_or(0) as isize;
    let next = (current + delta).clamp(0, count as isize - 1) as usize;
    self.list_state.select(Some(next));
    if next + 1 == count {
      self.trigger_load_more();
    }
  }

  pub fn move_channel_selection(&mut self, delta: isize) {
    let count = self.channels().len();
    if count == 0 {
      return;
    }
    let current = self.channel_state.selected().unwrap_or(0) as isize;
    let next = (current + delta).rem_euclid(count as isize) as usize;
    self.channel_state.select(Some(next));
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::MemoryPrefs;
  use crate::feed::tests::{ScriptedSource, video};
  use chrono::NaiveDate;

  fn page(videos: Vec<Video>, next: Option<&str>, has_more: bool) -> PageResult {
    PageResult { videos, next_cursor: next.map(str::to_string), has_more }
  }

  fn app(responses: Vec<Result<PageResult, FetchError>>) -> App<ScriptedSource> {
    App::new(Arc::new(ScriptedSource::new(responses)), Box::new(MemoryPrefs::default()))
  }

  /// Let the spawned page task run, then apply its result.
  async fn settle(app: &mut App<ScriptedSource>) {
    for _ in 0..100 {
      app.check_pending();
      if !app.feed.is_loading() {
        return;
      }
      tokio::task::yield_now().await;
    }
    panic!("page request never completed");
  }

  #[tokio::test]
  async fn first_page_selects_first_video() {
    let mut app = app(vec![Ok(page(vec![video("a", "Acme"), video("b", "Beta")], Some("c1"), true))]);
    app.trigger_load_more();
    assert!(app.feed.is_loading());
    settle(&mut app).await;

    assert_eq!(app.feed.videos().len(), 2);
    assert_eq!(app.list_state.selected(), Some(0));
    assert_eq!(app.selected_video().map(|v| v.id.as_str()), Some("a"));
    assert_eq!(app.channels(), vec!["Acme", "Beta"]);
  }

  #[tokio::test]
  async fn repeated_triggers_issue_one_request() {
    let source = Arc::new(ScriptedSource::new(vec![Ok(page(vec![video("a", "Acme")], Some("c1"), true))]));
    let mut app = App::new(Arc::clone(&source), Box::new(MemoryPrefs::default()));
    app.trigger_load_more();
    app.trigger_load_more();
    app.trigger_load_more();
    settle(&mut app).await;
    assert_eq!(source.requested(), vec![None]);
    assert_eq!(app.feed.videos().len(), 1);
  }

  #[tokio::test]
  async fn failed_page_surfaces_error_and_keeps_videos() {
    let mut app = app(vec![Ok(page(vec![video("a", "Acme")], Some("c1"), true)), Err(FetchError::Status(500))]);
    app.trigger_load_more();
    settle(&mut app).await;
    app.trigger_load_more();
    settle(&mut app).await;

    assert_eq!(app.feed.videos().len(), 1);
    assert_eq!(app.feed.cursor(), Some("c1"));
    assert!(app.last_error.as_deref().is_some_and(|e| e.contains("HTTP 500")));
  }

  #[tokio::test]
  async fn exhausted_listing_does_not_request_again() {
    let source = Arc::new(ScriptedSource::new(vec![Ok(page(vec![video("a", "Acme")], None, false))]));
    let mut app = App::new(Arc::clone(&source), Box::new(MemoryPrefs::default()));
    app.trigger_load_more();
    settle(&mut app).await;
    app.trigger_load_more();
    assert!(!app.feed.is_loading());
    assert_eq!(source.requested().len(), 1);
    assert_eq!(app.info_message.as_deref(), Some("All 1 videos loaded."));
  }

  #[tokio::test]
  async fn reload_starts_from_first_page() {
    let source = Arc::new(ScriptedSource::new(vec![
      Ok(page(vec![video("a", "Acme")], Some("c1"), true)),
      Ok(page(vec![video("z", "Zed")], Some("c9"), true)),
    ]));
    let mut app = App::new(Arc::clone(&source), Box::new(MemoryPrefs::default()));
    app.trigger_load_more();
    settle(&mut app).await;
    app.reload();
    settle(&mut app).await;

    assert_eq!(source.requested(), vec![None, None]);
    assert_eq!(app.feed.videos().iter().map(|v| v.id.as_str()).collect::<Vec<_>>(), vec!["z"]);
  }

  #[tokio::test]
  async fn filtering_clamps_selection() {
    let mut app = app(vec![Ok(page(vec![video("a", "Acme"), video("b", "Beta"), video("c", "Beta")], None, false))]);
    app.trigger_load_more();
    settle(&mut app).await;
    app.list_state.select(Some(2));

    app.criteria.toggle_channel("Acme");
    app.clamp_selection();
    assert_eq!(app.list_state.selected(), Some(0));

    app.criteria.toggle_channel("Acme");
    app.criteria.set_search("no such video");
    app.clamp_selection();
    assert_eq!(app.list_state.selected(), None);
    assert!(app.selected_video().is_none());
  }

  #[test]
  fn date_entry_applies_or_rejects() {
    let mut app = app(vec![]);
    app.begin_date_entry(AppMode::StartDate);
    app.date_input = LineEditor::from_text("2024-01-01");
    app.commit_date_entry();
    assert_eq!(app.criteria.start(), NaiveDate::from_ymd_opt(2024, 1, 1));
    assert_eq!(app.mode, AppMode::Browse);

    app.begin_date_entry(AppMode::EndDate);
    app.date_input = LineEditor::from_text("June");
    app.commit_date_entry();
    assert_eq!(app.criteria.end(), None);
    assert_eq!(app.mode, AppMode::EndDate);
    assert!(app.last_error.is_some());

    app.begin_date_entry(AppMode::StartDate);
    assert_eq!(app.date_input.text(), "2024-01-01");
    app.date_input = LineEditor::from_text("");
    app.commit_date_entry();
    assert_eq!(app.criteria.start(), None);
  }

  #[test]
  fn clear_filters_resets_inputs() {
    let mut app = app(vec![]);
    app.begin_search();
    app.search_input = LineEditor::from_text("rust");
    app.sync_search();
    app.criteria.toggle_channel("Acme");
    app.clear_filters();
    assert!(!app.criteria.is_active());
    assert_eq!(app.search_input.text(), "");
  }

  #[test]
  fn view_toggles_persist_through_store() {
    let mut app = app(vec![]);
    assert_eq!(app.view.mode(), ViewMode::Grid);
    assert_eq!(app.columns(), constants().grid_columns);
    app.toggle_view_mode();
    assert_eq!(app.view.mode(), ViewMode::List);
    assert_eq!(app.columns(), 1);
    app.toggle_color_scheme();
    assert_eq!(app.theme().name, "light");
  }

  #[tokio::test]
  async fn channel_highlight_follows_name_across_pages() {
    let mut app = app(vec![
      Ok(page(vec![video("a", "Beta"), video("b", "Zed")], Some("c1"), true)),
      Ok(page(vec![video("c", "Acme")], None, false)),
    ]);
    app.trigger_load_more();
    settle(&mut app).await;
    app.begin_channel_pick();
    app.move_channel_selection(1);
    assert_eq!(app.highlighted_channel().as_deref(), Some("Zed"));

    app.trigger_load_more();
    settle(&mut app).await;
    assert_eq!(app.channels(), vec!["Acme", "Beta", "Zed"]);
    assert_eq!(app.highlighted_channel().as_deref(), Some("Zed"));
    app.toggle_selected_channel();
    assert!(app.criteria.is_channel_selected("Zed"));
  }

  #[test]
  fn channel_pick_needs_channels() {
    let mut app = app(vec![]);
    app.begin_channel_pick();
    assert_eq!(app.mode, AppMode::Browse);
    assert!(app.last_error.is_some());
  }
}
