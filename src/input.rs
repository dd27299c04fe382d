use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

use crate::app::{App, AppMode};
use crate::source::VideoSource;

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

/// A single-line text box: contents, cursor (char index) and horizontal scroll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineEditor {
  text: String,
  cursor: usize,
  pub scroll: usize,
}

impl LineEditor {
  pub fn from_text(text: &str) -> Self {
    Self { text: text.to_string(), cursor: text.chars().count(), scroll: 0 }
  }

  pub fn text(&self) -> &str {
    &self.text
  }

  pub fn cursor(&self) -> usize {
    self.cursor
  }

  /// Apply an editing key. Returns true when the text changed.
  pub fn handle_key(&mut self, code: KeyCode) -> bool {
    match code {
      KeyCode::Char(c) => {
        let byte_idx = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_idx, c);
        self.cursor += 1;
        true
      }
      KeyCode::Backspace => {
        if self.cursor > 0 {
          self.cursor -= 1;
          let byte_idx = char_to_byte_index(&self.text, self.cursor);
          self.text.remove(byte_idx);
          true
        } else {
          false
        }
      }
      KeyCode::Delete => {
        if self.cursor < self.text.chars().count() {
          let byte_idx = char_to_byte_index(&self.text, self.cursor);
          self.text.remove(byte_idx);
          true
        } else {
          false
        }
      }
      KeyCode::Left => {
        self.cursor = self.cursor.saturating_sub(1);
        false
      }
      KeyCode::Right => {
        if self.cursor < self.text.chars().count() {
          self.cursor += 1;
        }
        false
      }
      KeyCode::Home => {
        self.cursor = 0;
        false
      }
      KeyCode::End => {
        self.cursor = self.text.chars().count();
        false
      }
      _ => false,
    }
  }
}

// --- Event Handling ---

pub fn handle_key_event<S: VideoSource + 'static>(app: &mut App<S>, key: event::KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) {
    match key.code {
      KeyCode::Char('c') => app.should_quit = true,
      KeyCode::Char('t') => app.toggle_color_scheme(),
      KeyCode::Char('r') => app.reload(),
      _ => {}
    }
    return;
  }

  match app.mode {
    AppMode::Browse => handle_browse_key(app, key),
    AppMode::Search => handle_search_key(app, key),
    AppMode::StartDate | AppMode::EndDate => handle_date_key(app, key),
    AppMode::Channels => handle_channel_key(app, key),
  }
}

fn handle_browse_key<S: VideoSource + 'static>(app: &mut App<S>, key: event::KeyEvent) {
  let columns = app.columns() as isize;
  match key.code {
    KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
    KeyCode::Char('/') => app.begin_search(),
    KeyCode::Char('s') => app.begin_date_entry(AppMode::StartDate),
    KeyCode::Char('e') => app.begin_date_entry(AppMode::EndDate),
    KeyCode::Char('c') => app.begin_channel_pick(),
    KeyCode::Char('x') => app.clear_filters(),
    KeyCode::Char('m') => app.trigger_load_more(),
    KeyCode::Char('v') => app.toggle_view_mode(),
    KeyCode::Char('o') | KeyCode::Enter => open_selected(app),
    KeyCode::Down | KeyCode::Char('j') => app.move_selection(columns),
    KeyCode::Up | KeyCode::Char('k') => app.move_selection(-columns),
    KeyCode::Right | KeyCode::Char('l') if columns > 1 => app.move_selection(1),
    KeyCode::Left | KeyCode::Char('h') if columns > 1 => app.move_selection(-1),
    KeyCode::PageDown => app.move_selection(columns * 3),
    KeyCode::PageUp => app.move_selection(-columns * 3),
    KeyCode::Home | KeyCode::Char('g') => app.move_selection(isize::MIN / 2),
    KeyCode::End | KeyCode::Char('G') => app.move_selection(isize::MAX / 2),
    _ => {}
  }
}

/// Open the selected video's page in the default browser.
fn open_selected<S: VideoSource + 'static>(app: &mut App<S>) {
  let Some(url) = app.selected_video().map(|v| v.watch_url()) else { return };
  #[cfg(target_os = "macos")]
  let cmd = "open";
  #[cfg(not(target_os = "macos"))]
  let cmd = "xdg-open";
  match std::process::Command::new(cmd)
    .arg(&url)
    .stdin(std::process::Stdio::null())
    .stdout(std::process::Stdio::null())
    .stderr(std::process::Stdio::null())
    .spawn()
  {
    Ok(mut child) => {
      // Reap the child in a background thread to avoid zombie processes.
      std::thread::spawn(move || {
        let _ = child.wait();
      });
    }
    Err(e) => {
      app.set_error(format!("Failed to open browser: {}", e));
    }
  }
}

fn handle_search_key<S: VideoSource + 'static>(app: &mut App<S>, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter | KeyCode::Down => {
      app.mode = AppMode::Browse;
    }
    KeyCode::Esc => {
      // Drop the search text and go back to browsing.
      app.search_input = Default::default();
      app.sync_search();
      app.mode = AppMode::Browse;
    }
    code => {
      if app.search_input.handle_key(code) {
        app.sync_search();
      }
    }
  }
}

fn handle_date_key<S: VideoSource + 'static>(app: &mut App<S>, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter => app.commit_date_entry(),
    KeyCode::Esc => {
      app.clear_error();
      app.mode = AppMode::Browse;
    }
    code => {
      // Only characters that can appear in YYYY-MM-DD.
      if matches!(code, KeyCode::Char(c) if !(c.is_ascii_digit() || c == '-')) {
        return;
      }
      app.date_input.handle_key(code);
    }
  }
}

fn handle_channel_key<S: VideoSource + 'static>(app: &mut App<S>, key: event::KeyEvent) {
  match key.code {
    KeyCode::Down | KeyCode::Char('j') => app.move_channel_selection(1),
    KeyCode::Up | KeyCode::Char('k') => app.move_channel_selection(-1),
    KeyCode::Char(' ') | KeyCode::Enter => app.toggle_selected_channel(),
    KeyCode::Char('x') => app.clear_filters(),
    KeyCode::Esc | KeyCode::Char('c') | KeyCode::Char('q') => app.mode = AppMode::Browse,
    _ => {}
  }
}
