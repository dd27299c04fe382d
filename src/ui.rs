use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span, Text},
  widgets::{Block, BorderType, List, ListItem, Padding, Paragraph},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::{App, AppMode};
use crate::constants::constants;
use crate::feed::FetchStatus;
use crate::input::LineEditor;
use crate::source::VideoSource;
use crate::theme::Theme;
use crate::video::Video;
use crate::view::ViewMode;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` display columns, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.width() <= max_width {
    return s.to_string();
  }
  let mut out = String::new();
  let mut used = 0;
  for c in s.chars() {
    let w = c.width().unwrap_or(0);
    if used + w + 1 > max_width {
      break;
    }
    out.push(c);
    used += w;
  }
  out.push('…');
  out
}

/// Break `s` into at most `max_lines` lines of `width` columns, the last one truncated.
fn wrap_lines(s: &str, width: usize, max_lines: usize) -> Vec<String> {
  let flat: String = s.split_whitespace().collect::<Vec<_>>().join(" ");
  let mut lines = Vec::new();
  let mut rest = flat.as_str();
  while !rest.is_empty() && lines.len() < max_lines {
    if lines.len() + 1 == max_lines {
      lines.push(truncate_str(rest, width));
      break;
    }
    let mut used = 0;
    let mut split = rest.len();
    for (i, c) in rest.char_indices() {
      let w = c.width().unwrap_or(0);
      if used + w > width {
        split = i;
        break;
      }
      used += w;
    }
    let (head, tail) = rest.split_at(split);
    lines.push(head.to_string());
    rest = tail.trim_start();
  }
  lines
}

/// The slice of an editor's text that fits in `width` columns, scrolled so the cursor
/// stays visible, plus the cursor column relative to that slice.
fn visible_text(editor: &mut LineEditor, width: usize) -> (String, usize) {
  let width = width.max(1);
  let cursor_col = display_width(editor.text(), editor.cursor());
  if cursor_col < editor.scroll {
    editor.scroll = cursor_col;
  } else if cursor_col >= editor.scroll + width {
    editor.scroll = cursor_col.saturating_sub(width) + 1;
  }
  let scroll = editor.scroll;
  let visible = editor
    .text()
    .chars()
    .scan(0usize, |col, c| {
      let w = c.width().unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= scroll)
    .take_while(|(start, _, _)| *start < scroll + width)
    .map(|(_, _, c)| c)
    .collect();
  (visible, cursor_col - scroll)
}

fn rounded_block(theme: &Theme) -> Block<'static> {
  Block::bordered().border_type(BorderType::Rounded).border_style(Style::default().fg(theme.border))
}

// --- UI Rendering ---

pub fn ui<S: VideoSource + 'static>(frame: &mut Frame, app: &mut App<S>) {
  let theme = app.theme();
  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, filter_area, main_area, status_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Length(5),
    Constraint::Min(3),
    Constraint::Length(1),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, app, header_area);
  render_filters(frame, app, filter_area);
  if app.mode == AppMode::Channels {
    let [results_area, picker_area] =
      Layout::horizontal([Constraint::Percentage(68), Constraint::Percentage(32)]).areas(main_area);
    render_results(frame, app, results_area);
    render_channel_picker(frame, app, picker_area);
  } else {
    render_results(frame, app, main_area);
  }
  render_status(frame, app, status_area);
  render_footer(frame, app, footer_area);
}

fn render_header<S: VideoSource + 'static>(frame: &mut Frame, app: &App<S>, area: Rect) {
  let theme = app.theme();
  let left = Line::from(vec![
    Span::styled(" ▶ ytdash ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
    Span::styled(" Video Dashboard", Style::default().fg(theme.muted)),
  ]);
  frame.render_widget(left, area);

  let right_text = format!("{} · {} · v{} ", app.view.mode().label(), theme.name, env!("CARGO_PKG_VERSION"));
  let right_w = right_text.width() as u16;
  let right = Line::from(Span::styled(right_text, Style::default().fg(theme.muted)));
  let right_area = Rect { x: area.x + area.width.saturating_sub(right_w), width: right_w.min(area.width), ..area };
  frame.render_widget(right, right_area);
}

fn render_filters<S: VideoSource + 'static>(frame: &mut Frame, app: &mut App<S>, area: Rect) {
  let theme = app.theme();
  let editing = matches!(app.mode, AppMode::Search | AppMode::StartDate | AppMode::EndDate);
  let border_color = if editing || app.mode == AppMode::Channels { theme.accent } else { theme.border };
  let block = Block::bordered()
    .title(" Filters ")
    .title_style(Style::default().fg(border_color).add_modifier(Modifier::BOLD))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .style(Style::default().bg(theme.panel_bg))
    .padding(Padding::horizontal(1));
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let [search_row, date_row, channel_row] =
    Layout::vertical([Constraint::Length(1), Constraint::Length(1), Constraint::Length(1)]).areas(inner);

  let label_style = Style::default().fg(theme.muted);
  let value_style = Style::default().fg(theme.fg);
  let active_style = Style::default().fg(theme.accent).add_modifier(Modifier::BOLD);

  // Search row
  let search_label = "Search  ";
  let search_w = (search_row.width as usize).saturating_sub(search_label.len());
  let (search_text, search_cursor) = if app.mode == AppMode::Search {
    visible_text(&mut app.search_input, search_w)
  } else {
    let text = app.criteria.search();
    let shown = if text.is_empty() { "title or description…".to_string() } else { truncate_str(text, search_w) };
    (shown, 0)
  };
  let search_value_style = if app.mode == AppMode::Search {
    active_style
  } else if app.criteria.search().is_empty() {
    label_style
  } else {
    value_style
  };
  frame.render_widget(
    Line::from(vec![Span::styled(search_label, label_style), Span::styled(search_text, search_value_style)]),
    search_row,
  );
  if app.mode == AppMode::Search {
    frame.set_cursor_position((search_row.x + (search_label.len() + search_cursor) as u16, search_row.y));
  }

  // Date row
  let fmt_date = |d: Option<chrono::NaiveDate>| d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or("any".into());
  let start_label = "Start   ";
  let end_label = "   End  ";
  let mut start_value = fmt_date(app.criteria.start());
  let mut end_value = fmt_date(app.criteria.end());
  let mut cursor = None;
  match app.mode {
    AppMode::StartDate => {
      let (text, col) = visible_text(&mut app.date_input, 11);
      start_value = format!("{:<11}", text);
      cursor = Some(start_label.len() + col);
    }
    AppMode::EndDate => {
      let (text, col) = visible_text(&mut app.date_input, 11);
      end_value = format!("{:<11}", text);
      cursor = Some(start_label.len() + 11 + end_label.len() + col);
    }
    _ => {}
  }
  let start_style = if app.mode == AppMode::StartDate { active_style } else { value_style };
  let end_style = if app.mode == AppMode::EndDate { active_style } else { value_style };
  frame.render_widget(
    Line::from(vec![
      Span::styled(start_label, label_style),
      Span::styled(format!("{:<11}", start_value), start_style),
      Span::styled(end_label, label_style),
      Span::styled(format!("{:<11}", end_value), end_style),
    ]),
    date_row,
  );
  if let Some(col) = cursor {
    frame.set_cursor_position((date_row.x + col as u16, date_row.y));
  }

  // Channel row: selected channels as chips
  let mut spans = vec![Span::styled("Channel ", label_style)];
  if app.criteria.channels().is_empty() {
    spans.push(Span::styled("all", value_style));
  } else {
    for (i, channel) in app.criteria.channels().iter().enumerate() {
      if i > 0 {
        spans.push(Span::raw(" "));
      }
      spans.push(Span::styled(format!(" {} ", channel), Style::default().fg(theme.highlight_fg).bg(theme.accent)));
    }
  }
  frame.render_widget(Line::from(spans), channel_row);
}

fn results_title<S: VideoSource + 'static>(app: &App<S>, shown: usize) -> String {
  let total = app.feed.videos().len();
  let count = if app.criteria.is_active() {
    format!("{} of {} videos", shown, total)
  } else {
    format!("{} videos", total)
  };
  let suffix = match app.feed.status() {
    FetchStatus::Loading => " (loading…)",
    _ if app.feed.has_more() => " (more available)",
    _ => "",
  };
  format!(" Videos — {}{} ", count, suffix)
}

fn render_results<S: VideoSource + 'static>(frame: &mut Frame, app: &mut App<S>, area: Rect) {
  let theme = app.theme();
  let shown = app.visible().len();
  let block = rounded_block(theme)
    .title(results_title(app, shown))
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD));

  if shown == 0 {
    let message = if app.feed.is_loading() {
      "Loading videos…"
    } else if app.feed.videos().is_empty() {
      "No videos yet. Press m to load, Ctrl+R to reload."
    } else {
      "No videos match the current filters. Press x to clear them."
    };
    let paragraph = Paragraph::new(Line::from(Span::styled(message, Style::default().fg(theme.muted))))
      .alignment(Alignment::Center)
      .block(block);
    frame.render_widget(paragraph, area);
    return;
  }

  match app.view.mode() {
    ViewMode::Grid => render_grid(frame, app, area, block),
    ViewMode::List => render_list(frame, app, area, block),
  }
}

fn card_lines(video: &Video, width: usize, theme: &Theme, selected: bool) -> Vec<Line<'static>> {
  let title_style = if selected {
    Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
  } else {
    Style::default().fg(theme.fg).add_modifier(Modifier::BOLD)
  };
  let muted = Style::default().fg(theme.muted);
  let mut lines = vec![Line::from(Span::styled(truncate_str(&video.title, width), title_style))];
  let mut description = wrap_lines(&video.description, width, 2);
  description.resize(2, String::new());
  lines.extend(description.into_iter().map(|l| Line::from(Span::styled(l, muted))));
  lines.push(Line::from(Span::styled(truncate_str(&format!("Published: {}", video.published_label()), width), muted)));
  lines.push(Line::from(Span::styled(truncate_str(&format!("Channel: {}", video.channel), width), muted)));
  let thumb = if video.thumbnail.is_empty() { String::new() } else { format!("Thumbnail: {}", video.thumbnail) };
  lines.push(Line::from(Span::styled(truncate_str(&thumb, width), muted)));
  lines
}

fn render_grid<S: VideoSource + 'static>(frame: &mut Frame, app: &mut App<S>, area: Rect, block: Block<'static>) {
  let theme = app.theme();
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let columns = app.columns();
  let card_h = constants().grid_card_height.max(3);
  let rows_on_screen = ((inner.height / card_h) as usize).max(1);
  let selected = app.list_state.selected().unwrap_or(0);
  let selected_row = selected / columns;

  if selected_row < app.grid_offset {
    app.grid_offset = selected_row;
  } else if selected_row >= app.grid_offset + rows_on_screen {
    app.grid_offset = selected_row + 1 - rows_on_screen;
  }

  let visible = app.visible();
  let col_constraints = vec![Constraint::Ratio(1, columns as u32); columns];
  for row in 0..rows_on_screen {
    let first = (app.grid_offset + row) * columns;
    if first >= visible.len() {
      break;
    }
    let row_area = Rect { y: inner.y + row as u16 * card_h, height: card_h, ..inner }.intersection(inner);
    let cells = Layout::horizontal(col_constraints.clone()).split(row_area);
    for (col, cell) in cells.iter().enumerate() {
      let idx = first + col;
      let Some(video) = visible.get(idx) else { break };
      let is_selected = idx == selected;
      let border = if is_selected { theme.accent } else { theme.border };
      let card = Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(theme.panel_bg))
        .padding(Padding::horizontal(1));
      let width = cell.width.saturating_sub(4) as usize;
      let paragraph = Paragraph::new(card_lines(video, width, theme, is_selected)).block(card);
      frame.render_widget(paragraph, *cell);
    }
  }
}

fn render_list<S: VideoSource + 'static>(frame: &mut Frame, app: &mut App<S>, area: Rect, block: Block<'static>) {
  let theme = app.theme();
  // Inner width: area minus 2 borders minus 2 chars for highlight symbol ("▶ ")
  let inner_w = (area.width.saturating_sub(4) as usize).min(constants().list_description_width.max(20));
  let selected = app.list_state.selected();

  let items: Vec<ListItem> = app
    .visible()
    .iter()
    .enumerate()
    .map(|(i, video)| {
      let is_selected = Some(i) == selected;
      let bg = if is_selected {
        theme.highlight_bg
      } else if i % 2 == 1 {
        theme.stripe_bg
      } else {
        theme.bg
      };
      let fg = if is_selected { theme.highlight_fg } else { theme.fg };
      let meta_fg = if is_selected { theme.highlight_fg } else { theme.muted };

      let channel = match &video.channel_id {
        Some(id) if !id.is_empty() => format!("{} ({})", video.channel, id),
        _ => video.channel.clone(),
      };
      let meta = format!("{}  ·  {}", video.published_label(), channel);
      let description = if video.description.is_empty() { String::new() } else { truncate_str(&video.description, inner_w) };
      let mut lines = vec![
        Line::from(Span::styled(truncate_str(&video.title, inner_w), Style::default().fg(fg).add_modifier(Modifier::BOLD))),
        Line::from(Span::styled(description, Style::default().fg(meta_fg))),
        Line::from(Span::styled(truncate_str(&meta, inner_w), Style::default().fg(meta_fg))),
      ];
      // The selected row also shows where its thumbnail lives.
      if is_selected && !video.thumbnail.is_empty() {
        let thumb = format!("Thumbnail: {}", video.thumbnail);
        lines.push(Line::from(Span::styled(truncate_str(&thumb, inner_w), Style::default().fg(meta_fg))));
      }
      ListItem::new(Text::from(lines)).bg(bg)
    })
    .collect();

  let list = List::new(items)
    .block(block)
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));

  frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_channel_picker<S: VideoSource + 'static>(frame: &mut Frame, app: &mut App<S>, area: Rect) {
  let theme = app.theme();
  let inner_w = area.width.saturating_sub(8) as usize;
  let items: Vec<ListItem> = app
    .channels()
    .iter()
    .map(|channel| {
      let picked = app.criteria.is_channel_selected(channel);
      let mark = if picked { "[x] " } else { "[ ] " };
      let style = if picked { Style::default().fg(theme.accent).add_modifier(Modifier::BOLD) } else { Style::default().fg(theme.fg) };
      ListItem::new(Line::from(vec![Span::styled(mark, style), Span::styled(truncate_str(channel, inner_w), style)]))
    })
    .collect();

  let list = List::new(items)
    .block(
      Block::bordered()
        .title(" Filter by Channel ")
        .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.accent)),
    )
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg));

  frame.render_stateful_widget(list, area, &mut app.channel_state);
}

fn render_status<S: VideoSource + 'static>(frame: &mut Frame, app: &App<S>, area: Rect) {
  let theme = app.theme();
  let (text, style) = if app.feed.is_loading() {
    (" ⏳ Loading videos…".to_string(), Style::default().fg(theme.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if app.feed.status() == FetchStatus::Failed {
    let reason = app.feed.last_error().unwrap_or("unknown error");
    (format!(" ⚠  Failed to fetch videos ({}). Press m to retry.", reason), Style::default().fg(theme.error))
  } else if let Some(info) = &app.info_message {
    (format!(" ℹ  {}", info), Style::default().fg(theme.muted))
  } else if app.feed.has_more() {
    (format!(" {} pages loaded · m to load more", app.feed.page_count()), Style::default().fg(theme.muted))
  } else {
    (" Ready".to_string(), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_footer<S: VideoSource + 'static>(frame: &mut Frame, app: &App<S>, area: Rect) {
  let theme = app.theme();
  let keys: Vec<(&str, &str)> = match app.mode {
    AppMode::Browse => {
      let mut k = vec![("/", "Search"), ("s/e", "Dates"), ("c", "Channels")];
      if app.list_state.selected().is_some() {
        k.push(("o", "Open"));
      }
      if app.criteria.is_active() {
        k.push(("x", "Clear"));
      }
      if app.feed.can_load_more() {
        k.push(("m", "More"));
      }
      let view_label = match app.view.mode() {
        ViewMode::Grid => "List",
        ViewMode::List => "Grid",
      };
      k.push(("v", view_label));
      k.push(("^t", "Theme"));
      k.push(("^r", "Reload"));
      k.push(("q", "Quit"));
      k
    }
    AppMode::Search => vec![("Enter", "Apply"), ("Esc", "Clear")],
    AppMode::StartDate | AppMode::EndDate => vec![("Enter", "Apply"), ("YYYY-MM-DD", "empty = any"), ("Esc", "Cancel")],
    AppMode::Channels => vec![("Space", "Toggle"), ("j/k", "Navigate"), ("x", "Clear"), ("Esc", "Done")],
  };

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::MemoryPrefs;
  use crate::feed::tests::{ScriptedSource, video};
  use crate::video::PageResult;
  use ratatui::{Terminal, backend::TestBackend};
  use std::sync::Arc;

  // --- helpers ---

  #[test]
  fn truncate_keeps_short_strings() {
    assert_eq!(truncate_str("hello", 10), "hello");
    assert_eq!(truncate_str("hello", 5), "hello");
  }

  #[test]
  fn truncate_adds_ellipsis() {
    assert_eq!(truncate_str("hello world", 6), "hello…");
    assert_eq!(truncate_str("日本語テキスト", 5), "日本…");
  }

  #[test]
  fn wrap_lines_splits_and_truncates() {
    assert_eq!(wrap_lines("one two three", 20, 2), vec!["one two three"]);
    assert_eq!(wrap_lines("aaaa bbbb cccc dddd", 9, 2), vec!["aaaa bbbb", "cccc dddd"]);
    assert_eq!(wrap_lines("aaaa bbbb cccc dddd eeee", 9, 2), vec!["aaaa bbbb", "cccc ddd…"]);
    assert!(wrap_lines("", 10, 2).is_empty());
  }

  #[test]
  fn visible_text_scrolls_to_cursor() {
    let mut ed = LineEditor::from_text("abcdefghij");
    let (text, col) = visible_text(&mut ed, 5);
    assert_eq!(text, "ghij");
    assert_eq!(col, 4);
  }

  // --- rendering ---

  fn loaded_app() -> App<ScriptedSource> {
    let mut app = App::new(Arc::new(ScriptedSource::default()), Box::new(MemoryPrefs::default()));
    let ticket = app.feed.begin_load().unwrap();
    let page = PageResult { videos: vec![video("a", "Acme"), video("b", "Beta")], next_cursor: None, has_more: false };
    app.feed.complete(ticket, Ok(page));
    app.list_state.select(Some(0));
    app
  }

  fn render(app: &mut App<ScriptedSource>) -> String {
    let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
    terminal.draw(|frame| ui(frame, app)).unwrap();
    let buffer = terminal.backend().buffer().clone();
    buffer.content().iter().map(|c| c.symbol()).collect()
  }

  #[test]
  fn grid_shows_cards() {
    let mut app = loaded_app();
    let screen = render(&mut app);
    assert!(screen.contains("Video a"));
    assert!(screen.contains("Channel: Beta"));
    assert!(screen.contains("2 videos"));
  }

  #[test]
  fn grid_cards_show_thumbnail() {
    let mut app = App::new(Arc::new(ScriptedSource::default()), Box::new(MemoryPrefs::default()));
    let ticket = app.feed.begin_load().unwrap();
    let mut with_thumb = video("a", "Acme");
    with_thumb.thumbnail = "https://img.test/a.jpg".to_string();
    let page = PageResult { videos: vec![with_thumb, video("b", "Beta")], next_cursor: None, has_more: false };
    app.feed.complete(ticket, Ok(page));
    app.list_state.select(Some(1));

    let screen = render(&mut app);
    assert!(screen.contains("Thumbnail: https://img.test/a.jpg"));
    assert_eq!(screen.matches("Thumbnail:").count(), 1);
  }

  #[test]
  fn list_layout_shows_rows() {
    let mut app = loaded_app();
    app.toggle_view_mode();
    let screen = render(&mut app);
    assert!(screen.contains("Video b"));
    assert!(screen.contains("Acme"));
  }

  #[test]
  fn filtered_title_counts_visible() {
    let mut app = loaded_app();
    app.criteria.toggle_channel("Acme");
    app.clamp_selection();
    let screen = render(&mut app);
    assert!(screen.contains("1 of 2 videos"));
    assert!(!screen.contains("Video b"));
  }

  #[test]
  fn empty_filter_result_explains_itself() {
    let mut app = loaded_app();
    app.criteria.set_search("zzz");
    app.clamp_selection();
    let screen = render(&mut app);
    assert!(screen.contains("No videos match"));
  }
}
