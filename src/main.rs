mod app;
mod channels;
mod config;
mod constants;
mod feed;
mod filter;
mod input;
mod logging;
mod source;
mod theme;
mod ui;
mod video;
mod view;

use anyhow::{Context, Result};
use clap::Parser;
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use app::App;
use config::{FilePrefs, MemoryPrefs, PrefStore};
use constants::constants;
use source::HttpVideoSource;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// Base URL of the video listing API (default from constants.ron)
  #[arg(short = 'u', long)]
  api_url: Option<String>,

  /// Videos requested per page
  #[arg(short = 'n', long)]
  page_size: Option<usize>,

  /// Request timeout in seconds
  #[arg(short, long)]
  timeout_secs: Option<u64>,

  /// Keep view and theme preferences in memory only
  #[arg(long)]
  ephemeral: bool,
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  let _log_guard = logging::init_logging()?;

  let base_url = args.api_url.as_deref().unwrap_or(&constants().api_base_url);
  let page_size = args.page_size.unwrap_or(constants().page_size);
  let timeout = Duration::from_secs(args.timeout_secs.unwrap_or(constants().request_timeout_secs));
  let source = HttpVideoSource::new(base_url, page_size, timeout)
    .with_context(|| format!("Invalid API base URL '{}'", base_url))?;
  info!(base_url, page_size, ephemeral = args.ephemeral, "starting");

  let prefs: Box<dyn PrefStore + Send> =
    if args.ephemeral { Box::new(MemoryPrefs::default()) } else { Box::new(FilePrefs::load()) };
  let app = App::new(Arc::new(source), prefs);

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, app);
  ratatui::restore();
  result
}

fn run(terminal: &mut DefaultTerminal, mut app: App<HttpVideoSource>) -> Result<()> {
  app.trigger_load_more();

  loop {
    app.check_pending();
    app.expire_error();

    terminal.draw(|frame| ui::ui(frame, &mut app))?;

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(&mut app, key);
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  info!(videos = app.feed.videos().len(), pages = app.feed.page_count(), "exiting");
  Ok(())
}
