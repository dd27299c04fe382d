//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so it's always available,
//! with no runtime file I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // Video listing API
  pub api_base_url: String,
  pub page_size: usize,
  pub request_timeout_secs: u64,

  // Files and preference keys
  pub prefs_file: String,
  pub log_file: String,
  pub view_mode_key: String,
  pub theme_mode_key: String,

  // Results layout
  pub grid_columns: usize,
  pub grid_card_height: u16,
  pub list_description_width: usize,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed the first test run catches it.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn embedded_constants_parse() {
    let c = constants();
    assert_eq!(c.page_size, 12);
    assert!(c.api_base_url.starts_with("http"));
    assert_ne!(c.view_mode_key, c.theme_mode_key);
    assert!(c.grid_columns > 0);
  }
}
