use tracing::debug;

use crate::config::PrefStore;
use crate::constants::constants;

/// How the result list is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
  #[default]
  Grid,
  List,
}

impl ViewMode {
  pub fn label(self) -> &'static str {
    match self {
      ViewMode::Grid => "grid",
      ViewMode::List => "list",
    }
  }

  /// Parse a stored value; anything unrecognised is `None`.
  pub fn from_config(s: &str) -> Option<Self> {
    match s.trim().to_lowercase().as_str() {
      "grid" => Some(ViewMode::Grid),
      "list" => Some(ViewMode::List),
      _ => None,
    }
  }

  pub fn toggled(self) -> Self {
    match self {
      ViewMode::Grid => ViewMode::List,
      ViewMode::List => ViewMode::Grid,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorScheme {
  Light,
  #[default]
  Dark,
}

impl ColorScheme {
  pub fn label(self) -> &'static str {
    match self {
      ColorScheme::Light => "light",
      ColorScheme::Dark => "dark",
    }
  }

  pub fn from_config(s: &str) -> Option<Self> {
    match s.trim().to_lowercase().as_str() {
      "light" => Some(ColorScheme::Light),
      "dark" => Some(ColorScheme::Dark),
      _ => None,
    }
  }

  pub fn toggled(self) -> Self {
    match self {
      ColorScheme::Light => ColorScheme::Dark,
      ColorScheme::Dark => ColorScheme::Light,
    }
  }
}

/// Layout and color preferences, written back to `store` on every toggle.
pub struct ViewState<P: PrefStore> {
  mode: ViewMode,
  scheme: ColorScheme,
  store: P,
}

impl<P: PrefStore> ViewState<P> {
  pub fn load(store: P) -> Self {
    let c = constants();
    let mode = store.get(&c.view_mode_key).and_then(|s| ViewMode::from_config(&s)).unwrap_or_default();
    let scheme = store.get(&c.theme_mode_key).and_then(|s| ColorScheme::from_config(&s)).unwrap_or_default();
    debug!(mode = mode.label(), scheme = scheme.label(), "view: loaded preferences");
    Self { mode, scheme, store }
  }

  pub fn mode(&self) -> ViewMode {
    self.mode
  }

  pub fn scheme(&self) -> ColorScheme {
    self.scheme
  }

  pub fn toggle_mode(&mut self) {
    self.mode = self.mode.toggled();
    self.store.set(&constants().view_mode_key, self.mode.label());
  }

  pub fn toggle_scheme(&mut self) {
    self.scheme = self.scheme.toggled();
    self.store.set(&constants().theme_mode_key, self.scheme.label());
  }

  #[cfg(test)]
  pub fn store(&self) -> &P {
    &self.store
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::MemoryPrefs;

  fn prefs(pairs: &[(&str, &str)]) -> MemoryPrefs {
    let mut p = MemoryPrefs::default();
    for (k, v) in pairs {
      p.set(k, v);
    }
    p
  }

  #[test]
  fn defaults_when_absent() {
    let view = ViewState::load(MemoryPrefs::default());
    assert_eq!(view.mode(), ViewMode::Grid);
    assert_eq!(view.scheme(), ColorScheme::Dark);
  }

  #[test]
  fn defaults_when_invalid() {
    let view = ViewState::load(prefs(&[("view_mode", "carousel"), ("theme_mode", "")]));
    assert_eq!(view.mode(), ViewMode::Grid);
    assert_eq!(view.scheme(), ColorScheme::Dark);
  }

  #[test]
  fn reads_stored_values_case_insensitively() {
    let view = ViewState::load(prefs(&[("view_mode", "List"), ("theme_mode", "LIGHT")]));
    assert_eq!(view.mode(), ViewMode::List);
    assert_eq!(view.scheme(), ColorScheme::Light);
  }

  #[test]
  fn toggles_write_through() {
    let mut view = ViewState::load(MemoryPrefs::default());
    view.toggle_mode();
    assert_eq!(view.mode(), ViewMode::List);
    assert_eq!(view.store().get("view_mode").as_deref(), Some("list"));
    assert_eq!(view.store().get("theme_mode"), None);

    view.toggle_scheme();
    assert_eq!(view.scheme(), ColorScheme::Light);
    assert_eq!(view.store().get("theme_mode").as_deref(), Some("light"));

    view.toggle_mode();
    assert_eq!(view.store().get("view_mode").as_deref(), Some("grid"));
  }

  #[test]
  fn toggled_state_survives_reload() {
    let mut view = ViewState::load(MemoryPrefs::default());
    view.toggle_scheme();
    view.toggle_mode();
    let reloaded = ViewState::load(view.store().clone());
    assert_eq!(reloaded.mode(), ViewMode::List);
    assert_eq!(reloaded.scheme(), ColorScheme::Light);
  }
}
