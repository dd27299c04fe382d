use directories::ProjectDirs;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::warn;

use crate::constants::constants;

/// Durable string key-value storage for user preferences.
pub trait PrefStore {
  fn get(&self, key: &str) -> Option<String>;
  fn set(&mut self, key: &str, value: &str);
}

impl<T: PrefStore + ?Sized> PrefStore for Box<T> {
  fn get(&self, key: &str) -> Option<String> {
    (**self).get(key)
  }

  fn set(&mut self, key: &str, value: &str) {
    (**self).set(key, value)
  }
}

/// Preferences kept in `prefs.toml` under the platform config directory.
///
/// Read and write failures are logged and otherwise ignored: losing a preference
/// only means falling back to its default.
#[derive(Debug, Default)]
pub struct FilePrefs {
  path: Option<PathBuf>,
  values: BTreeMap<String, String>,
}

impl FilePrefs {
  pub fn load() -> Self {
    let path = ProjectDirs::from("", "", "ytdash").map(|dirs| dirs.config_dir().join(&constants().prefs_file));
    match path {
      Some(path) => Self::load_from(path),
      None => {
        warn!("prefs: no config directory available, preferences will not persist");
        Self::default()
      }
    }
  }

  pub fn load_from(path: PathBuf) -> Self {
    let values = match std::fs::read_to_string(&path) {
      Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
        warn!(path = %path.display(), err = %e, "prefs: ignoring malformed preferences file");
        BTreeMap::new()
      }),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
      Err(e) => {
        warn!(path = %path.display(), err = %e, "prefs: could not read preferences file");
        BTreeMap::new()
      }
    };
    Self { path: Some(path), values }
  }

  fn save(&self) {
    let Some(path) = &self.path else { return };
    if let Some(dir) = path.parent()
      && let Err(e) = std::fs::create_dir_all(dir)
    {
      warn!(dir = %dir.display(), err = %e, "prefs: could not create config directory");
      return;
    }
    match toml::to_string(&self.values) {
      Ok(content) => {
        if let Err(e) = std::fs::write(path, content) {
          warn!(path = %path.display(), err = %e, "prefs: could not write preferences file");
        }
      }
      Err(e) => warn!(err = %e, "prefs: could not serialise preferences"),
    }
  }
}

impl PrefStore for FilePrefs {
  fn get(&self, key: &str) -> Option<String> {
    self.values.get(key).cloned()
  }

  fn set(&mut self, key: &str, value: &str) {
    self.values.insert(key.to_string(), value.to_string());
    self.save();
  }
}

/// In-memory store, used when nothing should touch the filesystem.
#[derive(Debug, Default, Clone)]
pub struct MemoryPrefs {
  values: BTreeMap<String, String>,
}

impl PrefStore for MemoryPrefs {
  fn get(&self, key: &str) -> Option<String> {
    self.values.get(key).cloned()
  }

  fn set(&mut self, key: &str, value: &str) {
    self.values.insert(key.to_string(), value.to_string());
  }
}
