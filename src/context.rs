//! UI preference contexts backed by the local cache.
//!
//! Each context is an explicit object built from a [`LocalCache`] and passed
//! to whatever needs it. There is no global state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::env::Environment;
use crate::storage::LocalCache;

/// Storage key for the theme preference.
pub const THEME_KEY: &str = "theme";

/// Storage key for the navigation menu expansion flag.
pub const NAVIGATION_KEY: &str = "navigation-expanded";

/// Whether the top-right navigation menu is expanded.
#[derive(Clone)]
pub struct NavigationContext {
  cache: LocalCache,
}

impl NavigationContext {
  pub fn new(cache: LocalCache) -> Self {
    Self { cache }
  }

  /// Collapsed unless a previous session expanded it.
  pub fn is_expanded(&self) -> bool {
    self.cache.get(NAVIGATION_KEY, false)
  }

  pub fn set_expanded(&self, expanded: bool) {
    self.cache.set(NAVIGATION_KEY, &expanded);
  }

  /// Flip the flag and return the new value.
  pub fn toggle(&self) -> bool {
    let expanded = !self.is_expanded();
    self.set_expanded(expanded);
    expanded
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
  Light,
  Dark,
  System,
}

impl ThemeMode {
  pub fn as_str(&self) -> &'static str {
    match self {
      ThemeMode::Light => "light",
      ThemeMode::Dark => "dark",
      ThemeMode::System => "system",
    }
  }
}

impl fmt::Display for ThemeMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ThemeMode {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "light" => Ok(ThemeMode::Light),
      "dark" => Ok(ThemeMode::Dark),
      "system" => Ok(ThemeMode::System),
      other => Err(format!("unknown theme: {other}")),
    }
  }
}

/// Light/dark preference.
///
/// A stored `dark` wins. With nothing stored, or `system`, the system
/// colour preference from the [`Environment`] decides.
#[derive(Clone)]
pub struct ThemeContext {
  cache: LocalCache,
  prefers_dark: bool,
}

impl ThemeContext {
  pub fn new(cache: LocalCache, env: &Environment) -> Self {
    Self {
      cache,
      prefers_dark: env.prefers_dark,
    }
  }

  /// The stored preference, if any.
  pub fn stored(&self) -> Option<ThemeMode> {
    self.cache.get(THEME_KEY, None)
  }

  pub fn is_dark(&self) -> bool {
    match self.stored() {
      Some(ThemeMode::Dark) => true,
      Some(ThemeMode::Light) => false,
      Some(ThemeMode::System) | None => self.prefers_dark,
    }
  }

  pub fn set(&self, mode: ThemeMode) {
    self.cache.set(THEME_KEY, &mode);
  }

  /// Switch between light and dark, returning the new mode.
  pub fn toggle(&self) -> ThemeMode {
    let next = if self.is_dark() {
      ThemeMode::Light
    } else {
      ThemeMode::Dark
    };
    self.set(next);
    next
  }
}
