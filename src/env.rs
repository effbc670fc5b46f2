//! Capabilities of the context the client runs in.
//!
//! Code that would otherwise sniff for a browser-like runtime takes an
//! `Environment` instead and checks the flag it needs.

/// Capability flags injected into the storage and query layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Environment {
  /// Network calls can be issued
  pub network: bool,
  /// A persistent storage medium exists
  pub storage: bool,
  /// The system colour scheme prefers dark
  pub prefers_dark: bool,
}

impl Environment {
  /// A full interactive session: network and storage available.
  pub const fn interactive() -> Self {
    Self {
      network: true,
      storage: true,
      prefers_dark: false,
    }
  }

  /// Ahead-of-time rendering: nothing may touch the network or storage.
  pub const fn prerender() -> Self {
    Self {
      network: false,
      storage: false,
      prefers_dark: false,
    }
  }

  pub const fn with_prefers_dark(mut self, prefers_dark: bool) -> Self {
    self.prefers_dark = prefers_dark;
    self
  }
}

impl Default for Environment {
  fn default() -> Self {
    Self::interactive()
  }
}
