//! Construction settings for registered channels.
//!
//! [`ChannelSettings`] is a plain value: a channel copies what it needs when
//! it is built, so changing a settings value afterwards has no effect on
//! channels already created from it.
//!
//! With the `serde` feature (on by default) all types here can be loaded from
//! configuration files. Missing fields fall back to their defaults:
//!
//! ```
//! # #[cfg(feature = "serde")] {
//! use conduit::{ChannelSettings, FullMode};
//!
//! let settings: ChannelSettings =
//!   serde_json::from_str(r#"{ "bounded_capacity": 8, "bounded_full_mode": "drop_oldest" }"#).unwrap();
//!
//! assert_eq!(settings.bounded_capacity, 8);
//! assert_eq!(settings.bounded_full_mode, FullMode::DropOldest);
//! assert!(settings.single_reader);
//! # }
//! ```

use crate::error::ConfigError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default number of items a bounded channel buffers.
pub const DEFAULT_BOUNDED_CAPACITY: usize = 100;

/// Selects which construction path the registry uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ChannelType {
  /// No capacity limit; writes never wait and never drop.
  #[default]
  Unbounded,
  /// At most `bounded_capacity` buffered items; `bounded_full_mode` applies when full.
  Bounded,
}

/// Policy applied when a write hits a full bounded channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FullMode {
  /// The writer waits until a reader frees a slot.
  #[default]
  Wait,
  /// The oldest buffered item is removed to make room for the new one.
  DropOldest,
  /// The most recently buffered item is removed to make room for the new one.
  DropNewest,
  /// The item being written is discarded. The write still reports success.
  DropWrite,
}

/// Settings a channel is constructed from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChannelSettings {
  /// Hint that only one consumer ever reads. Not enforced.
  pub single_reader: bool,
  /// Hint that only one producer ever writes. Not enforced.
  pub single_writer: bool,
  /// Maximum buffered items of a bounded channel. Ignored when unbounded.
  pub bounded_capacity: usize,
  /// Policy for writes to a full bounded channel. Ignored when unbounded.
  pub bounded_full_mode: FullMode,
}

impl Default for ChannelSettings {
  fn default() -> Self {
    Self {
      single_reader: true,
      single_writer: true,
      bounded_capacity: DEFAULT_BOUNDED_CAPACITY,
      bounded_full_mode: FullMode::Wait,
    }
  }
}

impl ChannelSettings {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_single_reader(mut self, single_reader: bool) -> Self {
    self.single_reader = single_reader;
    self
  }

  pub fn with_single_writer(mut self, single_writer: bool) -> Self {
    self.single_writer = single_writer;
    self
  }

  pub fn with_bounded_capacity(mut self, capacity: usize) -> Self {
    self.bounded_capacity = capacity;
    self
  }

  pub fn with_full_mode(mut self, mode: FullMode) -> Self {
    self.bounded_full_mode = mode;
    self
  }

  /// Checks that these settings can build a channel of the given type.
  ///
  /// Unbounded channels ignore the capacity, so only bounded channels can fail.
  pub fn validate(&self, kind: ChannelType) -> Result<(), ConfigError> {
    match kind {
      ChannelType::Unbounded => Ok(()),
      ChannelType::Bounded if self.bounded_capacity == 0 => Err(ConfigError::ZeroCapacity),
      ChannelType::Bounded => Ok(()),
    }
  }
}
