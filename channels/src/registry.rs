//! The per-payload-type channel cache.
//!
//! A [`ChannelRegistry`] holds at most one channel per payload type `T`, keyed
//! by `TypeId::of::<T>()`. Channels are created lazily by the first
//! `get_or_create*` call for a type; every later call, from any thread,
//! returns the same `Arc<Channel<T>>`.
//!
//! The registry is a plain value. The registration facade stores one inside
//! each container, so separate containers never share channels.

use crate::channel::Channel;
use crate::error::RegistryError;
use crate::settings::{ChannelSettings, ChannelType};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

type ErasedChannel = Arc<dyn Any + Send + Sync>;

struct RegistryEntry {
  channel: ErasedChannel,
  type_name: &'static str,
  kind: ChannelType,
}

/// Maps payload types to their single shared channel.
#[derive(Default)]
pub struct ChannelRegistry {
  channels: DashMap<TypeId, RegistryEntry>,
}

impl ChannelRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns the unbounded channel for `T`, creating it if needed.
  ///
  /// `None` settings mean [`ChannelSettings::default()`].
  pub fn get_or_create_unbounded<T: Send + 'static>(
    &self,
    settings: Option<&ChannelSettings>,
  ) -> Result<Arc<Channel<T>>, RegistryError> {
    self.get_or_create(ChannelType::Unbounded, settings)
  }

  /// Returns the bounded channel for `T`, creating it if needed with
  /// `bounded_capacity` and `bounded_full_mode` from `settings`.
  pub fn get_or_create_bounded<T: Send + 'static>(
    &self,
    settings: Option<&ChannelSettings>,
  ) -> Result<Arc<Channel<T>>, RegistryError> {
    self.get_or_create(ChannelType::Bounded, settings)
  }

  /// Returns the channel for `T`, creating one of type `kind` if needed.
  ///
  /// The first creation wins: if a channel for `T` already exists it is
  /// returned even when it was created with a different `ChannelType`.
  pub fn get_or_create<T: Send + 'static>(
    &self,
    kind: ChannelType,
    settings: Option<&ChannelSettings>,
  ) -> Result<Arc<Channel<T>>, RegistryError> {
    let key = TypeId::of::<T>();

    // Fast path: the channel already exists.
    if let Some(entry) = self.channels.get(&key) {
      return Self::typed(&entry, kind);
    }

    let defaults = ChannelSettings::default();
    let settings = settings.unwrap_or(&defaults);
    settings.validate(kind)?;

    match self.channels.entry(key) {
      Entry::Occupied(occupied) => Self::typed(occupied.get(), kind),
      Entry::Vacant(vacant) => {
        let channel = Arc::new(Channel::<T>::build(kind, settings, None));
        debug!(
          payload = type_name::<T>(),
          ?kind,
          capacity = ?channel.capacity(),
          full_mode = ?channel.full_mode(),
          "channel created"
        );
        vacant.insert(RegistryEntry {
          channel: Arc::clone(&channel) as ErasedChannel,
          type_name: type_name::<T>(),
          kind,
        });
        Ok(channel)
      }
    }
  }

  /// Returns the channel for `T` if one has been created.
  pub fn get<T: Send + 'static>(&self) -> Option<Arc<Channel<T>>> {
    let entry = self.channels.get(&TypeId::of::<T>())?;
    Arc::clone(&entry.channel).downcast::<Channel<T>>().ok()
  }

  /// Returns `true` if a channel for `T` has been created.
  pub fn contains<T: 'static>(&self) -> bool {
    self.channels.contains_key(&TypeId::of::<T>())
  }

  /// The number of channels created so far.
  pub fn len(&self) -> usize {
    self.channels.len()
  }

  pub fn is_empty(&self) -> bool {
    self.channels.is_empty()
  }

  fn typed<T: Send + 'static>(
    entry: &RegistryEntry,
    requested: ChannelType,
  ) -> Result<Arc<Channel<T>>, RegistryError> {
    let channel = Arc::clone(&entry.channel)
      .downcast::<Channel<T>>()
      .map_err(|_| RegistryError::TypeIdentityCollision {
        requested: type_name::<T>(),
        stored: entry.type_name,
      })?;
    if entry.kind != requested {
      warn!(
        payload = entry.type_name,
        existing = ?entry.kind,
        ?requested,
        "channel already exists with a different type, returning the existing channel"
      );
    }
    Ok(channel)
  }
}

impl fmt::Debug for ChannelRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut channels: Vec<_> = self
      .channels
      .iter()
      .map(|entry| (entry.type_name, entry.kind))
      .collect();
    channels.sort_unstable_by_key(|(name, _)| *name);
    f.debug_struct("ChannelRegistry")
      .field("channels", &channels)
      .finish()
  }
}
