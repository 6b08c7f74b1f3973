//! Registration of typed channels into a [`Container`].
//!
//! [`ChannelContainerExt::add_channel`] registers three singletons for a
//! payload type `T`:
//!
//! - `Channel<T>`, created on first resolution by the container's
//!   [`ChannelRegistry`],
//! - `ChannelWriter<T>`, a write-only view of that channel,
//! - `ChannelReader<T>`, a read-only view of that channel.
//!
//! Producers and consumers resolve only the view they need. Nothing is
//! created until one of the three is first resolved.

use crate::channel::{Channel, ChannelReader, ChannelWriter};
use crate::error::ChannelRegistrationError;
use crate::registry::ChannelRegistry;
use crate::settings::{ChannelSettings, ChannelType};

use conduit_ioc::{resolve, Container, RegistrationError};
use std::any::type_name;
use tracing::{debug, error};

/// Extension methods that register typed channels into a container.
pub trait ChannelContainerExt {
  /// Registers a channel of type `kind` for payload `T`, plus its writer and
  /// reader.
  ///
  /// Fails with [`RegistrationError::Duplicate`] if the container already
  /// holds any of the three services for `T`, leaving the container
  /// unchanged. Settings are validated here, so an invalid bounded capacity
  /// is reported at startup rather than on first resolution.
  fn add_channel<T: Send + 'static>(
    &self,
    kind: ChannelType,
    settings: ChannelSettings,
  ) -> Result<&Self, ChannelRegistrationError>;

  /// Registers an unbounded channel for `T` with default settings.
  fn add_default_channel<T: Send + 'static>(&self) -> Result<&Self, ChannelRegistrationError> {
    self.add_channel::<T>(ChannelType::Unbounded, ChannelSettings::default())
  }

  /// Registers a bounded channel for `T` with default settings: capacity
  /// `DEFAULT_BOUNDED_CAPACITY` and `FullMode::Wait`.
  fn add_default_bounded_channel<T: Send + 'static>(
    &self,
  ) -> Result<&Self, ChannelRegistrationError> {
    self.add_channel::<T>(ChannelType::Bounded, ChannelSettings::default())
  }

  /// Registers a channel of type `kind` for `T` with default settings.
  fn add_channel_with_defaults<T: Send + 'static>(
    &self,
    kind: ChannelType,
  ) -> Result<&Self, ChannelRegistrationError> {
    self.add_channel::<T>(kind, ChannelSettings::default())
  }

  fn add_unbounded_channel<T: Send + 'static>(
    &self,
    settings: ChannelSettings,
  ) -> Result<&Self, ChannelRegistrationError> {
    self.add_channel::<T>(ChannelType::Unbounded, settings)
  }

  fn add_bounded_channel<T: Send + 'static>(
    &self,
    settings: ChannelSettings,
  ) -> Result<&Self, ChannelRegistrationError> {
    self.add_channel::<T>(ChannelType::Bounded, settings)
  }
}

impl ChannelContainerExt for Container {
  fn add_channel<T: Send + 'static>(
    &self,
    kind: ChannelType,
    settings: ChannelSettings,
  ) -> Result<&Self, ChannelRegistrationError> {
    settings.validate(kind)?;

    if self.contains::<Channel<T>>()
      || self.contains::<ChannelWriter<T>>()
      || self.contains::<ChannelReader<T>>()
    {
      return Err(RegistrationError::duplicate::<Channel<T>>().into());
    }

    if self.add_singleton_if_absent(|_: &Container| ChannelRegistry::new()) {
      debug!("channel registry registered");
    }

    // The insert is atomic, so of two racing registrations only one gets past here.
    self.try_add_shared_singleton::<Channel<T>>(move |container: &Container| {
      let registry = resolve!(container, ChannelRegistry);
      match registry.get_or_create::<T>(kind, Some(&settings)) {
        Ok(channel) => channel,
        Err(err) => {
          error!(payload = type_name::<T>(), %err, "failed to create registered channel");
          panic!("Failed to create channel for {}: {}", type_name::<T>(), err);
        }
      }
    })?;
    self.add_singleton(|container: &Container| resolve!(container, Channel<T>).writer());
    self.add_singleton(|container: &Container| resolve!(container, Channel<T>).reader());

    debug!(payload = type_name::<T>(), ?kind, "channel registered");
    Ok(self)
  }
}
