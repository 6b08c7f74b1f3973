// src/error.rs

use core::fmt;
use thiserror::Error;

// Errors that hand the rejected item back to the caller. `Debug` and `Display`
// are implemented by hand so that `T` does not need to be `Debug` itself.
macro_rules! impl_error_for_enum_with_inner {
  (
    $enum_name:ident < $generic_param:ident >,
    $($variant:ident ( $message:expr ) ),+
    $(,)?
  ) => {
    impl<$generic_param> $enum_name<$generic_param> {
      /// Consumes the error, returning the item that could not be written.
      #[inline]
      pub fn into_inner(self) -> $generic_param {
        match self {
          $( $enum_name::$variant(v) => v, )+
        }
      }
    }

    impl<$generic_param> fmt::Debug for $enum_name<$generic_param> {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
          $( $enum_name::$variant(_) => write!(f, concat!(stringify!($enum_name), "::", stringify!($variant), "(..)")), )+
        }
      }
    }

    impl<$generic_param> fmt::Display for $enum_name<$generic_param> {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
          $( $enum_name::$variant(_) => f.write_str($message), )+
        }
      }
    }

    impl<$generic_param> std::error::Error for $enum_name<$generic_param> {}
  };
}

/// Error returned by `try_write` when the item could not be written immediately.
#[derive(PartialEq, Eq, Clone)]
pub enum TryWriteError<T> {
  /// The channel is bounded, in `FullMode::Wait`, and at capacity.
  Full(T),
  /// The channel has been completed; no further writes are accepted.
  Completed(T),
}

impl_error_for_enum_with_inner!(
  TryWriteError<T>,
  Full("channel full"),
  Completed("channel completed"),
);

/// Error returned by writes that may wait for space.
#[derive(PartialEq, Eq, Clone)]
pub enum WriteError<T> {
  /// The channel was completed before the item could be written.
  Completed(T),
  /// The caller's cancellation token fired first. Nothing was enqueued.
  Cancelled(T),
  /// The deadline passed before space became available. Nothing was enqueued.
  Timeout(T),
}

impl_error_for_enum_with_inner!(
  WriteError<T>,
  Completed("channel completed"),
  Cancelled("write cancelled"),
  Timeout("timed out waiting for channel capacity"),
);

/// Error returned by `try_read` when no item could be read immediately.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Error)]
pub enum TryReadError {
  #[error("channel empty")]
  Empty,
  #[error("channel completed and drained")]
  Completed,
}

/// Error returned by reads that may wait for an item.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Error)]
pub enum ReadError {
  /// The channel is completed and every buffered item has been read.
  #[error("channel completed and drained")]
  Completed,
  /// The caller's cancellation token fired first. Nothing was dequeued.
  #[error("read cancelled")]
  Cancelled,
  #[error("timed out waiting for an item")]
  Timeout,
}

/// Error returned by `complete` when the channel was already completed.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Error)]
#[error("channel already completed")]
pub struct CompleteError;

/// Invalid channel construction settings.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Error)]
pub enum ConfigError {
  #[error("bounded channel capacity must be at least 1")]
  ZeroCapacity,
}

/// Errors raised by the [`ChannelRegistry`](crate::ChannelRegistry).
#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum RegistryError {
  /// The registry entry for the requested payload type holds a channel of a
  /// different payload type.
  #[error("channel registered for {stored} cannot serve payload type {requested}")]
  TypeIdentityCollision {
    requested: &'static str,
    stored: &'static str,
  },
  #[error(transparent)]
  Config(#[from] ConfigError),
}

/// Errors raised while registering a channel into a container.
#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum ChannelRegistrationError {
  #[error(transparent)]
  Registration(#[from] conduit_ioc::RegistrationError),
  #[error(transparent)]
  Config(#[from] ConfigError),
}
