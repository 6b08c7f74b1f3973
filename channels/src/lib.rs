//! Typed in-process channels wired into a service container.
//!
//! Conduit registers one channel per payload type into a
//! [`conduit_ioc::Container`] and exposes its [`ChannelWriter`] and
//! [`ChannelReader`] as separately injectable singletons. Producers resolve a
//! writer, consumers resolve a reader, and neither needs to know how the
//! channel was configured.
//!
//! ```
//! use conduit::{ChannelContainerExt, ChannelReader, ChannelSettings, ChannelWriter, FullMode};
//! use conduit_ioc::{resolve, Container};
//!
//! #[derive(Debug, PartialEq)]
//! struct OrderPlaced(u32);
//!
//! let container = Container::new();
//! container
//!   .add_bounded_channel::<OrderPlaced>(
//!     ChannelSettings::new().with_bounded_capacity(16).with_full_mode(FullMode::Wait),
//!   )
//!   .unwrap();
//!
//! let writer = resolve!(container, ChannelWriter<OrderPlaced>);
//! let reader = resolve!(container, ChannelReader<OrderPlaced>);
//!
//! writer.try_write(OrderPlaced(1)).unwrap();
//! assert_eq!(reader.try_read(), Ok(OrderPlaced(1)));
//!
//! // Registering the same payload type twice is rejected.
//! assert!(container.add_default_channel::<OrderPlaced>().is_err());
//! ```

pub mod channel;
pub mod error;
pub mod registration;
pub mod registry;
pub mod settings;

pub use channel::{Channel, ChannelReader, ChannelWriter};
pub use error::{
  ChannelRegistrationError, CompleteError, ConfigError, ReadError, RegistryError, TryReadError,
  TryWriteError, WriteError,
};
pub use registration::ChannelContainerExt;
pub use registry::ChannelRegistry;
pub use settings::{ChannelSettings, ChannelType, FullMode, DEFAULT_BOUNDED_CAPACITY};

// Callers of the cancellable operations need the token type.
pub use tokio_util::sync::CancellationToken;
