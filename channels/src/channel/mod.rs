// src/channel/mod.rs

//! A lock-based FIFO channel with split reader and writer views.
//!
//! A [`Channel`] is either unbounded, or bounded with a [`FullMode`] deciding
//! what a write does when the buffer is full. The channel itself is shared
//! (`Arc<Channel<T>>`) and never "disconnects" when handles are dropped:
//! producers signal the end of the stream explicitly with
//! [`ChannelWriter::complete`], after which readers drain what is buffered and
//! then observe completion.
//!
//! Every operation comes in a non-blocking (`try_*`), a thread-blocking
//! (`*_blocking`, `*_timeout`) and an async form, and all of them interoperate
//! on the same channel: a blocking writer can feed an async reader.
//!
//! ```
//! use conduit::channel;
//! use conduit::ChannelSettings;
//!
//! let (writer, reader) = channel::unbounded::<u32>(&ChannelSettings::default());
//! writer.try_write(1).unwrap();
//! writer.try_write(2).unwrap();
//! writer.complete().unwrap();
//!
//! assert_eq!(reader.read_blocking(), Ok(1));
//! assert_eq!(reader.read_blocking(), Ok(2));
//! assert!(reader.read_blocking().is_err());
//! ```

pub use async_impl::{ReadFuture, WaitToReadFuture, WaitToWriteFuture, WriteFuture};

mod async_impl;
mod backoff;
mod core;
mod sync_impl;
mod waiter;


use self::core::ChannelState;
use self::waiter::WaitSlot;
use crate::error::{
  CompleteError, ConfigError, ReadError, TryReadError, TryWriteError, WriteError,
};
use crate::settings::{ChannelSettings, ChannelType, FullMode};

use futures_util::future::{select, Either};
use parking_lot::Mutex;
use std::fmt;
use std::pin::pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// A timeout too large to represent as an `Instant` means no deadline.
fn deadline_after(timeout: Duration) -> Option<Instant> {
  Instant::now().checked_add(timeout)
}

/// Callback receiving items evicted by a full-mode policy.
pub type DropHandler<T> = Box<dyn Fn(T) + Send + Sync>;

/// A typed FIFO queue shared by its readers and writers.
pub struct Channel<T> {
  pub(crate) state: Mutex<ChannelState<T>>,
  kind: ChannelType,
  /// `None` for unbounded channels.
  capacity: Option<usize>,
  full_mode: FullMode,
  settings: ChannelSettings,
  on_dropped: Option<DropHandler<T>>,
}

// --- Channel Constructors ---

impl<T> Channel<T> {
  /// Builds a channel from settings that have already been validated.
  pub(crate) fn build(
    kind: ChannelType,
    settings: &ChannelSettings,
    on_dropped: Option<DropHandler<T>>,
  ) -> Self {
    let (capacity, full_mode) = match kind {
      ChannelType::Unbounded => (None, FullMode::Wait),
      ChannelType::Bounded => (Some(settings.bounded_capacity), settings.bounded_full_mode),
    };
    Channel {
      state: Mutex::new(ChannelState::new(capacity)),
      kind,
      capacity,
      full_mode,
      settings: settings.clone(),
      on_dropped,
    }
  }

  /// Creates an unbounded channel. Only the reader/writer hints of `settings` apply.
  pub fn unbounded(settings: &ChannelSettings) -> Self {
    Self::build(ChannelType::Unbounded, settings, None)
  }

  /// Creates a bounded channel holding at most `settings.bounded_capacity` items.
  pub fn bounded(settings: &ChannelSettings) -> Result<Self, ConfigError> {
    settings.validate(ChannelType::Bounded)?;
    Ok(Self::build(ChannelType::Bounded, settings, None))
  }

  /// Creates a bounded channel whose evicted items are passed to `on_dropped`.
  ///
  /// With `FullMode::DropWrite` the rejected item itself is passed; with the
  /// other drop modes it is the evicted buffered item.
  pub fn bounded_with_drop_handler(
    settings: &ChannelSettings,
    on_dropped: impl Fn(T) + Send + Sync + 'static,
  ) -> Result<Self, ConfigError> {
    settings.validate(ChannelType::Bounded)?;
    Ok(Self::build(
      ChannelType::Bounded,
      settings,
      Some(Box::new(on_dropped)),
    ))
  }

  /// Creates a channel of the given type.
  pub fn from_type(kind: ChannelType, settings: &ChannelSettings) -> Result<Self, ConfigError> {
    settings.validate(kind)?;
    Ok(Self::build(kind, settings, None))
  }
}

/// Creates an unbounded channel and returns its writer and reader.
pub fn unbounded<T>(settings: &ChannelSettings) -> (ChannelWriter<T>, ChannelReader<T>) {
  let channel = Arc::new(Channel::unbounded(settings));
  (channel.writer(), channel.reader())
}

/// Creates a bounded channel and returns its writer and reader.
pub fn bounded<T>(
  settings: &ChannelSettings,
) -> Result<(ChannelWriter<T>, ChannelReader<T>), ConfigError> {
  let channel = Arc::new(Channel::bounded(settings)?);
  Ok((channel.writer(), channel.reader()))
}

// --- Channel Accessors ---

impl<T> Channel<T> {
  /// A read-only view of this channel.
  pub fn reader(self: &Arc<Self>) -> ChannelReader<T> {
    ChannelReader {
      channel: Arc::clone(self),
      stream_slot: WaitSlot::default(),
    }
  }

  /// A write-only view of this channel.
  pub fn writer(self: &Arc<Self>) -> ChannelWriter<T> {
    ChannelWriter {
      channel: Arc::clone(self),
    }
  }

  pub fn kind(&self) -> ChannelType {
    self.kind
  }

  /// The capacity of the channel. `None` for unbounded channels.
  pub fn capacity(&self) -> Option<usize> {
    self.capacity
  }

  /// The policy applied when full. Always `FullMode::Wait` for unbounded
  /// channels, which are never full.
  pub fn full_mode(&self) -> FullMode {
    self.full_mode
  }

  /// The settings this channel was built from.
  pub fn settings(&self) -> &ChannelSettings {
    &self.settings
  }

  /// Returns the number of items currently buffered.
  #[inline]
  pub fn len(&self) -> usize {
    self.state.lock().queue.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Returns `true` if the buffer is at capacity. Always `false` when unbounded.
  #[inline]
  pub fn is_full(&self) -> bool {
    self.capacity.is_some_and(|cap| self.len() >= cap)
  }

  /// Returns `true` once the channel has been completed.
  pub fn is_completed(&self) -> bool {
    self.state.lock().completed
  }
}

impl<T> fmt::Debug for Channel<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = self.state.lock();
    f.debug_struct("Channel")
      .field("kind", &self.kind)
      .field("capacity", &self.capacity)
      .field("full_mode", &self.full_mode)
      .field("len", &state.queue.len())
      .field("completed", &state.completed)
      .finish()
  }
}

// --- Writer ---

/// The write-only view of a channel.
pub struct ChannelWriter<T> {
  channel: Arc<Channel<T>>,
}

impl<T> Clone for ChannelWriter<T> {
  fn clone(&self) -> Self {
    ChannelWriter {
      channel: Arc::clone(&self.channel),
    }
  }
}

impl<T> fmt::Debug for ChannelWriter<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ChannelWriter")
      .field("channel", &self.channel)
      .finish()
  }
}

impl<T> ChannelWriter<T> {
  /// Attempts to write without waiting.
  ///
  /// Only a bounded channel in `FullMode::Wait` can report `Full`; the drop
  /// modes always admit the write.
  pub fn try_write(&self, item: T) -> Result<(), TryWriteError<T>> {
    self.channel.try_write_core(item)
  }

  /// Writes an item, blocking the current thread while the channel is full.
  pub fn write_blocking(&self, item: T) -> Result<(), WriteError<T>> {
    sync_impl::write_blocking(&self.channel, item, None)
  }

  /// Writes an item, blocking for at most `timeout` while the channel is full.
  pub fn write_timeout(&self, item: T, timeout: Duration) -> Result<(), WriteError<T>> {
    sync_impl::write_blocking(&self.channel, item, deadline_after(timeout))
  }

  /// Writes an item asynchronously, waiting while the channel is full.
  ///
  /// Dropping the future before it completes leaves the channel unchanged.
  pub fn write(&self, item: T) -> WriteFuture<'_, T> {
    WriteFuture::new(&self.channel, item)
  }

  /// Like [`write`](Self::write), but gives up with `WriteError::Cancelled`
  /// (returning the item) once `token` is cancelled.
  pub async fn write_cancellable(
    &self,
    item: T,
    token: &CancellationToken,
  ) -> Result<(), WriteError<T>> {
    if token.is_cancelled() {
      return Err(WriteError::Cancelled(item));
    }
    let mut write = self.write(item);
    let cancelled = pin!(token.cancelled());
    if let Either::Left((result, _)) = select(&mut write, cancelled).await {
      return result;
    }
    match write.abandon() {
      Some(item) => Err(WriteError::Cancelled(item)),
      None => Ok(()),
    }
  }

  /// Waits until a write would be admitted. Resolves to `false` once completed.
  pub fn wait_to_write(&self) -> WaitToWriteFuture<'_, T> {
    WaitToWriteFuture::new(&self.channel)
  }

  /// Marks the channel complete.
  ///
  /// Later writes fail with `Completed`, waiting writers are released with
  /// `Completed`, and readers drain the buffer before observing completion.
  pub fn complete(&self) -> Result<(), CompleteError> {
    self.channel.complete_core()
  }

  pub fn is_completed(&self) -> bool {
    self.channel.is_completed()
  }

  /// The shared channel behind this writer.
  pub fn channel(&self) -> &Arc<Channel<T>> {
    &self.channel
  }
}

// --- Reader ---

/// The read-only view of a channel.
///
/// Also a [`Stream`](futures_core::Stream) that ends once the channel is
/// complete and drained.
pub struct ChannelReader<T> {
  channel: Arc<Channel<T>>,
  // Waiter registration used by the `Stream` implementation.
  stream_slot: WaitSlot,
}

impl<T> Clone for ChannelReader<T> {
  fn clone(&self) -> Self {
    self.channel.reader()
  }
}

impl<T> fmt::Debug for ChannelReader<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ChannelReader")
      .field("channel", &self.channel)
      .finish()
  }
}

impl<T> ChannelReader<T> {
  /// Attempts to read without waiting.
  pub fn try_read(&self) -> Result<T, TryReadError> {
    self.channel.try_read_core()
  }

  /// Reads an item, blocking the current thread while the channel is empty.
  pub fn read_blocking(&self) -> Result<T, ReadError> {
    sync_impl::read_blocking(&self.channel, None)
  }

  /// Reads an item, blocking for at most `timeout`.
  pub fn read_timeout(&self, timeout: Duration) -> Result<T, ReadError> {
    sync_impl::read_blocking(&self.channel, deadline_after(timeout))
  }

  /// Reads an item asynchronously.
  ///
  /// Dropping the future before it completes leaves the channel unchanged.
  pub fn read(&self) -> ReadFuture<'_, T> {
    ReadFuture::new(&self.channel)
  }

  /// Like [`read`](Self::read), but gives up with `ReadError::Cancelled` once
  /// `token` is cancelled. Nothing is dequeued in that case.
  pub async fn read_cancellable(&self, token: &CancellationToken) -> Result<T, ReadError> {
    if token.is_cancelled() {
      return Err(ReadError::Cancelled);
    }
    let mut read = self.read();
    let cancelled = pin!(token.cancelled());
    if let Either::Left((result, _)) = select(&mut read, cancelled).await {
      return result;
    }
    Err(ReadError::Cancelled)
  }

  /// Waits until an item is available. Resolves to `false` once the channel
  /// is complete and drained.
  pub fn wait_to_read(&self) -> WaitToReadFuture<'_, T> {
    WaitToReadFuture::new(&self.channel)
  }

  /// Removes and returns every buffered item.
  pub fn drain(&self) -> Vec<T> {
    self.channel.drain_core()
  }

  /// Returns `true` once the channel is complete and nothing is left to read.
  pub fn is_finished(&self) -> bool {
    let state = self.channel.state.lock();
    state.completed && state.queue.is_empty()
  }

  pub fn len(&self) -> usize {
    self.channel.len()
  }

  pub fn is_empty(&self) -> bool {
    self.channel.is_empty()
  }

  /// The shared channel behind this reader.
  pub fn channel(&self) -> &Arc<Channel<T>> {
    &self.channel
  }
}
