//! Future-based write and read, plus the `Stream` implementation of the reader.
//!
//! None of these futures are self-referential: each holds a reference to the
//! channel, its pending item and the id of its waiter queue entry. They are
//! therefore `Unpin`, and dropping one at any point is a clean cancellation:
//! its waiter entry is removed and an unused wake-up is passed on.

use futures_core::Stream;

use super::core::Admission;
use super::waiter::WaitSlot;
use super::{Channel, ChannelReader};
use crate::error::{ReadError, WriteError};

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

// --- Shared poll logic ---

fn poll_write<T>(
  channel: &Channel<T>,
  item: &mut Option<T>,
  slot: &mut WaitSlot,
  cx: &mut Context<'_>,
) -> Poll<Result<(), WriteError<T>>> {
  let Some(pending) = item.take() else {
    // Polled again after completing.
    return Poll::Ready(Ok(()));
  };

  let mut state = channel.state.lock();
  match channel.admit_locked(&mut state, pending) {
    Admission::Accepted(effects) => {
      slot.settle(&mut state.writers);
      drop(state);
      channel.finish_write(effects);
      Poll::Ready(Ok(()))
    }
    Admission::Completed(rejected) => {
      slot.settle(&mut state.writers);
      Poll::Ready(Err(WriteError::Completed(rejected)))
    }
    Admission::Full(rejected) => {
      *item = Some(rejected);
      slot.park(&mut state.writers, cx.waker());
      Poll::Pending
    }
  }
}

fn poll_read<T>(
  channel: &Channel<T>,
  slot: &mut WaitSlot,
  cx: &mut Context<'_>,
) -> Poll<Result<T, ReadError>> {
  let mut state = channel.state.lock();
  if let Some((item, writer)) = channel.take_locked(&mut state) {
    slot.settle(&mut state.readers);
    drop(state);
    if let Some(writer) = writer {
      writer.wake();
    }
    return Poll::Ready(Ok(item));
  }
  if state.completed {
    slot.settle(&mut state.readers);
    return Poll::Ready(Err(ReadError::Completed));
  }
  slot.park(&mut state.readers, cx.waker());
  Poll::Pending
}

fn abandon_reader<T>(channel: &Channel<T>, slot: &mut WaitSlot) {
  if slot.is_parked() {
    let next = slot.abandon(&mut channel.state.lock().readers);
    if let Some(next) = next {
      next.wake();
    }
  }
}

fn abandon_writer<T>(channel: &Channel<T>, slot: &mut WaitSlot) {
  if slot.is_parked() {
    let next = slot.abandon(&mut channel.state.lock().writers);
    if let Some(next) = next {
      next.wake();
    }
  }
}

// --- WriteFuture ---

/// A future that completes when an item has been written to the channel.
#[must_use = "futures do nothing unless you .await or poll them"]
pub struct WriteFuture<'a, T> {
  channel: &'a Channel<T>,
  item: Option<T>,
  slot: WaitSlot,
}

// The item is moved in and out by value and never pinned in place.
impl<T> Unpin for WriteFuture<'_, T> {}

impl<'a, T> WriteFuture<'a, T> {
  pub(super) fn new(channel: &'a Channel<T>, item: T) -> Self {
    Self {
      channel,
      item: Some(item),
      slot: WaitSlot::default(),
    }
  }

  /// Stops waiting and hands back the item if it was not written.
  pub(super) fn abandon(&mut self) -> Option<T> {
    abandon_writer(self.channel, &mut self.slot);
    self.item.take()
  }
}

impl<T> Future for WriteFuture<'_, T> {
  type Output = Result<(), WriteError<T>>;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let this = self.get_mut();
    poll_write(this.channel, &mut this.item, &mut this.slot, cx)
  }
}

impl<T> Drop for WriteFuture<'_, T> {
  fn drop(&mut self) {
    abandon_writer(self.channel, &mut self.slot);
  }
}

impl<T> std::fmt::Debug for WriteFuture<'_, T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("WriteFuture")
      .field("pending", &self.item.is_some())
      .field("parked", &self.slot.is_parked())
      .finish()
  }
}

// --- ReadFuture ---

/// A future that completes with the next item, or an error once the channel
/// is complete and drained.
#[must_use = "futures do nothing unless you .await or poll them"]
#[derive(Debug)]
pub struct ReadFuture<'a, T> {
  channel: &'a Channel<T>,
  slot: WaitSlot,
}

impl<'a, T> ReadFuture<'a, T> {
  pub(super) fn new(channel: &'a Channel<T>) -> Self {
    Self {
      channel,
      slot: WaitSlot::default(),
    }
  }
}

impl<T> Future for ReadFuture<'_, T> {
  type Output = Result<T, ReadError>;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let this = self.get_mut();
    poll_read(this.channel, &mut this.slot, cx)
  }
}

impl<T> Drop for ReadFuture<'_, T> {
  fn drop(&mut self) {
    abandon_reader(self.channel, &mut self.slot);
  }
}

// --- Readiness futures ---

/// Resolves to `true` once an item is available, `false` once the channel is
/// complete and drained.
///
/// Does not consume anything, including the wake-up that signalled the item:
/// it is handed to the next queued reader.
#[must_use = "futures do nothing unless you .await or poll them"]
#[derive(Debug)]
pub struct WaitToReadFuture<'a, T> {
  channel: &'a Channel<T>,
  slot: WaitSlot,
}

impl<'a, T> WaitToReadFuture<'a, T> {
  pub(super) fn new(channel: &'a Channel<T>) -> Self {
    Self {
      channel,
      slot: WaitSlot::default(),
    }
  }
}

impl<T> Future for WaitToReadFuture<'_, T> {
  type Output = bool;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<bool> {
    let this = self.get_mut();
    let mut state = this.channel.state.lock();
    if !state.queue.is_empty() {
      // Nothing is consumed here, so a notification this waiter received
      // still belongs to a reader that will take the item.
      let next = this.slot.abandon(&mut state.readers);
      drop(state);
      if let Some(next) = next {
        next.wake();
      }
      return Poll::Ready(true);
    }
    if state.completed {
      this.slot.settle(&mut state.readers);
      return Poll::Ready(false);
    }
    this.slot.park(&mut state.readers, cx.waker());
    Poll::Pending
  }
}

impl<T> Drop for WaitToReadFuture<'_, T> {
  fn drop(&mut self) {
    abandon_reader(self.channel, &mut self.slot);
  }
}

/// Resolves to `true` once a write would be admitted without waiting, `false`
/// once the channel is complete.
#[must_use = "futures do nothing unless you .await or poll them"]
#[derive(Debug)]
pub struct WaitToWriteFuture<'a, T> {
  channel: &'a Channel<T>,
  slot: WaitSlot,
}

impl<'a, T> WaitToWriteFuture<'a, T> {
  pub(super) fn new(channel: &'a Channel<T>) -> Self {
    Self {
      channel,
      slot: WaitSlot::default(),
    }
  }
}

impl<T> Future for WaitToWriteFuture<'_, T> {
  type Output = bool;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<bool> {
    let this = self.get_mut();
    let mut state = this.channel.state.lock();
    if state.completed {
      this.slot.settle(&mut state.writers);
      return Poll::Ready(false);
    }
    if this.channel.has_room_locked(&state) {
      let next = this.slot.abandon(&mut state.writers);
      drop(state);
      if let Some(next) = next {
        next.wake();
      }
      return Poll::Ready(true);
    }
    this.slot.park(&mut state.writers, cx.waker());
    Poll::Pending
  }
}

impl<T> Drop for WaitToWriteFuture<'_, T> {
  fn drop(&mut self) {
    abandon_writer(self.channel, &mut self.slot);
  }
}

// --- Stream ---

impl<T> Stream for ChannelReader<T> {
  type Item = T;

  fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
    let this = self.get_mut();
    match poll_read(&this.channel, &mut this.stream_slot, cx) {
      Poll::Ready(Ok(item)) => Poll::Ready(Some(item)),
      // Completed and drained.
      Poll::Ready(Err(_)) => Poll::Ready(None),
      Poll::Pending => Poll::Pending,
    }
  }
}

impl<T> Drop for ChannelReader<T> {
  fn drop(&mut self) {
    abandon_reader(&self.channel, &mut self.stream_slot);
  }
}
