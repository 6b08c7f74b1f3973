//! The shared state of a channel and the operations performed under its lock.
//!
//! ### Design Principles:
//!
//! 1.  **Central Mutex**: a `parking_lot::Mutex` guards the buffer, both waiter
//!     queues and the completion flag. Every decision (admit, drop, park) is made
//!     while holding it, so there is no window for a lost wake-up between a
//!     failed attempt and parking.
//! 2.  **Wake outside the lock**: locked operations return the waiters to wake
//!     (and any item evicted by a full-mode policy) to the caller, which acts on
//!     them after releasing the lock.
//! 3.  **Capacity is the only reason to wait**: writers only ever wait on a
//!     bounded channel in `FullMode::Wait`; every other configuration admits the
//!     write immediately.

use super::waiter::{Notified, WaiterQueue};
use super::Channel;
use crate::error::{CompleteError, TryReadError, TryWriteError};
use crate::settings::FullMode;
use std::collections::VecDeque;
use tracing::{debug, trace};

#[derive(Debug)]
pub(crate) struct ChannelState<T> {
  /// Buffered items, oldest first.
  pub(crate) queue: VecDeque<T>,
  /// Readers waiting for an item (or for completion).
  pub(crate) readers: WaiterQueue,
  /// Writers waiting for capacity.
  pub(crate) writers: WaiterQueue,
  /// Set once by `complete`; no writes are admitted afterwards.
  pub(crate) completed: bool,
}

impl<T> ChannelState<T> {
  pub(crate) fn new(capacity: Option<usize>) -> Self {
    Self {
      queue: VecDeque::with_capacity(capacity.map_or(32, |cap| cap.min(1024))),
      readers: WaiterQueue::default(),
      writers: WaiterQueue::default(),
      completed: false,
    }
  }
}

/// Side effects of an admitted write, applied once the lock is released.
#[must_use]
pub(crate) struct WriteEffects<T> {
  reader: Option<Notified>,
  dropped: Option<T>,
}

/// Outcome of offering an item to the channel under its lock.
pub(crate) enum Admission<T> {
  Accepted(WriteEffects<T>),
  /// Bounded, `FullMode::Wait`, and at capacity. The item is handed back.
  Full(T),
  Completed(T),
}

impl<T> Channel<T> {
  /// Returns `true` if a write would be admitted without waiting.
  pub(crate) fn has_room_locked(&self, state: &ChannelState<T>) -> bool {
    match self.capacity {
      None => true,
      Some(cap) => state.queue.len() < cap || self.full_mode != FullMode::Wait,
    }
  }

  /// Offers `item` to the buffer, applying the full-mode policy when at capacity.
  pub(crate) fn admit_locked(&self, state: &mut ChannelState<T>, item: T) -> Admission<T> {
    if state.completed {
      return Admission::Completed(item);
    }

    let at_capacity = self.capacity.is_some_and(|cap| state.queue.len() >= cap);
    let dropped = if at_capacity {
      match self.full_mode {
        FullMode::Wait => return Admission::Full(item),
        FullMode::DropOldest => {
          let oldest = state.queue.pop_front();
          state.queue.push_back(item);
          oldest
        }
        FullMode::DropNewest => {
          let newest = state.queue.pop_back();
          state.queue.push_back(item);
          newest
        }
        FullMode::DropWrite => {
          return Admission::Accepted(WriteEffects {
            reader: None,
            dropped: Some(item),
          })
        }
      }
    } else {
      state.queue.push_back(item);
      None
    };

    Admission::Accepted(WriteEffects {
      reader: state.readers.notify_one(),
      dropped,
    })
  }

  /// Wakes the reader chosen by an admitted write and disposes of an evicted item.
  pub(crate) fn finish_write(&self, effects: WriteEffects<T>) {
    if let Some(reader) = effects.reader {
      reader.wake();
    }
    if let Some(item) = effects.dropped {
      trace!(mode = ?self.full_mode, "channel full, item dropped");
      if let Some(on_dropped) = &self.on_dropped {
        on_dropped(item);
      }
    }
  }

  /// Pops the oldest item. Freeing a slot of a bounded channel notifies one writer.
  pub(crate) fn take_locked(&self, state: &mut ChannelState<T>) -> Option<(T, Option<Notified>)> {
    let item = state.queue.pop_front()?;
    let writer = if self.capacity.is_some() {
      state.writers.notify_one()
    } else {
      None
    };
    Some((item, writer))
  }

  pub(crate) fn try_write_core(&self, item: T) -> Result<(), TryWriteError<T>> {
    let mut state = self.state.lock();
    match self.admit_locked(&mut state, item) {
      Admission::Accepted(effects) => {
        drop(state);
        self.finish_write(effects);
        Ok(())
      }
      Admission::Full(item) => Err(TryWriteError::Full(item)),
      Admission::Completed(item) => Err(TryWriteError::Completed(item)),
    }
  }

  pub(crate) fn try_read_core(&self) -> Result<T, TryReadError> {
    let mut state = self.state.lock();
    match self.take_locked(&mut state) {
      Some((item, writer)) => {
        drop(state);
        if let Some(writer) = writer {
          writer.wake();
        }
        Ok(item)
      }
      None if state.completed => Err(TryReadError::Completed),
      None => Err(TryReadError::Empty),
    }
  }

  /// Removes every buffered item, waking all writers waiting for space.
  pub(crate) fn drain_core(&self) -> Vec<T> {
    let (items, writers) = {
      let mut state = self.state.lock();
      let items: Vec<T> = state.queue.drain(..).collect();
      (items, state.writers.notify_all())
    };
    for writer in writers {
      writer.wake();
    }
    items
  }

  /// Marks the channel complete and wakes every waiter so it can observe it.
  pub(crate) fn complete_core(&self) -> Result<(), CompleteError> {
    let (readers, writers, remaining) = {
      let mut state = self.state.lock();
      if state.completed {
        return Err(CompleteError);
      }
      state.completed = true;
      (
        state.readers.notify_all(),
        state.writers.notify_all(),
        state.queue.len(),
      )
    };
    debug!(
      payload = std::any::type_name::<T>(),
      remaining, "channel completed"
    );
    for waiter in readers.into_iter().chain(writers) {
      waiter.wake();
    }
    Ok(())
  }
}
