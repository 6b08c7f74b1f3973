//! Blocking write and read, parking the calling thread.

use super::backoff::adaptive_wait;
use super::core::Admission;
use super::Channel;
use crate::error::{ReadError, WriteError};

use std::sync::atomic::Ordering;
use std::time::Instant;

fn deadline_passed(deadline: Option<Instant>) -> bool {
  deadline.is_some_and(|deadline| Instant::now() >= deadline)
}

/// Writes `item`, parking while a `FullMode::Wait` channel is at capacity.
///
/// Returns `WriteError::Timeout` with the item if `deadline` passes first.
pub(crate) fn write_blocking<T>(
  channel: &Channel<T>,
  item: T,
  deadline: Option<Instant>,
) -> Result<(), WriteError<T>> {
  let mut pending = item;

  loop {
    // --- Phase 1: Offer the item, or commit to parking under the same lock ---
    let (id, done) = {
      let mut state = channel.state.lock();
      match channel.admit_locked(&mut state, pending) {
        Admission::Accepted(effects) => {
          drop(state);
          channel.finish_write(effects);
          return Ok(());
        }
        Admission::Completed(item) => return Err(WriteError::Completed(item)),
        Admission::Full(item) => {
          if deadline_passed(deadline) {
            return Err(WriteError::Timeout(item));
          }
          pending = item;
          state.writers.park_thread()
        }
      }
    };

    // --- Phase 2: Wait for a reader to free a slot ---
    if adaptive_wait(|| done.load(Ordering::Acquire), deadline) {
      continue;
    }

    // --- Phase 3: Timed out. Deregister and make one last attempt ---
    let mut state = channel.state.lock();
    let notified = !state.writers.cancel(id);
    match channel.admit_locked(&mut state, pending) {
      Admission::Accepted(effects) => {
        drop(state);
        channel.finish_write(effects);
        return Ok(());
      }
      Admission::Completed(item) => return Err(WriteError::Completed(item)),
      Admission::Full(item) => {
        // A notification that raced with the timeout belongs to the next writer.
        let next = if notified {
          state.writers.notify_one()
        } else {
          None
        };
        drop(state);
        if let Some(next) = next {
          next.wake();
        }
        return Err(WriteError::Timeout(item));
      }
    }
  }
}

/// Reads the oldest item, parking while the channel is empty and not complete.
pub(crate) fn read_blocking<T>(
  channel: &Channel<T>,
  deadline: Option<Instant>,
) -> Result<T, ReadError> {
  loop {
    // --- Phase 1: Take an item, or commit to parking under the same lock ---
    let (id, done) = {
      let mut state = channel.state.lock();
      if let Some((item, writer)) = channel.take_locked(&mut state) {
        drop(state);
        if let Some(writer) = writer {
          writer.wake();
        }
        return Ok(item);
      }
      if state.completed {
        return Err(ReadError::Completed);
      }
      if deadline_passed(deadline) {
        return Err(ReadError::Timeout);
      }
      state.readers.park_thread()
    };

    // --- Phase 2: Wait for a writer ---
    if adaptive_wait(|| done.load(Ordering::Acquire), deadline) {
      continue;
    }

    // --- Phase 3: Timed out. Deregister and make one last attempt ---
    let mut state = channel.state.lock();
    let notified = !state.readers.cancel(id);
    if let Some((item, writer)) = channel.take_locked(&mut state) {
      drop(state);
      if let Some(writer) = writer {
        writer.wake();
      }
      return Ok(item);
    }
    if state.completed {
      return Err(ReadError::Completed);
    }
    let next = if notified {
      state.readers.notify_one()
    } else {
      None
    };
    drop(state);
    if let Some(next) = next {
      next.wake();
    }
    return Err(ReadError::Timeout);
  }
}
