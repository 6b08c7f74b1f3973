//! FIFO queues of parked readers or writers.
//!
//! A channel keeps one `WaiterQueue` for readers and one for writers. Blocking
//! operations park their thread, async operations park their task's waker, and
//! both share a single queue so wake-ups are handed out in arrival order
//! regardless of paradigm.
//!
//! Every waiter gets an id. A waiter that gives up (timeout, cancellation, or a
//! dropped future) removes itself by id; if it is no longer queued it has
//! already been notified, and the notification must be passed on to the next
//! waiter so that no wake-up is lost.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::Waker;
use std::thread::{self, Thread};

pub(crate) type WaiterId = u64;

#[derive(Debug)]
enum Parker {
  Thread { thread: Thread, done: Arc<AtomicBool> },
  Task(Waker),
}

/// A waiter that has been removed from its queue and must be woken.
///
/// Waking happens after the channel lock is released.
#[derive(Debug)]
#[must_use = "a notified waiter must be woken"]
pub(crate) struct Notified(Parker);

impl Notified {
  pub(crate) fn wake(self) {
    match self.0 {
      Parker::Thread { thread, done } => {
        done.store(true, Ordering::Release);
        thread.unpark();
      }
      Parker::Task(waker) => waker.wake(),
    }
  }
}

#[derive(Debug, Default)]
pub(crate) struct WaiterQueue {
  waiters: VecDeque<(WaiterId, Parker)>,
  next_id: WaiterId,
}

impl WaiterQueue {
  fn push(&mut self, parker: Parker) -> WaiterId {
    let id = self.next_id;
    self.next_id = self.next_id.wrapping_add(1);
    self.waiters.push_back((id, parker));
    id
  }

  /// Queues the current thread. The returned flag flips to `true` once notified.
  pub(crate) fn park_thread(&mut self) -> (WaiterId, Arc<AtomicBool>) {
    let done = Arc::new(AtomicBool::new(false));
    let id = self.push(Parker::Thread {
      thread: thread::current(),
      done: Arc::clone(&done),
    });
    (id, done)
  }

  pub(crate) fn park_task(&mut self, waker: &Waker) -> WaiterId {
    self.push(Parker::Task(waker.clone()))
  }

  /// Updates the waker of a task that is still queued.
  ///
  /// Returns `false` if the waiter is no longer queued, i.e. it was notified.
  pub(crate) fn refresh_task(&mut self, id: WaiterId, waker: &Waker) -> bool {
    match self.waiters.iter_mut().find(|(queued, _)| *queued == id) {
      Some((_, Parker::Task(existing))) => {
        if !existing.will_wake(waker) {
          *existing = waker.clone();
        }
        true
      }
      Some((_, parker)) => {
        *parker = Parker::Task(waker.clone());
        true
      }
      None => false,
    }
  }

  /// Removes a waiter that stopped waiting.
  ///
  /// Returns `false` if it had already been notified.
  pub(crate) fn cancel(&mut self, id: WaiterId) -> bool {
    match self.waiters.iter().position(|(queued, _)| *queued == id) {
      Some(index) => {
        self.waiters.remove(index);
        true
      }
      None => false,
    }
  }

  pub(crate) fn notify_one(&mut self) -> Option<Notified> {
    self.waiters.pop_front().map(|(_, parker)| Notified(parker))
  }

  pub(crate) fn notify_all(&mut self) -> Vec<Notified> {
    self
      .waiters
      .drain(..)
      .map(|(_, parker)| Notified(parker))
      .collect()
  }

  #[cfg(test)]
  pub(crate) fn len(&self) -> usize {
    self.waiters.len()
  }
}

/// The registration of one async operation in a `WaiterQueue`.
#[derive(Debug, Default)]
pub(crate) struct WaitSlot {
  id: Option<WaiterId>,
}

impl WaitSlot {
  pub(crate) fn is_parked(&self) -> bool {
    self.id.is_some()
  }

  /// Queues the task, or refreshes its waker if it is still queued.
  pub(crate) fn park(&mut self, queue: &mut WaiterQueue, waker: &Waker) {
    match self.id {
      Some(id) if queue.refresh_task(id, waker) => {}
      _ => self.id = Some(queue.park_task(waker)),
    }
  }

  /// The operation completed. A pending notification, if any, was consumed.
  pub(crate) fn settle(&mut self, queue: &mut WaiterQueue) {
    if let Some(id) = self.id.take() {
      queue.cancel(id);
    }
  }

  /// The operation gave up, or finished without consuming what it was
  /// notified about. Returns the next waiter to wake if this one had been
  /// notified without using it.
  pub(crate) fn abandon(&mut self, queue: &mut WaiterQueue) -> Option<Notified> {
    let id = self.id.take()?;
    if queue.cancel(id) {
      None
    } else {
      queue.notify_one()
    }
  }
}
