mod common;
use common::*;

use conduit::{channel, Channel, ChannelSettings, FullMode, ReadError, TryWriteError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

fn settings(capacity: usize, mode: FullMode) -> ChannelSettings {
  ChannelSettings::new()
    .with_bounded_capacity(capacity)
    .with_full_mode(mode)
}

#[test]
fn drop_oldest_never_blocks_and_keeps_newest() {
  let (writer, reader) = channel::bounded::<u32>(&settings(5, FullMode::DropOldest)).unwrap();
  for i in 1..=6 {
    writer.write_blocking(i).unwrap();
  }
  assert_eq!(reader.len(), 5);
  assert_eq!(reader.drain(), vec![2, 3, 4, 5, 6]);
}

#[test]
fn wait_mode_blocks_sixth_writer_until_read() {
  let (writer, reader) = channel::bounded::<u32>(&settings(5, FullMode::Wait)).unwrap();
  for i in 1..=5 {
    writer.try_write(i).unwrap();
  }
  assert!(matches!(writer.try_write(6), Err(TryWriteError::Full(6))));

  let written = Arc::new(AtomicBool::new(false));
  let flag = Arc::clone(&written);
  let blocked = writer.clone();
  let handle = thread::spawn(move || {
    blocked.write_blocking(6).unwrap();
    flag.store(true, Ordering::SeqCst);
  });

  thread::sleep(SHORT_TIMEOUT);
  assert!(!written.load(Ordering::SeqCst), "sixth write must wait for space");

  assert_eq!(reader.read_blocking(), Ok(1));
  handle.join().unwrap();
  assert!(written.load(Ordering::SeqCst));
  assert_eq!(reader.drain(), vec![2, 3, 4, 5, 6]);
}

#[test]
fn unbounded_accepts_many_writes_without_blocking() {
  let (writer, reader) = channel::unbounded::<usize>(&ChannelSettings::default());
  for i in 0..ITEMS_UNBOUNDED {
    writer.try_write(i).unwrap();
  }
  assert_eq!(reader.len(), ITEMS_UNBOUNDED);
  assert_eq!(reader.try_read(), Ok(0));
}

#[test]
fn waiting_writers_are_admitted_in_order() {
  let channel = Arc::new(Channel::<u32>::bounded(&settings(1, FullMode::Wait)).unwrap());
  let writer = channel.writer();
  let reader = channel.reader();
  writer.try_write(0).unwrap();

  let mut handles = Vec::new();
  for i in 1..=3 {
    let writer = writer.clone();
    handles.push(thread::spawn(move || writer.write_blocking(i).unwrap()));
    // Stagger so the writers queue up in a known order.
    thread::sleep(SHORT_TIMEOUT);
  }

  let mut seen = Vec::new();
  for _ in 0..4 {
    seen.push(reader.read_timeout(LONG_TIMEOUT).unwrap());
  }
  for handle in handles {
    handle.join().unwrap();
  }
  assert_eq!(seen, vec![0, 1, 2, 3]);
}

#[test]
fn blocked_readers_all_observe_completion() {
  let (writer, reader) = channel::unbounded::<u32>(&ChannelSettings::default());
  let handles: Vec<_> = (0..4)
    .map(|_| {
      let reader = reader.clone();
      thread::spawn(move || reader.read_blocking())
    })
    .collect();

  thread::sleep(SHORT_TIMEOUT);
  writer.complete().unwrap();

  for handle in handles {
    assert_eq!(handle.join().unwrap(), Err(ReadError::Completed));
  }
}

#[test]
fn many_producers_many_consumers_deliver_everything() {
  let (writer, reader) = channel::bounded::<usize>(&settings(16, FullMode::Wait)).unwrap();
  let producers = 4;
  let per_producer = ITEMS_HIGH / producers;

  let producer_handles: Vec<_> = (0..producers)
    .map(|p| {
      let writer = writer.clone();
      thread::spawn(move || {
        for i in 0..per_producer {
          writer.write_blocking(p * per_producer + i).unwrap();
        }
      })
    })
    .collect();

  let consumer_handles: Vec<_> = (0..2)
    .map(|_| {
      let reader = reader.clone();
      thread::spawn(move || {
        let mut received = Vec::new();
        while let Ok(item) = reader.read_timeout(STRESS_TIMEOUT) {
          received.push(item);
        }
        received
      })
    })
    .collect();

  for handle in producer_handles {
    handle.join().unwrap();
  }
  writer.complete().unwrap();

  let mut all: Vec<usize> = consumer_handles
    .into_iter()
    .flat_map(|h| h.join().unwrap())
    .collect();
  all.sort_unstable();
  assert_eq!(all, (0..ITEMS_HIGH).collect::<Vec<_>>());
}
