mod common;
use common::*;

use conduit::{
  channel, CancellationToken, ChannelSettings, FullMode, ReadError, WriteError,
};
use futures_util::StreamExt;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancelled_read_leaves_channel_unchanged() {
  let (writer, reader) = channel::unbounded::<u32>(&ChannelSettings::default());
  let token = CancellationToken::new();

  let cancel = token.clone();
  tokio::spawn(async move {
    tokio::time::sleep(SHORT_TIMEOUT).await;
    cancel.cancel();
  });
  assert_eq!(reader.read_cancellable(&token).await, Err(ReadError::Cancelled));

  // An already cancelled token fails fast even when an item is available.
  writer.try_write(1).unwrap();
  assert_eq!(reader.read_cancellable(&token).await, Err(ReadError::Cancelled));
  assert_eq!(reader.len(), 1);
  assert_eq!(reader.read_cancellable(&CancellationToken::new()).await, Ok(1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancelled_write_is_not_enqueued() {
  let settings = ChannelSettings::new()
    .with_bounded_capacity(1)
    .with_full_mode(FullMode::Wait);
  let (writer, reader) = channel::bounded::<u32>(&settings).unwrap();
  writer.write(1).await.unwrap();

  let token = CancellationToken::new();
  let cancel = token.clone();
  tokio::spawn(async move {
    tokio::time::sleep(SHORT_TIMEOUT).await;
    cancel.cancel();
  });

  let err = writer.write_cancellable(2, &token).await.unwrap_err();
  assert!(matches!(err, WriteError::Cancelled(_)));
  assert_eq!(err.into_inner(), 2);
  assert_eq!(reader.drain(), vec![1]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn async_writer_waits_for_space() {
  let settings = ChannelSettings::new().with_bounded_capacity(2);
  let (writer, reader) = channel::bounded::<u32>(&settings).unwrap();

  let producer = tokio::spawn(async move {
    for i in 0..ITEMS_LOW as u32 {
      writer.write(i).await.unwrap();
    }
    writer.complete().unwrap();
  });

  let mut received = Vec::new();
  while let Ok(item) = reader.read().await {
    received.push(item);
  }
  producer.await.unwrap();
  assert_eq!(received, (0..ITEMS_LOW as u32).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn wait_to_read_and_wait_to_write() {
  let settings = ChannelSettings::new().with_bounded_capacity(1);
  let (writer, reader) = channel::bounded::<u32>(&settings).unwrap();

  assert!(writer.wait_to_write().await);
  writer.try_write(1).unwrap();
  assert!(reader.wait_to_read().await);
  // Waiting does not consume.
  assert_eq!(reader.len(), 1);

  let waiting_writer = writer.clone();
  let space = tokio::spawn(async move { waiting_writer.wait_to_write().await });
  tokio::time::sleep(SHORT_TIMEOUT).await;
  assert_eq!(reader.try_read(), Ok(1));
  assert!(tokio::time::timeout(LONG_TIMEOUT, space).await.unwrap().unwrap());

  writer.complete().unwrap();
  assert!(!reader.wait_to_read().await);
  assert!(!writer.wait_to_write().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reader_stream_ends_after_completion() {
  let (writer, reader) = channel::unbounded::<u32>(&ChannelSettings::default());
  let producer = tokio::task::spawn_blocking(move || {
    for i in 0..ITEMS_LOW as u32 {
      writer.write_blocking(i).unwrap();
    }
    writer.complete().unwrap();
  });

  let received: Vec<u32> = reader.collect().await;
  producer.await.unwrap();
  assert_eq!(received, (0..ITEMS_LOW as u32).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn dropped_read_future_is_clean_cancellation() {
  let (writer, reader) = channel::unbounded::<u32>(&ChannelSettings::default());

  let timed_out = tokio::time::timeout(Duration::from_millis(20), reader.read()).await;
  assert!(timed_out.is_err());

  writer.try_write(9).unwrap();
  assert_eq!(reader.read().await, Ok(9));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readiness_listener_does_not_starve_reader() {
  let (writer, reader) = channel::unbounded::<u32>(&ChannelSettings::default());

  let listener = reader.clone();
  let listening = tokio::spawn(async move { listener.wait_to_read().await });
  tokio::time::sleep(SHORT_TIMEOUT).await;

  let consumer = reader.clone();
  let consuming = tokio::spawn(async move { consumer.read().await });
  tokio::time::sleep(SHORT_TIMEOUT).await;

  writer.try_write(7).unwrap();

  assert!(tokio::time::timeout(LONG_TIMEOUT, listening).await.unwrap().unwrap());
  let read = tokio::time::timeout(LONG_TIMEOUT, consuming).await;
  assert_eq!(read.unwrap().unwrap(), Ok(7));
  assert!(reader.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readiness_listener_does_not_starve_writer() {
  let settings = ChannelSettings::new().with_bounded_capacity(1);
  let (writer, reader) = channel::bounded::<u32>(&settings).unwrap();
  writer.try_write(0).unwrap();

  let listener = writer.clone();
  let listening = tokio::spawn(async move { listener.wait_to_write().await });
  tokio::time::sleep(SHORT_TIMEOUT).await;

  let producer = writer.clone();
  let producing = tokio::spawn(async move { producer.write(1).await });
  tokio::time::sleep(SHORT_TIMEOUT).await;

  assert_eq!(reader.try_read(), Ok(0));

  assert!(tokio::time::timeout(LONG_TIMEOUT, listening).await.unwrap().unwrap());
  let written = tokio::time::timeout(LONG_TIMEOUT, producing).await;
  assert!(written.unwrap().unwrap().is_ok());
  assert_eq!(reader.read().await, Ok(1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn listener_loops_and_readers_share_the_stream() {
  let settings = ChannelSettings::new()
    .with_bounded_capacity(8)
    .with_single_reader(false);
  let (writer, reader) = channel::bounded::<usize>(&settings).unwrap();

  // Consumers in the wait-then-drain style.
  let mut consumers = Vec::new();
  for _ in 0..2 {
    let reader = reader.clone();
    consumers.push(tokio::spawn(async move {
      let mut received = Vec::new();
      while reader.wait_to_read().await {
        while let Ok(item) = reader.try_read() {
          received.push(item);
        }
      }
      received
    }));
  }
  // Consumers reading one item at a time.
  for _ in 0..2 {
    let reader = reader.clone();
    consumers.push(tokio::spawn(async move {
      let mut received = Vec::new();
      while let Ok(item) = reader.read().await {
        received.push(item);
      }
      received
    }));
  }

  for i in 0..ITEMS_HIGH {
    writer.write(i).await.unwrap();
  }
  writer.complete().unwrap();

  let mut all = Vec::with_capacity(ITEMS_HIGH);
  for consumer in consumers {
    let received = tokio::time::timeout(STRESS_TIMEOUT, consumer).await;
    all.extend(received.unwrap().unwrap());
  }
  all.sort_unstable();
  assert_eq!(all, (0..ITEMS_HIGH).collect::<Vec<_>>());
}
