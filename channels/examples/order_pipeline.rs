// examples/order_pipeline.rs
//
// Run with `RUST_LOG=conduit=debug cargo run --example order_pipeline` to see
// channel creation and registration logged.
use conduit::{
  CancellationToken, ChannelContainerExt, ChannelReader, ChannelSettings, ChannelWriter, FullMode,
  ReadError,
};
use conduit_ioc::{resolve, Container};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct OrderPlaced {
  id: u32,
  amount_cents: u64,
}

#[derive(Debug)]
struct AuditLine(String);

// A producer only ever sees the writer half.
struct Checkout {
  orders: Arc<ChannelWriter<OrderPlaced>>,
}

impl Checkout {
  async fn place(&self, id: u32, amount_cents: u64) {
    if let Err(err) = self.orders.write(OrderPlaced { id, amount_cents }).await {
      info!(%err, "order {} rejected", id);
    }
  }
}

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  println!("--- Registering channels ---");
  let container = Container::new();
  container
    .add_bounded_channel::<OrderPlaced>(
      ChannelSettings::new()
        .with_bounded_capacity(8)
        .with_full_mode(FullMode::Wait),
    )
    .expect("order channel")
    .add_bounded_channel::<AuditLine>(
      ChannelSettings::new()
        .with_bounded_capacity(4)
        .with_full_mode(FullMode::DropOldest),
    )
    .expect("audit channel");
  container.add_singleton(|c: &Container| Checkout {
    orders: resolve!(c, ChannelWriter<OrderPlaced>),
  });
  println!("Registered services: {:#?}", container.service_names());

  println!("\n--- Running the pipeline ---");
  let orders = resolve!(container, ChannelReader<OrderPlaced>);
  let audit_writer = resolve!(container, ChannelWriter<AuditLine>);
  let shutdown = CancellationToken::new();

  let consumer_shutdown = shutdown.clone();
  let consumer = tokio::spawn(async move {
    let mut total = 0u64;
    loop {
      match orders.read_cancellable(&consumer_shutdown).await {
        Ok(order) => {
          total += order.amount_cents;
          // The audit channel drops its oldest line rather than stalling orders.
          let _ = audit_writer.try_write(AuditLine(format!("order {} processed", order.id)));
        }
        Err(ReadError::Completed) => break,
        Err(ReadError::Cancelled) => {
          info!("consumer cancelled");
          break;
        }
        Err(ReadError::Timeout) => unreachable!("no deadline was set"),
      }
    }
    total
  });

  let checkout = resolve!(container, Checkout);
  for id in 1..=20 {
    checkout.place(id, 1_000 + u64::from(id)).await;
  }
  resolve!(container, ChannelWriter<OrderPlaced>)
    .complete()
    .expect("complete orders");

  let total = tokio::time::timeout(Duration::from_secs(5), consumer)
    .await
    .expect("consumer finished")
    .expect("consumer task");
  shutdown.cancel();
  println!("Processed orders totalling {} cents", total);

  println!("\n--- Audit trail (newest 4 kept) ---");
  let audit = resolve!(container, ChannelReader<AuditLine>);
  for AuditLine(line) in audit.drain() {
    println!("  {}", line);
  }
}
