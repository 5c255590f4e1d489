use chrono::{Duration, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use ticketing_core::adapters::{BroadcastNotifier, ChannelPublisher, MemoryStore, StaticCatalog};
use ticketing_core::models::{BillingAddress, Money, NewStockUnit, Order, OrderItem, OrderStatus, PaymentDetails, SaleWindow};
use ticketing_core::ports::{PaymentGateway, PaymentGatewayError, PaymentOutcome};
use ticketing_core::{
  mint_tickets, CoreSettings, FulfillmentDeps, FulfillmentService, ReservationManager, StockLedger, SystemClock,
  TicketSigner,
};
use tokio::runtime::Runtime;
use uuid::Uuid;

const SECRET: &[u8] = b"bench-secret";

struct InstantGateway;

#[async_trait::async_trait]
impl PaymentGateway for InstantGateway {
  async fn process_payment(&self, _method_ref: &str, _amount: &Money) -> Result<PaymentOutcome, PaymentGatewayError> {
    Ok(PaymentOutcome::approved("bench"))
  }
}

fn billing() -> BillingAddress {
  BillingAddress {
    full_name: "Bench Buyer".to_string(),
    email: "bench@example.com".to_string(),
    line1: "1 Loop Rd".to_string(),
    city: "Cupertino".to_string(),
    country: "US".to_string(),
  }
}

fn order_with_item(quantity: u32) -> (Order, OrderItem) {
  let order = Order {
    id: Uuid::new_v4(),
    public_code: Order::generate_public_code(),
    owner_id: Uuid::new_v4(),
    total: Money::new(2000 * i64::from(quantity), "USD"),
    status: OrderStatus::Completed,
    payment_ref: Some("bench".to_string()),
    billing_address: billing(),
    created_at: Utc::now(),
  };
  let item = OrderItem {
    id: Uuid::new_v4(),
    order_id: order.id,
    stock_unit_ref: Uuid::new_v4(),
    quantity,
    price_at_purchase: Money::new(2000, "USD"),
  };
  (order, item)
}

fn bench_signatures(c: &mut Criterion) {
  let signer = TicketSigner::new(SECRET).unwrap();
  let (event, owner) = (Uuid::new_v4(), Uuid::new_v4());
  let payload = signer.sign("TKT-BENCH-01", event, owner);

  let mut group = c.benchmark_group("Signatures");
  group.throughput(Throughput::Elements(1));
  group.bench_function("sign", |b| b.iter(|| signer.sign("TKT-BENCH-01", event, owner)));
  group.bench_function("verify", |b| b.iter(|| signer.verify(&payload).unwrap()));
  group.finish();
}

fn bench_minting(c: &mut Criterion) {
  let signer = TicketSigner::new(SECRET).unwrap();
  let event = Uuid::new_v4();

  let mut group = c.benchmark_group("MintTickets");
  for quantity in [1u32, 10, 100].iter() {
    let (order, item) = order_with_item(*quantity);
    group.throughput(Throughput::Elements(u64::from(*quantity)));
    group.bench_with_input(BenchmarkId::from_parameter(quantity), quantity, |b, _| {
      b.iter(|| mint_tickets(&order, &item, event, "Bench Buyer", &signer))
    });
  }
  group.finish();
}

fn bench_checkout(c: &mut Criterion) {
  let rt = Runtime::new().unwrap();
  let settings = CoreSettings::new(SECRET);
  let event = Uuid::new_v4();
  let store = Arc::new(MemoryStore::new());
  let clock = Arc::new(SystemClock);
  let notifier = Arc::new(BroadcastNotifier::new(64));
  let (publisher, mut bus) = ChannelPublisher::new(1024);
  rt.spawn(async move { while bus.recv().await.is_some() {} });

  let ledger = StockLedger::new(
    store.clone(),
    Arc::new(StaticCatalog::new([event])),
    clock.clone(),
    notifier.clone(),
    settings.clone(),
  );
  let reservations = ReservationManager::new(store.clone(), clock.clone(), notifier.clone(), settings.clone());
  let fulfillment = FulfillmentService::new(FulfillmentDeps {
    store: store.clone(),
    payments: Arc::new(InstantGateway),
    publisher: Arc::new(publisher),
    notifier: notifier.clone(),
    clock: clock.clone(),
    signer: TicketSigner::new(SECRET).unwrap(),
    settings: settings.clone(),
  })
  .unwrap();

  let unit = rt
    .block_on(ledger.register(NewStockUnit {
      event_ref: event,
      name: "Bench".to_string(),
      description: None,
      price: Money::new(2000, "USD"),
      total_quantity: u32::MAX,
      min_per_order: 1,
      max_per_order: 10,
      sale_window: SaleWindow {
        start: Utc::now() - Duration::hours(1),
        end: Utc::now() + Duration::days(365),
      },
    }))
    .unwrap();

  let mut group = c.benchmark_group("Checkout");
  group.throughput(Throughput::Elements(2));
  group.bench_function("hold_and_commit_two_tickets", |b| {
    b.to_async(&rt).iter(|| async {
      let owner = Uuid::new_v4();
      reservations.add_hold(owner, unit.id, 2).await.unwrap();
      fulfillment
        .commit_order(
          owner,
          PaymentDetails {
            method_ref: "card_bench".to_string(),
            billing_address: billing(),
          },
        )
        .await
        .unwrap()
    })
  });
  group.finish();
}

criterion_group!(benches, bench_signatures, bench_minting, bench_checkout);
criterion_main!(benches);
