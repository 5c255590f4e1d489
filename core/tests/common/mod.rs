// tests/common/mod.rs
#![allow(dead_code)] // Not every test file uses every helper

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use ticketing_core::adapters::{MemoryStore, StaticCatalog};
use ticketing_core::models::{BillingAddress, Money, NewStockUnit, PaymentDetails, SaleWindow, StockUnit, Ticket};
use ticketing_core::ports::{
  DomainEvent, EventPublisher, LiveNotifier, LiveUpdate, NotifyError, PaymentGateway, PaymentGatewayError,
  PaymentOutcome, PublishError, StoreTx, TicketingStore,
};
use ticketing_core::{
  CheckInService, CoreSettings, FulfillmentDeps, FulfillmentService, ManualClock, ReservationManager, StockLedger,
  TicketSigner,
};
use tokio::sync::oneshot;
use tracing::Level;
use uuid::Uuid;

pub const SECRET: &[u8] = b"integration-test-secret";

// --- Helper for Tracing Setup (call once per test run if needed) ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub fn start_time() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
}

// --- Test doubles ---

/// Records every live update; can be told to fail.
#[derive(Default)]
pub struct RecordingNotifier {
  pub updates: Mutex<Vec<LiveUpdate>>,
  pub fail: AtomicBool,
}

impl RecordingNotifier {
  pub fn updates(&self) -> Vec<LiveUpdate> {
    self.updates.lock().clone()
  }
}

impl LiveNotifier for RecordingNotifier {
  fn push(&self, update: LiveUpdate) -> Result<(), NotifyError> {
    if self.fail.load(Ordering::SeqCst) {
      return Err(NotifyError("socket closed".to_string()));
    }
    self.updates.lock().push(update);
    Ok(())
  }
}

/// Records published events; can be told to fail.
#[derive(Default)]
pub struct RecordingPublisher {
  pub events: Mutex<Vec<DomainEvent>>,
  pub fail: AtomicBool,
}

impl RecordingPublisher {
  pub fn events(&self) -> Vec<DomainEvent> {
    self.events.lock().clone()
  }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
  async fn publish(&self, event: DomainEvent) -> Result<(), PublishError> {
    if self.fail.load(Ordering::SeqCst) {
      return Err(PublishError {
        topic: event.topic().to_string(),
        reason: "broker unreachable".to_string(),
      });
    }
    self.events.lock().push(event);
    Ok(())
  }
}

/// Approves everything except `fail*` methods (declined) and `down*` methods
/// (transport error). A charge can be paused mid-flight with [`ScriptedGateway::pause_next_charge`].
#[derive(Default)]
pub struct ScriptedGateway {
  pub calls: AtomicUsize,
  pause: Mutex<Option<(oneshot::Sender<()>, oneshot::Receiver<()>)>>,
}

impl ScriptedGateway {
  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  /// Returns (charge started, release charge).
  pub fn pause_next_charge(&self) -> (oneshot::Receiver<()>, oneshot::Sender<()>) {
    let (started_tx, started_rx) = oneshot::channel();
    let (release_tx, release_rx) = oneshot::channel();
    *self.pause.lock() = Some((started_tx, release_rx));
    (started_rx, release_tx)
  }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
  async fn process_payment(&self, method_ref: &str, amount: &Money) -> Result<PaymentOutcome, PaymentGatewayError> {
    let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
    let paused = self.pause.lock().take();
    if let Some((started, release)) = paused {
      let _ = started.send(());
      let _ = release.await;
    }
    if method_ref.starts_with("down") {
      return Err(PaymentGatewayError::Transport("connection refused".to_string()));
    }
    if method_ref.starts_with("fail") {
      return Ok(PaymentOutcome::declined(format!("Card declined for {}", amount)));
    }
    Ok(PaymentOutcome::approved(format!("pay_{:04}", n)))
  }
}

// --- Harness ---

pub struct Harness {
  pub event: Uuid,
  pub settings: CoreSettings,
  pub store: Arc<MemoryStore>,
  pub clock: Arc<ManualClock>,
  pub catalog: Arc<StaticCatalog>,
  pub notifier: Arc<RecordingNotifier>,
  pub publisher: Arc<RecordingPublisher>,
  pub payments: Arc<ScriptedGateway>,
  pub signer: TicketSigner,
  pub ledger: StockLedger,
  pub reservations: ReservationManager,
  pub fulfillment: FulfillmentService,
  pub gate: CheckInService,
}

impl Harness {
  pub fn new() -> Self {
    Self::with_settings(CoreSettings::new(SECRET))
  }

  pub fn with_settings(settings: CoreSettings) -> Self {
    setup_tracing();
    let event = Uuid::new_v4();
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(start_time()));
    let catalog = Arc::new(StaticCatalog::new([event]));
    let notifier = Arc::new(RecordingNotifier::default());
    let publisher = Arc::new(RecordingPublisher::default());
    let payments = Arc::new(ScriptedGateway::default());
    let signer = TicketSigner::new(&settings.signing_secret).unwrap();

    let ledger = StockLedger::new(
      store.clone(),
      catalog.clone(),
      clock.clone(),
      notifier.clone(),
      settings.clone(),
    );
    let reservations = ReservationManager::new(store.clone(), clock.clone(), notifier.clone(), settings.clone());
    let fulfillment = FulfillmentService::new(FulfillmentDeps {
      store: store.clone(),
      payments: payments.clone(),
      publisher: publisher.clone(),
      notifier: notifier.clone(),
      clock: clock.clone(),
      signer: signer.clone(),
      settings: settings.clone(),
    })
    .unwrap();
    let gate = CheckInService::new(
      store.clone(),
      signer.clone(),
      clock.clone(),
      notifier.clone(),
      settings.clone(),
    );

    Self {
      event,
      settings,
      store,
      clock,
      catalog,
      notifier,
      publisher,
      payments,
      signer,
      ledger,
      reservations,
      fulfillment,
      gate,
    }
  }

  pub fn new_ticket_type(&self, total: u32, price_cents: i64) -> NewStockUnit {
    NewStockUnit {
      event_ref: self.event,
      name: "General Admission".to_string(),
      description: Some("Standing area".to_string()),
      price: Money::new(price_cents, "USD"),
      total_quantity: total,
      min_per_order: 1,
      max_per_order: 10,
      sale_window: SaleWindow {
        start: start_time() - Duration::hours(1),
        end: start_time() + Duration::days(30),
      },
    }
  }

  pub async fn ticket_type(&self, total: u32, price_cents: i64) -> StockUnit {
    self.ledger.register(self.new_ticket_type(total, price_cents)).await.unwrap()
  }

  pub async fn sold(&self, unit: &StockUnit) -> u32 {
    self.ledger.get(unit.id).await.unwrap().sold_count
  }

  pub async fn tickets_of(&self, owner: Uuid) -> Vec<Ticket> {
    self.gate.tickets_for_owner(owner, Default::default()).await.unwrap()
  }

  pub async fn order_count(&self, owner: Uuid) -> u64 {
    self.fulfillment.orders_for_owner(owner, 1, 10).await.unwrap().total_items
  }

  pub async fn has_cart(&self, owner: Uuid) -> bool {
    let mut tx = self.store.begin().await.unwrap();
    tx.find_cart(owner).await.unwrap().is_some()
  }
}

pub fn payment(method_ref: &str) -> PaymentDetails {
  PaymentDetails {
    method_ref: method_ref.to_string(),
    billing_address: BillingAddress {
      full_name: "Grace Hopper".to_string(),
      email: "grace@example.com".to_string(),
      line1: "1 Navy Yard".to_string(),
      city: "Arlington".to_string(),
      country: "US".to_string(),
    },
  }
}
