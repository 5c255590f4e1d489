// service/src/state.rs
use crate::config::AppConfig;
use crate::db::{PgEventCatalog, PgStore};
use crate::errors::Result as AppResult;
use crate::services::payment_mock::MockPaymentGateway;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use ticketing_core::adapters::{BroadcastNotifier, ChannelPublisher};
use ticketing_core::ports::{LiveNotifier, TicketingStore};
use ticketing_core::{
  CheckInService, Clock, FulfillmentDeps, FulfillmentService, ReservationManager, StockLedger, SystemClock,
  TicketSigner,
};

const LIVE_CHANNEL_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct AppState {
  pub config: Arc<AppConfig>,
  pub catalog: PgEventCatalog,
  pub notifier: BroadcastNotifier,
  pub ledger: Arc<StockLedger>,
  pub reservations: Arc<ReservationManager>,
  pub fulfillment: Arc<FulfillmentService>,
  pub gate: Arc<CheckInService>,
}

impl AppState {
  /// Wires the core services onto Postgres, the mock gateway and the in-process channels.
  pub fn build(db_pool: PgPool, config: Arc<AppConfig>, publisher: ChannelPublisher) -> AppResult<Self> {
    let settings = config.core_settings();
    let signer = TicketSigner::new(&settings.signing_secret)?;

    let store: Arc<dyn TicketingStore> = Arc::new(PgStore::new(db_pool.clone()));
    let catalog = PgEventCatalog::new(db_pool);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let notifier = BroadcastNotifier::new(LIVE_CHANNEL_CAPACITY);
    let live: Arc<dyn LiveNotifier> = Arc::new(notifier.clone());

    let ledger = StockLedger::new(
      store.clone(),
      Arc::new(catalog.clone()),
      clock.clone(),
      live.clone(),
      settings.clone(),
    );
    let reservations = ReservationManager::new(store.clone(), clock.clone(), live.clone(), settings.clone());
    let fulfillment = FulfillmentService::new(FulfillmentDeps {
      store: store.clone(),
      payments: Arc::new(MockPaymentGateway::new(Duration::from_millis(config.payment_latency_ms))),
      publisher: Arc::new(publisher),
      notifier: live.clone(),
      clock: clock.clone(),
      signer: signer.clone(),
      settings: settings.clone(),
    })?;
    let gate = CheckInService::new(store, signer, clock, live, settings);

    Ok(Self {
      config,
      catalog,
      notifier,
      ledger: Arc::new(ledger),
      reservations: Arc::new(reservations),
      fulfillment: Arc::new(fulfillment),
      gate: Arc::new(gate),
    })
  }
}
