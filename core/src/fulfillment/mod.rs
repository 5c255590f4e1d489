// core/src/fulfillment/mod.rs

//! Turning a cart into a paid order with tickets.
//!
//! Checkout runs as a [`Pipeline`] of named steps. Payment is captured before
//! any ledger row is leased, and the ledger write happens in one store
//! transaction afterwards; the steps after that are best-effort.

pub mod context;
mod orders;
mod steps;

pub use context::CheckoutState;

use crate::clock::Clock;
use crate::error::{Result, TicketingError};
use crate::issuance::TicketSigner;
use crate::models::{Order, PaymentDetails};
use crate::ports::{EventPublisher, LiveNotifier, PaymentGateway, TicketingStore};
use crate::settings::CoreSettings;
use crate::workflow::{ContextData, Pipeline, WorkflowError};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

pub const CHECKOUT_PIPELINE: &str = "checkout";

/// Step names in execution order, with whether each is optional.
pub const CHECKOUT_STEPS: &[(&str, bool)] = &[
  ("load_cart", false),
  ("verify_stock", false),
  ("price_order", false),
  ("capture_payment", false),
  ("commit_order", false),
  ("announce_purchase", true),
  ("push_updates", true),
];

/// Collaborators shared by every checkout step and by the order queries.
pub struct FulfillmentDeps {
  pub store: Arc<dyn TicketingStore>,
  pub payments: Arc<dyn PaymentGateway>,
  pub publisher: Arc<dyn EventPublisher>,
  pub notifier: Arc<dyn LiveNotifier>,
  pub clock: Arc<dyn Clock>,
  pub signer: TicketSigner,
  pub settings: CoreSettings,
}

pub struct FulfillmentService {
  deps: Arc<FulfillmentDeps>,
  checkout: Pipeline<CheckoutState, TicketingError>,
}

impl FulfillmentService {
  pub fn new(deps: FulfillmentDeps) -> Result<Self> {
    let deps = Arc::new(deps);
    let checkout = build_checkout_pipeline(deps.clone())?;
    Ok(Self { deps, checkout })
  }

  pub fn checkout_pipeline(&self) -> &Pipeline<CheckoutState, TicketingError> {
    &self.checkout
  }

  /// Charges the owner's cart and converts it into a completed order with tickets.
  #[instrument(name = "commit_order", skip(self, payment), fields(method = %payment.method_ref))]
  pub async fn commit_order(&self, owner_id: Uuid, payment: PaymentDetails) -> Result<Order> {
    let ctx = ContextData::new(CheckoutState::new(owner_id, payment));
    self.checkout.run(ctx.clone()).await?;

    let order = ctx.write().order.take().ok_or_else(|| {
      TicketingError::from(WorkflowError::Incomplete {
        pipeline: CHECKOUT_PIPELINE.to_string(),
      })
    })?;
    info!(order = %order.public_code, total = %order.total, "Checkout completed.");
    Ok(order)
  }
}

fn build_checkout_pipeline(deps: Arc<FulfillmentDeps>) -> Result<Pipeline<CheckoutState, TicketingError>> {
  let mut p: Pipeline<CheckoutState, TicketingError> = Pipeline::new(CHECKOUT_PIPELINE, CHECKOUT_STEPS)?;

  let d = deps.clone();
  p.on("load_cart", move |ctx| steps::load_cart(d.clone(), ctx))?;
  let d = deps.clone();
  p.on("verify_stock", move |ctx| steps::verify_stock(d.clone(), ctx))?;
  p.on("price_order", steps::price_order)?;
  let d = deps.clone();
  p.on("capture_payment", move |ctx| steps::capture_payment(d.clone(), ctx))?;
  let d = deps.clone();
  p.after("capture_payment", move |ctx| steps::push_payment_status(d.clone(), ctx))?;
  p.after("capture_payment", steps::require_approval)?;
  let d = deps.clone();
  p.on("commit_order", move |ctx| steps::commit_order(d.clone(), ctx))?;
  let d = deps.clone();
  p.on("announce_purchase", move |ctx| steps::announce_purchase(d.clone(), ctx))?;
  let d = deps;
  p.on("push_updates", move |ctx| steps::push_updates(d.clone(), ctx))?;

  Ok(p)
}
