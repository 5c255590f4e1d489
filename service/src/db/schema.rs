// service/src/db/schema.rs

use crate::errors::Result as AppResult;
use sqlx::PgPool;
use tracing::info;

/// Idempotent DDL. The constraints back the core's invariants: one cart per
/// owner, one line per ticket type in a cart, unique order and ticket codes,
/// and `sold_count` within `[0, total_quantity]`.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS events (
  id UUID PRIMARY KEY,
  name TEXT NOT NULL,
  starts_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS stock_units (
  id UUID PRIMARY KEY,
  event_ref UUID NOT NULL,
  name TEXT NOT NULL,
  description TEXT,
  price_cents BIGINT NOT NULL CHECK (price_cents >= 0),
  currency TEXT NOT NULL CHECK (char_length(currency) = 3),
  total_quantity INTEGER NOT NULL CHECK (total_quantity >= 0),
  sold_count INTEGER NOT NULL DEFAULT 0 CHECK (sold_count >= 0),
  min_per_order INTEGER NOT NULL CHECK (min_per_order >= 1),
  max_per_order INTEGER NOT NULL,
  sale_start TIMESTAMPTZ NOT NULL,
  sale_end TIMESTAMPTZ NOT NULL,
  CONSTRAINT stock_units_sold_within_total CHECK (sold_count <= total_quantity),
  CONSTRAINT stock_units_per_order_bounds CHECK (max_per_order >= min_per_order),
  CONSTRAINT stock_units_sale_window CHECK (sale_start < sale_end)
);
CREATE INDEX IF NOT EXISTS stock_units_event_idx ON stock_units (event_ref);

CREATE TABLE IF NOT EXISTS carts (
  id UUID PRIMARY KEY,
  owner_id UUID NOT NULL UNIQUE,
  expires_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS cart_items (
  id UUID PRIMARY KEY,
  cart_id UUID NOT NULL REFERENCES carts (id) ON DELETE CASCADE,
  stock_unit_ref UUID NOT NULL REFERENCES stock_units (id) ON DELETE CASCADE,
  quantity INTEGER NOT NULL CHECK (quantity >= 1),
  price_snapshot_cents BIGINT NOT NULL,
  currency TEXT NOT NULL,
  UNIQUE (cart_id, stock_unit_ref)
);
CREATE INDEX IF NOT EXISTS cart_items_unit_idx ON cart_items (stock_unit_ref);

CREATE TABLE IF NOT EXISTS orders (
  id UUID PRIMARY KEY,
  public_code TEXT NOT NULL UNIQUE,
  owner_id UUID NOT NULL,
  total_amount_cents BIGINT NOT NULL CHECK (total_amount_cents >= 0),
  currency TEXT NOT NULL,
  status TEXT NOT NULL CHECK (status IN ('PENDING', 'COMPLETED', 'FAILED', 'REFUNDED')),
  payment_ref TEXT,
  billing_address JSONB NOT NULL,
  created_at TIMESTAMPTZ NOT NULL
);
CREATE INDEX IF NOT EXISTS orders_owner_idx ON orders (owner_id, created_at DESC);

CREATE TABLE IF NOT EXISTS order_items (
  id UUID PRIMARY KEY,
  order_id UUID NOT NULL REFERENCES orders (id),
  stock_unit_ref UUID NOT NULL REFERENCES stock_units (id),
  quantity INTEGER NOT NULL CHECK (quantity >= 1),
  price_at_purchase_cents BIGINT NOT NULL,
  currency TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS order_items_order_idx ON order_items (order_id);

CREATE TABLE IF NOT EXISTS tickets (
  id UUID PRIMARY KEY,
  order_item_ref UUID NOT NULL REFERENCES order_items (id),
  owner_id UUID NOT NULL,
  event_ref UUID NOT NULL,
  code TEXT NOT NULL UNIQUE,
  status TEXT NOT NULL CHECK (status IN ('VALID', 'USED', 'CANCELLED')),
  signed_payload TEXT NOT NULL,
  holder_name TEXT NOT NULL,
  check_in_at TIMESTAMPTZ,
  issued_at TIMESTAMPTZ NOT NULL
);
CREATE INDEX IF NOT EXISTS tickets_owner_idx ON tickets (owner_id, issued_at DESC);
CREATE INDEX IF NOT EXISTS tickets_order_item_idx ON tickets (order_item_ref);
"#;

pub async fn migrate(pool: &PgPool) -> AppResult<()> {
  sqlx::raw_sql(SCHEMA).execute(pool).await?;
  info!("Database schema is up to date.");
  Ok(())
}
