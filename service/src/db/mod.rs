// service/src/db/mod.rs

pub mod catalog;
pub mod pg_store;
pub mod schema;

pub use catalog::PgEventCatalog;
pub use pg_store::PgStore;
pub use schema::migrate;

use ticketing_core::StoreError;

/// Maps a driver error onto the store port's taxonomy by SQLSTATE.
pub(crate) fn store_error(err: sqlx::Error) -> StoreError {
  let code = err
    .as_database_error()
    .and_then(|db| db.code().map(|c| c.into_owned()));
  match code.as_deref() {
    // unique_violation
    Some("23505") => StoreError::UniqueViolation(err.to_string()),
    // check_violation, foreign_key_violation
    Some("23514") | Some("23503") => StoreError::CheckViolation(err.to_string()),
    // serialization_failure, deadlock_detected, lock_not_available
    Some("40001") | Some("40P01") | Some("55P03") => StoreError::Contention(err.to_string()),
    _ => match err {
      sqlx::Error::PoolTimedOut => StoreError::Contention("connection pool exhausted".to_string()),
      other => StoreError::Backend { source: other.into() },
    },
  }
}
