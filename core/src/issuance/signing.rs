// core/src/issuance/signing.rs

//! HMAC-SHA256 signatures over a canonical ticket payload.
//!
//! Canonical bytes are the compact JSON object `{"code":…,"event":…,"owner":…}`
//! with keys in that order and UUIDs lowercase and hyphenated. The presented
//! payload is the same object with a fourth key `sig` holding the lowercase
//! hex signature. A presented payload is accepted only if it is byte-for-byte
//! the canonical signed form, so reformatting or re-casing also fails.

use crate::error::{Result, TicketingError};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;
use std::fmt;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// The facts a valid signature vouches for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketClaims {
  pub code: String,
  pub event_ref: Uuid,
  pub owner_id: Uuid,
}

#[derive(Deserialize)]
struct PresentedPayload {
  code: String,
  event: Uuid,
  owner: Uuid,
  sig: Option<String>,
}

#[derive(Clone)]
pub struct TicketSigner {
  mac: HmacSha256,
}

impl fmt::Debug for TicketSigner {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TicketSigner").finish_non_exhaustive()
  }
}

impl TicketSigner {
  pub fn new(secret: &[u8]) -> Result<Self> {
    if secret.is_empty() {
      return Err(TicketingError::BadRequest(
        "Ticket signing secret must not be empty.".to_string(),
      ));
    }
    let mac = HmacSha256::new_from_slice(secret)
      .map_err(|e| TicketingError::BadRequest(format!("Unusable ticket signing secret: {}", e)))?;
    Ok(Self { mac })
  }

  pub fn canonical_payload(code: &str, event_ref: Uuid, owner_id: Uuid) -> String {
    json!({
      "code": code,
      "event": event_ref.hyphenated().to_string(),
      "owner": owner_id.hyphenated().to_string(),
    })
    .to_string()
  }

  /// Lowercase hex HMAC of the canonical payload.
  pub fn signature(&self, code: &str, event_ref: Uuid, owner_id: Uuid) -> String {
    let mut mac = self.mac.clone();
    mac.update(Self::canonical_payload(code, event_ref, owner_id).as_bytes());
    hex::encode(mac.finalize().into_bytes())
  }

  /// The payload printed on the ticket: canonical fields plus `sig`.
  pub fn sign(&self, code: &str, event_ref: Uuid, owner_id: Uuid) -> String {
    let sig = self.signature(code, event_ref, owner_id);
    Self::signed_form(code, event_ref, owner_id, &sig)
  }

  fn signed_form(code: &str, event_ref: Uuid, owner_id: Uuid, sig: &str) -> String {
    json!({
      "code": code,
      "event": event_ref.hyphenated().to_string(),
      "owner": owner_id.hyphenated().to_string(),
      "sig": sig,
    })
    .to_string()
  }

  /// Parses and authenticates a presented payload.
  ///
  /// Every failure is a `BadRequest`: unparsable input, a missing `sig`, or a
  /// signature that does not match.
  pub fn verify(&self, presented: &str) -> Result<TicketClaims> {
    let payload: PresentedPayload = serde_json::from_str(presented)
      .map_err(|e| TicketingError::BadRequest(format!("Malformed ticket payload: {}", e)))?;

    let sig = payload
      .sig
      .ok_or_else(|| TicketingError::BadRequest("Ticket payload carries no signature.".to_string()))?;

    let forged = || TicketingError::BadRequest("Invalid signature, possible forgery.".to_string());

    let sig_bytes = hex::decode(&sig).map_err(|_| forged())?;
    let mut mac = self.mac.clone();
    mac.update(Self::canonical_payload(&payload.code, payload.event, payload.owner).as_bytes());
    mac.verify_slice(&sig_bytes).map_err(|_| forged())?;

    if Self::signed_form(&payload.code, payload.event, payload.owner, &sig) != presented {
      return Err(forged());
    }

    Ok(TicketClaims {
      code: payload.code,
      event_ref: payload.event,
      owner_id: payload.owner,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn signer() -> TicketSigner {
    TicketSigner::new(b"unit-test-secret").unwrap()
  }

  #[test]
  fn canonical_payload_is_compact_and_ordered() {
    let event = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
    let owner = Uuid::parse_str("aaaaaaaa-bbbb-4ccc-8ddd-eeeeeeeeeeee").unwrap();
    assert_eq!(
      TicketSigner::canonical_payload("TKT-1", event, owner),
      r#"{"code":"TKT-1","event":"11111111-2222-4333-8444-555555555555","owner":"aaaaaaaa-bbbb-4ccc-8ddd-eeeeeeeeeeee"}"#
    );
  }

  #[test]
  fn signed_payload_verifies() {
    let signer = signer();
    let (event, owner) = (Uuid::new_v4(), Uuid::new_v4());
    let payload = signer.sign("TKT-ABC", event, owner);
    let claims = signer.verify(&payload).unwrap();
    assert_eq!(claims.code, "TKT-ABC");
    assert_eq!(claims.event_ref, event);
    assert_eq!(claims.owner_id, owner);
  }

  #[test]
  fn other_secret_is_rejected() {
    let payload = signer().sign("TKT-ABC", Uuid::new_v4(), Uuid::new_v4());
    let other = TicketSigner::new(b"another-secret").unwrap();
    assert!(matches!(other.verify(&payload), Err(TicketingError::BadRequest(_))));
  }

  #[test]
  fn uppercased_uuid_is_rejected() {
    let signer = signer();
    let event = Uuid::new_v4();
    let payload = signer.sign("TKT-ABC", event, Uuid::new_v4());
    let tampered = payload.replace(&event.to_string(), &event.to_string().to_uppercase());
    assert_ne!(tampered, payload);
    assert!(matches!(signer.verify(&tampered), Err(TicketingError::BadRequest(_))));
  }

  #[test]
  fn empty_secret_is_refused() {
    assert!(TicketSigner::new(b"").is_err());
  }
}
