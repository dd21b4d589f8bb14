//! Webhook signature verification and event decoding.
//!
//! The signature header has the form `t=<unix>,v1=<hex>[,v1=<hex>...]`. The
//! signed payload is `<t>.<raw body>` under HMAC-SHA256 with the endpoint
//! secret. The body is only parsed after a signature matched.

use crate::payments::domain::{
    CaptureEvent, HoldMetadata, HoldSessionId, PaymentReference, ProcessorEvent,
};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Event type carrying a completed checkout.
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Why a webhook delivery was rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WebhookError {
    /// No signature header was sent.
    #[error("missing signature header")]
    MissingSignature,

    /// The header lacks a timestamp or a `v1` signature.
    #[error("malformed signature header")]
    MalformedHeader,

    /// The signed timestamp is older than the tolerance.
    #[error("signature timestamp outside the tolerance window")]
    TimestampOutsideTolerance,

    /// No signature matched the payload.
    #[error("no signature matches the payload")]
    SignatureMismatch,

    /// The signed body is not a processor event.
    #[error("invalid event payload: {0}")]
    InvalidPayload(String),
}

/// Verifies signed webhook deliveries.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: Vec<u8>,
    tolerance: Duration,
}

impl fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("tolerance", &self.tolerance)
            .finish_non_exhaustive()
    }
}

struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<Vec<u8>>,
}

fn parse_header(header: &str) -> Result<SignatureHeader, WebhookError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => {
                timestamp = Some(
                    value
                        .parse::<i64>()
                        .map_err(|_| WebhookError::MalformedHeader)?,
                );
            }
            "v1" => {
                if let Ok(bytes) = hex::decode(value) {
                    signatures.push(bytes);
                }
            }
            _ => {}
        }
    }
    match timestamp {
        Some(parsed) if !signatures.is_empty() => Ok(SignatureHeader {
            timestamp: parsed,
            signatures,
        }),
        _ => Err(WebhookError::MalformedHeader),
    }
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
    object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RawCheckoutSession {
    id: String,
    payment_intent: Option<String>,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

impl WebhookVerifier {
    /// Creates a verifier for `secret`, rejecting timestamps older than
    /// `tolerance`.
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>, tolerance: Duration) -> Self {
        Self {
            secret: secret.into(),
            tolerance,
        }
    }

    fn mac(&self, timestamp: i64, payload: &[u8]) -> Result<HmacSha256, WebhookError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).map_err(|_| WebhookError::SignatureMismatch)?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac)
    }

    /// Checks `header` against the raw `payload`.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError`] when the header is missing or malformed, the
    /// timestamp is stale, or no signature matches.
    pub fn verify(
        &self,
        payload: &[u8],
        header: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), WebhookError> {
        let parsed = parse_header(header.ok_or(WebhookError::MissingSignature)?)?;
        if parsed.timestamp < (now - self.tolerance).timestamp() {
            return Err(WebhookError::TimestampOutsideTolerance);
        }
        let mac = self.mac(parsed.timestamp, payload)?;
        if parsed
            .signatures
            .iter()
            .any(|signature| mac.clone().verify_slice(signature).is_ok())
        {
            Ok(())
        } else {
            Err(WebhookError::SignatureMismatch)
        }
    }

    /// Verifies the delivery, then decodes it.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError`] when verification fails or the body is not a
    /// processor event.
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        header: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ProcessorEvent, WebhookError> {
        self.verify(payload, header, now)?;
        parse_event(payload)
    }

    /// Produces a signature header for `payload` at `timestamp`.
    #[must_use]
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> String {
        let signature = self
            .mac(timestamp, payload)
            .map(|mac| hex::encode(mac.finalize().into_bytes()))
            .unwrap_or_default();
        format!("t={timestamp},v1={signature}")
    }
}

/// Decodes a verified event body.
///
/// # Errors
///
/// Returns [`WebhookError::InvalidPayload`] when the body is not a JSON
/// event envelope.
pub fn parse_event(payload: &[u8]) -> Result<ProcessorEvent, WebhookError> {
    let value: serde_json::Value = serde_json::from_slice(payload)
        .map_err(|err| WebhookError::InvalidPayload(err.to_string()))?;
    let event: RawEvent = serde_json::from_value(value.clone())
        .map_err(|err| WebhookError::InvalidPayload(err.to_string()))?;
    if event.event_type != CHECKOUT_COMPLETED {
        return Ok(ProcessorEvent::Other {
            event_id: event.id,
            event_type: event.event_type,
        });
    }

    let malformed = |reason: String| ProcessorEvent::Malformed {
        event_id: event.id.clone(),
        reason,
        payload: value.clone(),
    };
    let session: RawCheckoutSession = match serde_json::from_value(event.data.object) {
        Ok(session) => session,
        Err(err) => return Ok(malformed(format!("unreadable checkout session: {err}"))),
    };
    let session_id = match HoldSessionId::new(session.id) {
        Ok(id) => id,
        Err(err) => return Ok(malformed(err.to_string())),
    };
    let metadata = match HoldMetadata::from_pairs(&session.metadata) {
        Ok(metadata) => metadata,
        Err(err) => return Ok(malformed(err.to_string())),
    };
    Ok(ProcessorEvent::Capture(CaptureEvent {
        event_id: event.id.clone(),
        session_id,
        payment: session
            .payment_intent
            .and_then(|reference| PaymentReference::new(reference).ok()),
        metadata,
        payload: value.clone(),
    }))
}
