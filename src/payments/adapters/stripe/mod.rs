//! Stripe-compatible processor adapter.

mod client;
mod form;
mod webhook;

pub use client::{StripeClient, StripeSettings};
pub use webhook::{CHECKOUT_COMPLETED, WebhookError, WebhookVerifier, parse_event};
