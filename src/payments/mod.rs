//! Payee capability gateway and escrow checkout.
//!
//! The payment processor is reached through the [`ports::PaymentProcessor`]
//! port. [`adapters::stripe`] speaks the processor's HTTP API and verifies
//! its webhook signatures; [`adapters::memory`] is a scriptable fake for
//! tests and local runs.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
