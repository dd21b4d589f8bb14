//! Users, one-time login codes and signed session tokens.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Development notifier in [`adapters`]
//! - Orchestration in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
