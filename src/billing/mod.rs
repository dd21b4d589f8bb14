//! Extra-work and tip billing on hired tasks.
//!
//! - Domain types in [`domain`]
//! - Port contract in [`ports`]
//! - Billing service in [`services`]

pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
