//! Append-only audit trail of state-changing events.
//!
//! - Domain types in [`domain`]
//! - Port contract in [`ports`]
//! - Recording service in [`services`]

pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
