//! Offers helpers make on open tasks.
//!
//! Offers are resolved only when a hire is confirmed: the chosen helper's
//! offer is accepted and every other pending offer is declined in the same
//! commit.

pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
