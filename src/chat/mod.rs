//! Chat between a poster and their hired helper.
//!
//! A thread is opened by the hire commit and stays writable for three days.
//! Proof-of-completion photos posted here gate completion of tasks that
//! require them.

pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
