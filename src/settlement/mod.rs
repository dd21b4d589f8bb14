//! Asynchronous settlement of captured holds.
//!
//! The processor reports a completed checkout once the payer has paid. The
//! capture is routed on the hold's purpose: a hire confirms the task and
//! opens the chat, an extra-work capture marks the request paid, and a tip
//! capture stamps the task's tip.

pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
