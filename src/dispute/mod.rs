//! Disputes over hired tasks.
//!
//! Opening a dispute freezes the task (see
//! [`crate::task::services::TaskLifecycleService::open_dispute`]). Either
//! party may then append photo evidence to their own side; resolution is
//! recorded by operator tooling.

pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
