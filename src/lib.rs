//! Taskmarket: a local-services marketplace where posters hire helpers.
//!
//! Posters publish tasks, helpers make offers, and the poster's payment is
//! held in escrow at hire time and captured into task state through signed
//! processor webhooks. Chat, extra-work billing, tips, disputes and an
//! activity trail hang off each task.
//!
//! # Architecture
//!
//! Each bounded context follows hexagonal layering:
//!
//! - **Domain**: records and rule checks with no infrastructure dependencies
//! - **Ports**: repository and gateway traits
//! - **Services**: orchestration over ports, clocks and the activity log
//!
//! Adapters live in [`persistence`] (in-memory and `PostgreSQL` stores),
//! [`payments::adapters`] (Stripe-compatible processor and webhook
//! verification) and [`api`] (the Lambda HTTP surface).

pub mod activity;
pub mod api;
pub mod app;
pub mod billing;
pub mod chat;
pub mod config;
pub mod dispute;
pub mod error;
pub mod identity;
pub mod ids;
pub mod offer;
pub mod payments;
pub mod persistence;
pub mod settlement;
pub mod task;

#[cfg(test)]
mod testing;
