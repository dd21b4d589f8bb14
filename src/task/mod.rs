//! Task lifecycle: posting, discovery, hiring, work progress, completion,
//! cancellation and price adjustment.
//!
//! A task moves `requested → accepted → in_progress → worker_marked_done →
//! completed`, with `canceled` and `disputed` as side exits. Hiring is only
//! final once the processor confirms the escrow capture; until then the task
//! stays `requested` with a pending hire recorded.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Orchestration services in [`services`]

pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
