//! Payment processor adapters.

pub mod memory;
pub mod stripe;

pub use memory::InMemoryPaymentProcessor;
