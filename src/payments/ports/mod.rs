//! Port contracts for payment processing.

pub mod processor;

pub use processor::{PaymentProcessor, PaymentProcessorError, PaymentProcessorResult};
