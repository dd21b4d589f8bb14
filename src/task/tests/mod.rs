//! Task lifecycle tests.

mod service_tests;
mod sweep_tests;
