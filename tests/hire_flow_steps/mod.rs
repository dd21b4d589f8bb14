//! Step definitions for hire flow BDD scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
