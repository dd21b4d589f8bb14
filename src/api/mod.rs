//! JSON HTTP surface served through `lambda_http`.
//!
//! Routes resolve to service calls on [`Marketplace`](crate::app::Marketplace).
//! Every route except health, login and the payment webhook requires an
//! `Authorization: Bearer` session token.

mod handler;
mod payloads;
mod response;
mod routes;
mod views;

pub use handler::{ApiHandler, SIGNATURE_HEADER};
pub use response::status_for;
