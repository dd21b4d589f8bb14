//! Payment orchestration services.

mod checkout;
mod payee;

pub use checkout::{CheckoutSettings, EscrowCheckout};
pub use payee::PayeeGatewayService;
