//! Identity domain: users, login codes and bearer tokens.

mod email;
mod error;
mod otp;
mod token;
mod user;

pub use email::Email;
pub use error::IdentityDomainError;
pub use otp::{OTP_LIFETIME_MINUTES, OneTimeCode, OtpCode, PersistedOtpData};
pub use token::{SessionToken, SessionTokenSigner};
pub use user::{PersistedUserData, ProfileUpdate, User, UserChange};
