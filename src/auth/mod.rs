//! Phone number authentication.
//!
//! A client asks for an OTP, proves possession of the phone with it, and gets
//! back a short-lived JWT access token plus a long-lived refresh token.

pub mod handlers;
mod otp;
mod service;
mod tokens;

pub use otp::{FixedOtp, OtpRegistry, OTP_TTL_MINUTES};
pub use service::{AuthService, TokenPair};
pub use tokens::{Claims, TokenIssuer, USER_ROLE};
