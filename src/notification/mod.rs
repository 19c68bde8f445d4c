//! Delivery of OTP codes to phones.
//!
//! The auth service treats delivery as best effort: a failed send is logged
//! and the OTP stays valid, so the client can simply ask again.

mod sms;

pub use sms::SmsNotifier;

use async_trait::async_trait;
use crate::error::NotificationError;
use tracing::info;

#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// `app` names the client app the code is for and ends up in the message text.
    async fn send_otp(&self, phone: &str, code: &str, app: &str) -> Result<(), NotificationError>;
}

/// Writes codes to the log instead of sending them. Development only.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_otp(&self, phone: &str, code: &str, app: &str) -> Result<(), NotificationError> {
        info!(phone = %phone, app = %app, code = %code, "OTP (sms disabled)");
        Ok(())
    }
}

pub(crate) fn otp_message(code: &str, app: &str) -> String {
    if app.is_empty() {
        format!("Your verification code: {}", code)
    } else {
        format!("Your {} verification code: {}", app, code)
    }
}
