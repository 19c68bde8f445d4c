use async_trait::async_trait;
use crate::config::NotificationConfig;
use crate::error::NotificationError;
use crate::phone;
use super::{otp_message, Notifier};
use reqwest::Client;
use std::time::Duration;
use tracing::{error, info};
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends OTP codes through a Kavenegar-style SMS REST gateway.
pub struct SmsNotifier {
    client: Client,
    endpoint: Url,
    sender: String,
}

impl SmsNotifier {
    pub fn new(config: &NotificationConfig) -> Result<Self, NotificationError> {
        if config.api_key.is_empty() {
            return Err(NotificationError::InvalidConfig("missing sms api key".into()));
        }

        let base = Url::parse(&config.base_url)
            .map_err(|e| NotificationError::InvalidConfig(format!("base url: {}", e)))?;
        let endpoint = base
            .join(&format!("v1/{}/sms/send.json", config.api_key))
            .map_err(|e| NotificationError::InvalidConfig(format!("endpoint: {}", e)))?;

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            endpoint,
            sender: config.sender.clone(),
        })
    }
}

#[async_trait]
impl Notifier for SmsNotifier {
    async fn send_otp(&self, phone: &str, code: &str, app: &str) -> Result<(), NotificationError> {
        let receptor = phone::to_international(phone);
        let message = otp_message(code, app);

        let res = self
            .client
            .post(self.endpoint.clone())
            .form(&[
                ("receptor", receptor.as_str()),
                ("sender", self.sender.as_str()),
                ("message", message.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            error!("SMS gateway returned {} for {}: {}", status, receptor, body);
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
                message: body,
            });
        }

        info!("OTP sms sent to {}", receptor);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{body_string_contains, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn config(base_url: &str) -> NotificationConfig {
        NotificationConfig {
            enabled: true,
            api_key: "KEY123".into(),
            sender: "10004346".into(),
            base_url: base_url.into(),
        }
    }

    #[tokio::test]
    async fn test_send_otp_posts_to_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/KEY123/sms/send.json"))
            .and(body_string_contains("receptor=989121234567"))
            .and(body_string_contains("sender=10004346"))
            .and(body_string_contains("12345"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"return":{"status":200}}"#))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = SmsNotifier::new(&config(&server.uri())).unwrap();
        notifier.send_otp("09121234567", "12345", "shop").await.unwrap();
    }

    #[tokio::test]
    async fn test_send_otp_gateway_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(418).set_body_string("invalid sender"))
            .mount(&server)
            .await;

        let notifier = SmsNotifier::new(&config(&server.uri())).unwrap();
        let err = notifier.send_otp("09121234567", "12345", "").await.unwrap_err();
        match err {
            NotificationError::Rejected { status, message } => {
                assert_eq!(status, 418);
                assert_eq!(message, "invalid sender");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_api_key() {
        let mut config = config("http://localhost");
        config.api_key.clear();
        assert!(matches!(
            SmsNotifier::new(&config),
            Err(NotificationError::InvalidConfig(_))
        ));
    }
}
