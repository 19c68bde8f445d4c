use crate::auth::otp::{FixedOtp, OtpRegistry};
use crate::auth::tokens::{Claims, TokenIssuer};
use crate::clock::{Clock, SystemClock};
use crate::config::Settings;
use crate::db::{GuestId, GuestStore, User, UserDirectory};
use crate::error::{AppError, AuthError, DirectoryError};
use crate::events::{AuthEvent, EventSink};
use crate::notification::Notifier;
use crate::phone;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct AuthService {
    directory: Arc<dyn UserDirectory>,
    guests: Arc<dyn GuestStore>,
    notifier: Arc<dyn Notifier>,
    events: Arc<dyn EventSink>,
    otp: OtpRegistry,
    tokens: TokenIssuer,
}

impl AuthService {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        guests: Arc<dyn GuestStore>,
        notifier: Arc<dyn Notifier>,
        events: Arc<dyn EventSink>,
        otp: OtpRegistry,
        tokens: TokenIssuer,
    ) -> Self {
        Self {
            directory,
            guests,
            notifier,
            events,
            otp,
            tokens,
        }
    }

    /// Builds the registry and token issuer from `settings`. The pinned test
    /// OTP is only installed outside production.
    pub fn from_settings(
        settings: &Settings,
        directory: Arc<dyn UserDirectory>,
        guests: Arc<dyn GuestStore>,
        notifier: Arc<dyn Notifier>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self::from_settings_with_clock(
            settings,
            directory,
            guests,
            notifier,
            events,
            Arc::new(SystemClock),
        )
    }

    pub fn from_settings_with_clock(
        settings: &Settings,
        directory: Arc<dyn UserDirectory>,
        guests: Arc<dyn GuestStore>,
        notifier: Arc<dyn Notifier>,
        events: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut otp = OtpRegistry::new(clock.clone());
        if !settings.is_production() {
            otp = otp.with_fixed_otp(FixedOtp {
                phone: phone::normalize(&settings.otp.test_phone),
                code: settings.otp.test_code.clone(),
            });
        }

        let tokens = TokenIssuer::new(
            &settings.auth.jwt_secret,
            Duration::minutes(settings.auth.access_token_expiry_minutes),
            clock,
        );

        Self::new(directory, guests, notifier, events, otp, tokens)
    }

    /// Generates (or reuses) an OTP for `phone` and sends it by SMS.
    #[instrument(skip(self))]
    pub async fn send_otp(&self, phone: &str, app: &str) -> crate::Result<()> {
        let phone = canonical_phone(phone)?;

        match self.directory.find_by_phone(&phone).await {
            Ok(user) if user.is_deactivated() => {
                warn!("Refusing otp for deactivated user {}", user.id);
                return Err(AuthError::UserDeactivated.into());
            }
            Ok(_) | Err(DirectoryError::NotFound) => {}
            // an unknown user is about to register, so a failed lookup must not block the otp
            Err(e) => warn!("User lookup failed before sending otp: {}", e),
        }

        let code = self.otp.generate(&phone);
        if let Err(e) = self.notifier.send_otp(&phone, &code, app).await {
            warn!("Failed to deliver otp: {}", e);
        }

        info!("OTP issued");
        Ok(())
    }

    /// Same as `send_otp` minus the SMS; returns the code to the caller.
    pub fn no_send_otp(&self, phone: &str) -> String {
        self.otp.generate(&phone::normalize(phone))
    }

    /// The active OTP for `phone`, for internal tooling.
    pub fn find_otp(&self, phone: &str) -> crate::Result<String> {
        self.otp
            .lookup(&phone::normalize(phone))
            .ok_or_else(|| AuthError::OtpNotFound.into())
    }

    /// Logs in with an OTP, registering the phone on first use.
    ///
    /// The refresh token is assigned before the single `create`/`update`
    /// call, so a user never lands in storage without one. Guest removal and
    /// events run after that write. A registration that loses the race for
    /// the phone continues as a login of the stored user.
    #[instrument(skip(self, code))]
    pub async fn login_by_otp(
        &self,
        phone: &str,
        code: &str,
        guest_id: Option<GuestId>,
    ) -> crate::Result<TokenPair> {
        let phone = canonical_phone(phone)?;
        let guest_id = guest_id.filter(|id| *id != 0);

        if !self.otp.verify(&phone, code) {
            warn!("Incorrect otp submitted");
            return Err(AuthError::OtpIncorrect.into());
        }

        let (mut user, registering) = match self.directory.find_by_phone(&phone).await {
            Ok(user) => (user, false),
            Err(DirectoryError::NotFound) => (User::new(phone.clone()), true),
            Err(e) => return Err(e.into()),
        };

        let rotated = self.tokens.issue_or_rotate_refresh_token(&mut user);

        if registering {
            match self.directory.create(&user).await {
                Ok(created) => {
                    user = created;
                    info!("Registered user {}", user.id);
                    self.events.emit(AuthEvent::UserCreated {
                        user_id: user.id,
                        guest_id,
                    });
                }
                Err(DirectoryError::Duplicate) => {
                    // another login registered this phone first
                    warn!("Phone registered concurrently, continuing with stored user");
                    user = self.directory.find_by_phone(&phone).await?;
                    self.rotate_and_store(&mut user).await?;
                }
                Err(e) => return Err(e.into()),
            }
        } else if rotated {
            self.store_rotated(&user).await?;
        }

        let access_token = self.tokens.issue_access_token(&user)?;

        if let Some(guest_id) = guest_id {
            self.guests.remove(guest_id).await?;
        }

        self.events.emit(AuthEvent::UserLoggedIn {
            user_id: user.id,
            guest_id,
        });

        let refresh_token = user
            .refresh_token
            .ok_or_else(|| AppError::InternalError("user has no refresh token".into()))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Exchanges a refresh token for a new access token. The refresh token
    /// itself is left alone.
    #[instrument(skip_all)]
    pub async fn refresh_token(&self, refresh_token: &str) -> crate::Result<String> {
        let user = self.directory.find_by_refresh_token(refresh_token).await?;

        if !self.tokens.refresh_token_is_current(&user) {
            warn!("Expired refresh token presented for user {}", user.id);
            return Err(DirectoryError::NotFound.into());
        }

        Ok(self.tokens.issue_access_token(&user)?)
    }

    pub fn parse_token(&self, access_token: &str) -> crate::Result<Claims> {
        self.tokens
            .parse_access_token(access_token)
            .map_err(|_| AuthError::Unauthorized.into())
    }

    async fn rotate_and_store(&self, user: &mut User) -> Result<(), DirectoryError> {
        if self.tokens.issue_or_rotate_refresh_token(user) {
            self.store_rotated(user).await?;
        }
        Ok(())
    }

    async fn store_rotated(&self, user: &User) -> Result<(), DirectoryError> {
        self.directory.update(user).await?;
        info!("Rotated refresh token for user {}", user.id);
        Ok(())
    }
}

fn canonical_phone(raw: &str) -> crate::Result<String> {
    let phone = phone::normalize(raw);
    if !phone::is_valid(&phone) {
        return Err(AppError::ValidationError(format!("invalid phone number: {}", raw)));
    }
    Ok(phone)
}
