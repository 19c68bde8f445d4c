use crate::clock::Clock;
use crate::db::models::{User, UserId};
use crate::error::AuthError;
use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

const ALGORITHM: Algorithm = Algorithm::HS256;
const REFRESH_TOKEN_BYTES: usize = 32;
const REFRESH_TOKEN_LIFETIME_DAYS: i64 = 6 * 30;
pub const USER_ROLE: &str = "user";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub exp: i64,
    pub iat: i64,
    pub id: UserId,
    pub name: String,
    pub roles: Vec<String>,
    pub phone: String,
}

/// Signs and checks access tokens, and keeps refresh tokens fresh.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_lifetime: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    pub fn new(jwt_secret: &str, access_token_lifetime: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            access_token_lifetime,
            clock,
        }
    }

    /// JWT times are whole seconds. Issuance is counted from the start of the
    /// current second, so the token dies at `floor(now) + lifetime`.
    pub fn issue_access_token(&self, user: &User) -> Result<String, AuthError> {
        let now = self.clock.now();
        let claims = Claims {
            exp: (now + self.access_token_lifetime).timestamp(),
            iat: now.timestamp(),
            id: user.id,
            name: user.full_name(),
            roles: vec![USER_ROLE.to_string()],
            phone: user.phone.clone(),
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Every failure, whatever its cause, is reported as `Unauthorized`.
    pub fn parse_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        // Expiry is checked below against our own clock, without leeway.
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                debug!("Rejected access token: {}", e);
                AuthError::Unauthorized
            })?
            .claims;

        if self.clock.now().timestamp() >= claims.exp {
            debug!("Rejected access token: expired");
            return Err(AuthError::Unauthorized);
        }

        Ok(claims)
    }

    pub fn refresh_token_is_current(&self, user: &User) -> bool {
        user.has_valid_refresh_token(self.clock.now())
    }

    /// Gives `user` a new refresh token when it has none or it has expired.
    /// Returns true when the user changed and needs to be persisted.
    pub fn issue_or_rotate_refresh_token(&self, user: &mut User) -> bool {
        let now = self.clock.now();
        if user.has_valid_refresh_token(now) {
            return false;
        }
        debug!("Issuing refresh token for user {}", user.id);

        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        user.refresh_token = Some(hex::encode(bytes));
        user.refresh_token_expiry = Some(now + Duration::days(REFRESH_TOKEN_LIFETIME_DAYS));
        true
    }
}
