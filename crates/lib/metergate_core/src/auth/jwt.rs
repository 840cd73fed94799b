//! JWT token issuance, validation and refresh rotation.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;
use uuid::Uuid;

use super::AuthError;
use super::registry::RefreshTokenRegistry;
use crate::models::auth::{TokenClaims, TokenKind, TokenPair};

/// Default access token lifetime: 60 minutes.
pub const DEFAULT_ACCESS_TOKEN_TTL: Duration = Duration::minutes(60);

/// Default refresh token lifetime: 7 days.
pub const DEFAULT_REFRESH_TOKEN_TTL: Duration = Duration::days(7);

/// Issues and validates HS256 access/refresh tokens.
///
/// Access tokens are stateless. Refresh tokens are additionally recorded in a
/// [`RefreshTokenRegistry`] and are single use: a successful [`refresh`]
/// consumes the presented token and hands out a new pair.
///
/// [`refresh`]: TokenService::refresh
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    registry: Arc<RefreshTokenRegistry>,
}

impl TokenService {
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl,
            refresh_ttl,
            registry: Arc::new(RefreshTokenRegistry::new()),
        }
    }

    /// The refresh token registry owned by this service.
    pub fn registry(&self) -> &Arc<RefreshTokenRegistry> {
        &self.registry
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Generate a signed access token for `user_id`.
    pub fn issue_access_token(&self, user_id: &str, email: &str) -> Result<String, AuthError> {
        let (token, _) = self.encode_at(user_id, email, TokenKind::Access, Utc::now())?;
        Ok(token)
    }

    /// Generate a signed refresh token for `user_id` and register it.
    pub fn issue_refresh_token(&self, user_id: &str, email: &str) -> Result<String, AuthError> {
        let (token, claims) = self.encode_at(user_id, email, TokenKind::Refresh, Utc::now())?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| AuthError::Internal("refresh expiry out of range".into()))?;
        self.registry.insert(&token, user_id, expires_at);
        Ok(token)
    }

    /// Generate an access/refresh pair.
    pub fn issue_pair(&self, user_id: &str, email: &str) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(user_id, email)?,
            refresh_token: self.issue_refresh_token(user_id, email)?,
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    /// Verify an access token, returning its claims.
    pub fn validate_access_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.decode_kind(token, TokenKind::Access)
    }

    /// Exchange a refresh token for a new pair, consuming the presented one.
    ///
    /// Fails with [`AuthError::InvalidToken`] if the token does not verify, has
    /// expired, or is no longer registered to the subject it encodes.
    pub fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.decode_kind(refresh_token, TokenKind::Refresh)?;
        if !self.registry.consume(refresh_token, &claims.sub) {
            debug!(sub = %claims.sub, "refresh token not registered");
            return Err(AuthError::InvalidToken);
        }
        self.issue_pair(&claims.sub, &claims.email)
    }

    /// Revoke a refresh token. Unknown or malformed tokens are ignored.
    pub fn revoke(&self, refresh_token: &str) {
        self.registry.revoke(refresh_token);
    }

    /// Revoke every refresh token held by `user_id`.
    pub fn revoke_all(&self, user_id: &str) -> usize {
        self.registry.revoke_subject(user_id)
    }

    fn encode_at(
        &self,
        user_id: &str,
        email: &str,
        kind: TokenKind,
        issued_at: DateTime<Utc>,
    ) -> Result<(String, TokenClaims), AuthError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let claims = TokenClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            kind,
            jti: Uuid::new_v4().to_string(),
            iat: issued_at.timestamp(),
            exp: issued_at
                .checked_add_signed(ttl)
                .ok_or_else(|| AuthError::Internal("token expiry out of range".into()))?
                .timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))?;
        Ok((token, claims))
    }

    fn decode_kind(&self, token: &str, kind: TokenKind) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        let claims = decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                debug!(error = %e, "token rejected");
                AuthError::InvalidToken
            })?
            .claims;

        // jsonwebtoken accepts `exp == now`; a token is only valid strictly before expiry.
        if claims.kind != kind || claims.exp <= Utc::now().timestamp() {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }
}
