//! Session tokens: a signed, compact token binding an encrypted session id to
//! an access token.
//!
//! Payload fields are `iat` (issue time), `jti` (session id encrypted under the
//! reversed master secret), `uid` (user id), `jtk` (access token) and `jts` (a
//! master-keyed HMAC over `jtk@session_id`). The outer signature uses a key
//! derived from the token-signing secret, never the master secret itself.

mod jwt;
mod registry;

pub use registry::{HttpSessionRegistry, RegistryFuture, SessionRegistry};

use secrecy::ExposeSecret;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::access_token::AccessTokenCodec;
use crate::claims::Claims;
use crate::config::TokenConfig;
use crate::crypto::{CryptoProvider, HmacAlgorithm};
use crate::error::{Error, RegistryError, Result};

/// Issue times further ahead of the local clock than this are rejected.
pub const MAX_CLOCK_SKEW_SECONDS: i64 = 60;

/// Source of the current Unix time in seconds.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Caller-owned session record; `decode` binds the session id and user into it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    pub session_id: String,
    pub user: Option<Claims>,
    pub ip: Option<String>,
    pub app_agent: Option<String>,
    pub device_id: Option<String>,
    pub app_name: Option<String>,
    pub app_platform: Option<String>,
    pub app_origin: Option<String>,
}

impl Session {
    #[must_use]
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSession {
    /// Still-opaque access token, suitable for forwarding to other services.
    pub access_token: String,
    pub session_id: String,
    pub claims: Claims,
}

pub struct SessionTokenCodec {
    crypto: Arc<CryptoProvider>,
    access_tokens: AccessTokenCodec,
    signing_key: Vec<u8>,
    ttl_seconds: i64,
    algorithm: HmacAlgorithm,
    registry_timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for SessionTokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTokenCodec")
            .field("ttl_seconds", &self.ttl_seconds)
            .field("algorithm", &self.algorithm)
            .field("registry_timeout", &self.registry_timeout)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl SessionTokenCodec {
    /// # Errors
    /// Returns `KeyInitialization` if the token-signing secret is blank.
    pub fn new(crypto: Arc<CryptoProvider>, config: &TokenConfig) -> Result<Self> {
        let signing_secret = config.signing_secret().expose_secret();
        if signing_secret.trim().is_empty() {
            return Err(Error::KeyInitialization(
                "token signing secret is empty".to_string(),
            ));
        }
        let signing_key = crypto.derive_signing_key(signing_secret)?;

        Ok(Self {
            access_tokens: AccessTokenCodec::new(Arc::clone(&crypto)),
            crypto,
            signing_key,
            ttl_seconds: config.token_ttl_seconds(),
            algorithm: config.signature_algorithm(),
            registry_timeout: config.registry_timeout(),
            clock: Arc::new(SystemClock),
        })
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub const fn access_tokens(&self) -> &AccessTokenCodec {
        &self.access_tokens
    }

    fn binding_data(access_token: &str, session_id: &str) -> String {
        format!("{access_token}@{session_id}")
    }

    /// Issue a session token for `session_id` carrying `claims`.
    ///
    /// # Errors
    /// Returns `InvalidInput` for a blank session id or user id, or
    /// `Encryption` if a cipher fails.
    #[instrument(skip_all, fields(user_id = %claims.user_id))]
    pub fn encode(&self, session_id: &str, claims: &Claims) -> Result<String> {
        if session_id.trim().is_empty() {
            return Err(Error::invalid_input("session id is empty"));
        }

        let access_token = self.access_tokens.encode(claims)?;
        let reversed = self.crypto.reversed_secret();
        let encrypted_session_id = self
            .crypto
            .aes_encrypt(session_id, Some(reversed.expose_secret()))?;
        let signature = self.crypto.sign(
            &Self::binding_data(&access_token, session_id),
            self.algorithm,
        )?;

        let payload = jwt::Payload {
            iat: Some(self.clock.now()),
            jti: Some(encrypted_session_id),
            uid: Some(claims.user_id.clone()),
            jtk: Some(access_token),
            jts: Some(signature),
        };
        jwt::sign(&payload, &self.signing_key)
    }

    /// Verify `token`, bind its session id and user into `session`, run the
    /// optional registry check, and return the embedded access token.
    ///
    /// # Errors
    /// `InvalidSignature` for a bad outer signature or a broken
    /// session/access-token binding, `TokenExpired` outside the freshness
    /// window, `InvalidToken` for any other structural problem, and
    /// `Session` for registry rejections or timeouts.
    #[instrument(skip_all)]
    pub async fn decode(
        &self,
        token: &str,
        session: &mut Session,
        registry: Option<&dyn SessionRegistry>,
    ) -> Result<String> {
        let (session_id, access_token, claims) = self.verify(token).inspect_err(|err| {
            if err.is_security_event() {
                warn!(kind = err.kind(), "session token signature rejected");
            } else {
                debug!(kind = err.kind(), error = %err, "session token rejected");
            }
        })?;

        session.session_id = session_id;
        session.user = Some(claims);

        if let Some(registry) = registry {
            self.check_registered(registry, session).await?;
        }

        Ok(access_token)
    }

    /// Decode `token` into a fresh session and return everything it carries.
    ///
    /// # Errors
    /// See [`SessionTokenCodec::decode`].
    pub async fn validate(
        &self,
        token: &str,
        registry: Option<&dyn SessionRegistry>,
    ) -> Result<ValidatedSession> {
        self.validate_session(token, Session::default(), registry)
            .await
    }

    /// Like [`SessionTokenCodec::validate`], starting from a session that
    /// already carries the caller's request context, so the registry sees it.
    ///
    /// # Errors
    /// See [`SessionTokenCodec::decode`].
    pub async fn validate_session(
        &self,
        token: &str,
        mut session: Session,
        registry: Option<&dyn SessionRegistry>,
    ) -> Result<ValidatedSession> {
        let access_token = self.decode(token, &mut session, registry).await?;
        let claims = session
            .user
            .take()
            .ok_or_else(|| Error::invalid_token("user identity is invalid"))?;
        Ok(ValidatedSession {
            access_token,
            session_id: session.session_id,
            claims,
        })
    }

    fn verify(&self, token: &str) -> Result<(String, String, Claims)> {
        let payload = jwt::verify(token, &self.signing_key)?;

        // A token without an issue time is treated as already expired.
        let issued_at = payload.iat.ok_or(Error::TokenExpired)?;
        let age = self
            .clock
            .now()
            .checked_sub(issued_at)
            .ok_or(Error::TokenExpired)?;
        if age > self.ttl_seconds || age < -MAX_CLOCK_SKEW_SECONDS {
            return Err(Error::TokenExpired);
        }

        let reversed = self.crypto.reversed_secret();
        let session_id = payload
            .jti
            .as_deref()
            .and_then(|jti| {
                self.crypto
                    .aes_decrypt(jti, Some(reversed.expose_secret()))
                    .ok()
            })
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::invalid_token("identity is invalid"))?;

        let access_token = payload
            .jtk
            .filter(|jtk| !jtk.trim().is_empty())
            .ok_or_else(|| Error::invalid_token("access token is invalid"))?;

        let signature = payload.jts.unwrap_or_default();
        let binding = Self::binding_data(&access_token, &session_id);
        if !self.crypto.verify(&binding, &signature, self.algorithm)? {
            return Err(Error::InvalidSignature);
        }

        let user_id = payload
            .uid
            .filter(|uid| !uid.is_empty())
            .ok_or_else(|| Error::invalid_token("user identity is invalid"))?;

        let claims = self.access_tokens.decode(&access_token)?;
        if claims.user_id != user_id {
            return Err(Error::invalid_token("user identity is invalid"));
        }

        Ok((session_id, access_token, claims))
    }

    async fn check_registered(
        &self,
        registry: &dyn SessionRegistry,
        session: &Session,
    ) -> Result<()> {
        match tokio::time::timeout(self.registry_timeout, registry.check(session)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => {
                debug!(session_id = %session.session_id, error = %err, "session registry rejected session");
                Err(err.into())
            }
            Err(_) => {
                warn!(session_id = %session.session_id, "session registry timed out");
                Err(RegistryError::Timeout(self.registry_timeout).into())
            }
        }
    }
}
