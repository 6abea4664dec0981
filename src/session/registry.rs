use reqwest::StatusCode;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use super::Session;
use crate::error::{Error, RegistryError, Result};

pub type RegistryFuture<'a> = Pin<Box<dyn Future<Output = Result<(), RegistryError>> + Send + 'a>>;

/// External system of record for sessions, consulted after a session token has
/// been verified.
///
/// Implementations should not retry internally; the codec bounds each call with
/// its configured timeout.
pub trait SessionRegistry: Send + Sync {
    fn check<'a>(&'a self, session: &'a Session) -> RegistryFuture<'a>;
}

/// Registry backed by an HTTP session store: `GET {base}/sessions/{id}`.
#[derive(Debug, Clone)]
pub struct HttpSessionRegistry {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpSessionRegistry {
    /// # Errors
    /// Returns `InvalidInput` if `base_url` is not an absolute http(s) URL or the
    /// client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|err| Error::invalid_input(format!("session registry url: {err}")))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::invalid_input(
                "session registry url must be http or https",
            ));
        }

        let client = reqwest::Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|err| Error::invalid_input(format!("session registry client: {err}")))?;

        Ok(Self { client, base_url })
    }

    fn session_url(&self, session_id: &str) -> Result<Url, RegistryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RegistryError::Unavailable("invalid registry url".to_string()))?
            .pop_if_empty()
            .push("sessions")
            .push(session_id);
        Ok(url)
    }

    #[instrument(skip_all, fields(session_id = %session.session_id))]
    async fn lookup(&self, session: &Session) -> Result<(), RegistryError> {
        let url = self.session_url(&session.session_id)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| RegistryError::Unavailable(err.to_string()))?;

        let status = response.status();
        debug!(%status, "session registry answered");

        match status {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(RegistryError::NotRegistered),
            StatusCode::GONE => Err(RegistryError::Revoked),
            s => Err(RegistryError::Unavailable(format!("unexpected status {s}"))),
        }
    }
}

impl SessionRegistry for HttpSessionRegistry {
    fn check<'a>(&'a self, session: &'a Session) -> RegistryFuture<'a> {
        Box::pin(self.lookup(session))
    }
}
