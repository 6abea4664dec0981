pub mod health;
pub use self::health::health;

pub mod keys;
pub use self::keys::keys;

pub mod session;
pub use self::session::session;

use std::fmt;
use std::sync::Arc;

use crate::cookie::CookieProtector;
use crate::crypto::CryptoProvider;
use crate::session::{SessionRegistry, SessionTokenCodec};

/// Shared, read-only state for every handler.
pub struct AppState {
    pub crypto: Arc<CryptoProvider>,
    pub sessions: Arc<SessionTokenCodec>,
    pub cookies: Arc<CookieProtector>,
    pub cookie_name: String,
    pub registry: Option<Arc<dyn SessionRegistry>>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("cookie_name", &self.cookie_name)
            .field("registry", &self.registry.is_some())
            .finish_non_exhaustive()
    }
}
