use axum::{
    Extension,
    extract::ConnectInfo,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, instrument};

use super::AppState;
use crate::claims::SystemRole;
use crate::error::{Error, RegistryError};
use crate::session::Session;

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct SessionInfo {
    pub session_id: String,
    pub user_id: String,
    pub role: SystemRole,
    pub roles: Vec<String>,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Session cookie as seen after the cookie layer has unprotected it.
fn cookie_token<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value)
        .filter(|token| !token.is_empty())
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)?
        .to_str()
        .ok()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

/// Request context handed to the session registry. The first
/// `X-Forwarded-For` hop wins over the socket peer address.
fn request_session(headers: &HeaderMap, peer: Option<SocketAddr>) -> Session {
    let ip = header_value(headers, "x-forwarded-for")
        .and_then(|value| {
            value
                .split(',')
                .next()
                .map(str::trim)
                .filter(|hop| !hop.is_empty())
                .map(ToString::to_string)
        })
        .or_else(|| peer.map(|addr| addr.ip().to_string()));

    Session {
        ip,
        app_agent: header_value(headers, header::USER_AGENT.as_str()),
        device_id: header_value(headers, "x-device-id"),
        app_name: header_value(headers, "x-app-name"),
        app_platform: header_value(headers, "x-app-platform"),
        app_origin: header_value(headers, header::ORIGIN.as_str()),
        ..Session::default()
    }
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::InvalidToken(_)
        | Error::InvalidSignature
        | Error::TokenExpired
        | Error::Session(RegistryError::NotRegistered | RegistryError::Revoked) => {
            StatusCode::UNAUTHORIZED
        }
        Error::Session(RegistryError::Timeout(_) | RegistryError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// axum handler for session validation
#[instrument(skip_all)]
pub async fn session(
    Extension(state): Extension<Arc<AppState>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Response {
    let Some(token) =
        bearer_token(&headers).or_else(|| cookie_token(&headers, &state.cookie_name))
    else {
        debug!("no session token presented");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "missing_token"})),
        )
            .into_response();
    };

    let session = request_session(&headers, peer.map(|ConnectInfo(addr)| addr));

    match state
        .sessions
        .validate_session(token, session, state.registry.as_deref())
        .await
    {
        Ok(validated) => {
            let info = SessionInfo {
                session_id: validated.session_id,
                role: validated.claims.role,
                roles: validated.claims.effective_roles(),
                user_id: validated.claims.user_id,
            };
            (StatusCode::OK, Json(info)).into_response()
        }
        Err(err) => {
            let status = status_for(&err);
            if status == StatusCode::INTERNAL_SERVER_ERROR {
                error!("Failed to validate session token: {err}");
            }
            (status, Json(json!({"error": err.kind()}))).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::time::Duration;

    #[test]
    fn bearer_takes_precedence_and_is_trimmed() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer  abc.def.ghi "),
        );
        headers.insert(header::COOKIE, HeaderValue::from_static("sid=cookie"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
        assert_eq!(cookie_token(&headers, "sid"), Some("cookie"));
    }

    #[test]
    fn non_bearer_schemes_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn cookie_lookup_matches_exact_name() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("sidx=1; sid=; other=2"),
        );
        assert_eq!(cookie_token(&headers, "sid"), None);
        assert_eq!(cookie_token(&headers, "sidx"), Some("1"));
    }

    #[test]
    fn request_session_reads_context_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static("app/1.0"));
        headers.insert("x-forwarded-for", HeaderValue::from_static(" 10.0.0.9, 172.16.0.1"));
        headers.insert("x-device-id", HeaderValue::from_static("dev-1"));
        headers.insert("x-app-name", HeaderValue::from_static("reader"));
        headers.insert("x-app-platform", HeaderValue::from_static("ios"));
        headers.insert(header::ORIGIN, HeaderValue::from_static("https://app.example"));

        let peer = SocketAddr::from(([127, 0, 0, 1], 4000));
        let session = request_session(&headers, Some(peer));
        assert_eq!(session.ip.as_deref(), Some("10.0.0.9"));
        assert_eq!(session.app_agent.as_deref(), Some("app/1.0"));
        assert_eq!(session.device_id.as_deref(), Some("dev-1"));
        assert_eq!(session.app_name.as_deref(), Some("reader"));
        assert_eq!(session.app_platform.as_deref(), Some("ios"));
        assert_eq!(session.app_origin.as_deref(), Some("https://app.example"));
        assert!(session.session_id.is_empty());
        assert!(session.user.is_none());
    }

    #[test]
    fn peer_address_is_the_fallback_ip() {
        let peer = SocketAddr::from(([192, 168, 1, 7], 4000));
        let session = request_session(&HeaderMap::new(), Some(peer));
        assert_eq!(session.ip.as_deref(), Some("192.168.1.7"));
        assert!(session.app_agent.is_none());
        assert!(request_session(&HeaderMap::new(), None).ip.is_none());
    }

    #[test]
    fn registry_outages_are_not_unauthorized() {
        assert_eq!(status_for(&Error::TokenExpired), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_for(&Error::Session(RegistryError::Revoked)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(&Error::Session(RegistryError::Timeout(Duration::from_secs(1)))),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&Error::Decryption),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
