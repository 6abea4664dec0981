//! axum middleware that unprotects the session cookie on the way in and
//! protects it on the way out.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, Method, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};

use super::CookieProtector;

#[derive(Clone, Debug)]
pub struct CookieLayerState {
    protector: Arc<CookieProtector>,
    cookie_name: String,
}

impl CookieLayerState {
    #[must_use]
    pub fn new(protector: Arc<CookieProtector>, cookie_name: impl Into<String>) -> Self {
        Self {
            protector,
            cookie_name: cookie_name.into(),
        }
    }
}

/// Use with `axum::middleware::from_fn_with_state`.
pub async fn rewrite_session_cookie(
    State(state): State<CookieLayerState>,
    mut request: Request,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }

    unprotect_request_cookies(&state, request.headers_mut());
    let mut response = next.run(request).await;
    protect_response_cookies(&state, response.headers_mut());
    response
}

fn unprotect_request_cookies(state: &CookieLayerState, headers: &mut HeaderMap) {
    let rewritten: Vec<HeaderValue> = headers
        .get_all(header::COOKIE)
        .iter()
        .map(|value| {
            let Ok(text) = value.to_str() else {
                return value.clone();
            };
            let cookies: Vec<String> = text
                .split(';')
                .map(|pair| {
                    let pair = pair.trim();
                    match pair.split_once('=') {
                        Some((name, raw)) if name == state.cookie_name => {
                            format!("{name}={}", state.protector.unprotect_cookie(raw))
                        }
                        _ => pair.to_string(),
                    }
                })
                .collect();
            HeaderValue::from_str(&cookies.join("; ")).unwrap_or_else(|_| {
                debug!("unprotected cookie is not a valid header value");
                value.clone()
            })
        })
        .collect();

    headers.remove(header::COOKIE);
    for value in rewritten {
        headers.append(header::COOKIE, value);
    }
}

fn protect_response_cookies(state: &CookieLayerState, headers: &mut HeaderMap) {
    let prefix = format!("{}=", state.cookie_name);
    let mut rewritten: Vec<HeaderValue> = Vec::new();

    for value in headers.get_all(header::SET_COOKIE) {
        let Some(text) = value.to_str().ok() else {
            rewritten.push(value.clone());
            continue;
        };
        let (pair, attributes) = text.split_once(';').unwrap_or((text, ""));
        let Some(raw) = pair.strip_prefix(&prefix) else {
            rewritten.push(value.clone());
            continue;
        };
        if raw.is_empty() {
            // Clearing the cookie; nothing to protect.
            rewritten.push(value.clone());
            continue;
        }

        let protected = match state.protector.protect_cookie(raw) {
            Ok(protected) => protected,
            Err(err) => {
                warn!(error = %err, "dropping session cookie that could not be protected");
                continue;
            }
        };

        let mut cookie = format!("{prefix}{protected}");
        if !attributes.trim().is_empty() {
            cookie.push(';');
            cookie.push_str(attributes);
        }
        let http_only = attributes
            .split(';')
            .any(|attr| attr.trim().eq_ignore_ascii_case("httponly"));
        if !http_only {
            cookie.push_str("; HttpOnly");
        }

        match HeaderValue::from_str(&cookie) {
            Ok(value) => rewritten.push(value),
            Err(err) => warn!(error = %err, "dropping session cookie with invalid header value"),
        }
    }

    headers.remove(header::SET_COOKIE);
    for value in rewritten {
        headers.append(header::SET_COOKIE, value);
    }
}
