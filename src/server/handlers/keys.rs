use axum::{Extension, response::Json};
use std::sync::Arc;

use super::AppState;
use crate::crypto::PublicKeyInfo;

/// Public half of the process key pair, hex encoded.
pub async fn keys(Extension(state): Extension<Arc<AppState>>) -> Json<PublicKeyInfo> {
    Json(state.crypto.public_key().clone())
}
