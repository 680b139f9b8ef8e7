//! Request gating: admin bearer tokens for writes, a static API key for reads.

use axum::{
    http::{header, HeaderMap, StatusCode},
    Json,
};
use server_api::auth::{bearer_token, verify_admin_token, AdminClaims};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::API_KEY_HEADER,
};
use tracing::warn;

use crate::{app_state::AppState, routes::HttpError};

pub(crate) fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<AdminClaims, HttpError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| {
            warn!("mutating request without bearer token");
            (
                StatusCode::UNAUTHORIZED,
                Json(ApiError::new(
                    ErrorCode::Unauthorized,
                    "missing bearer token",
                )),
            )
        })?;

    verify_admin_token(&state.admin_jwt_secret, token).map_err(|err| {
        warn!(error = %err.message, "rejected admin token");
        crate::routes::into_http(err)
    })
}

pub(crate) fn require_api_key(state: &AppState, headers: &HeaderMap) -> Result<(), HttpError> {
    let provided = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    if provided != Some(state.read_api_key.as_str()) {
        warn!("read request with missing or wrong api key");
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ApiError::new(
                ErrorCode::Unauthorized,
                "missing or invalid api key",
            )),
        ));
    }
    Ok(())
}
