//! Private-channel join authorization callback.
//!
//! Invoked by the pub/sub transport before admitting a subscriber to a
//! private channel. A deny is a normal outcome (403), not an error.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::error::{AppError, Result};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct ChannelAuthRequest {
    pub channel: String,
}

#[derive(Debug, Serialize)]
pub struct ChannelAuthResponse {
    pub granted: bool,
    pub channel: String,
}

#[tracing::instrument(
    name = "http.authorize_channel",
    skip(state, headers, request),
    fields(channel = %request.channel)
)]
pub async fn authorize_channel(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChannelAuthRequest>,
) -> Result<(StatusCode, Json<ChannelAuthResponse>)> {
    let token = bearer_token(&headers)
        .ok_or_else(|| AppError::Auth("Missing bearer token".to_string()))?;
    let claims = state.jwt_validator.validate(token)?;
    let principal = claims.principal()?;

    let channel = Channel::parse(&request.channel).ok_or_else(|| {
        AppError::Validation(format!("Unknown channel name: {}", request.channel))
    })?;

    let granted = state.authorizer.authorize(principal, &channel).await;
    let status = if granted {
        StatusCode::OK
    } else {
        StatusCode::FORBIDDEN
    };

    Ok((
        status,
        Json(ChannelAuthResponse {
            granted,
            channel: request.channel,
        }),
    ))
}

/// Extract bearer token from the Authorization header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
