use axum::{extract::FromRequestParts, http::HeaderValue};
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

pub const USER_ID_HEADER: &str = "x-user-id";

/// Owner of a cart, its orders and saved addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
}

impl Identity {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

/// Takes the identity from the request header, falling back to the configured default.
pub fn resolve_identity(header: Option<&HeaderValue>, default: Uuid) -> Result<Identity, AppError> {
    let Some(value) = header else {
        return Ok(Identity::new(default));
    };

    let raw = value
        .to_str()
        .map_err(|_| AppError::InvalidArgument(format!("Invalid {USER_ID_HEADER} header")))?;
    let user_id = Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::InvalidArgument(format!("{USER_ID_HEADER} must be a UUID")))?;

    Ok(Identity::new(user_id))
}

impl FromRequestParts<AppState> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve_identity(
            parts.headers.get(USER_ID_HEADER),
            state.config.default_user_id,
        )
    }
}
