//! Custom Axum extractors for request authentication.
//!
//! Provides:
//! - `ServiceAuth`: checks the `Matchday-Service-Authorization` header
//!   against the hashed service secret (moderator/admin mutations).
//! - `HookBody<T>`: reads a webhook JSON body and, when a hook secret is
//!   configured, verifies its `Matchday-Signature` header first.
//!
//! All cryptographic operations are delegated to [`matchday_sdk::signature`]
//! and [`matchday_core::config::ServiceConfig`].

use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use matchday_sdk::objects::Signature;
use matchday_sdk::signature::{
    SERVICE_AUTH_HEADER, SIGNATURE_HEADER, SignatureError, SignedObject,
};

use crate::state::AppState;

/// Largest accepted webhook body.
const MAX_HOOK_BODY: usize = 1024 * 1024;

// ---------------------------------------------------------------------------
// ServiceAuth
// ---------------------------------------------------------------------------

/// Proof that the request carried the service secret.
pub struct ServiceAuth;

#[derive(Debug)]
pub enum ServiceAuthError {
    MissingHeader,
    InvalidSecret,
}

impl IntoResponse for ServiceAuthError {
    fn into_response(self) -> Response {
        let message = match self {
            ServiceAuthError::MissingHeader => "missing Matchday-Service-Authorization header",
            ServiceAuthError::InvalidSecret => "invalid service secret",
        };
        (StatusCode::UNAUTHORIZED, message).into_response()
    }
}

impl FromRequestParts<AppState> for ServiceAuth {
    type Rejection = ServiceAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get(SERVICE_AUTH_HEADER)
            .ok_or(ServiceAuthError::MissingHeader)?
            .to_str()
            .map_err(|_| ServiceAuthError::InvalidSecret)?;

        let service = state.config.service.read().await;
        if service.verify(presented) {
            Ok(ServiceAuth)
        } else {
            tracing::warn!("Rejected service request with a wrong secret");
            Err(ServiceAuthError::InvalidSecret)
        }
    }
}

// ---------------------------------------------------------------------------
// HookBody
// ---------------------------------------------------------------------------

/// A webhook body, authenticated when the `[hooks]` secret is set.
pub struct HookBody<T: Signature>(pub T);

#[derive(Debug, thiserror::Error)]
pub enum HookBodyError {
    #[error("missing Matchday-Signature header")]
    MissingHeader,
    #[error("invalid Matchday-Signature header format")]
    InvalidHeader,
    #[error("invalid signature encoding")]
    InvalidBase64,
    #[error("failed to read request body")]
    BodyReadError,
    #[error("invalid JSON body: {0}")]
    JsonError(serde_json::Error),
    #[error("signature verification failed")]
    VerificationFailed,
}

impl From<SignatureError> for HookBodyError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::InvalidFormat => Self::InvalidHeader,
            SignatureError::InvalidBase64 => Self::InvalidBase64,
            SignatureError::Json(e) => Self::JsonError(e),
            SignatureError::SignatureMismatch | SignatureError::Expired => Self::VerificationFailed,
        }
    }
}

impl IntoResponse for HookBodyError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            HookBodyError::MissingHeader => {
                (StatusCode::UNAUTHORIZED, "missing Matchday-Signature header")
            }
            HookBodyError::InvalidHeader => (
                StatusCode::BAD_REQUEST,
                "invalid Matchday-Signature header format",
            ),
            HookBodyError::InvalidBase64 => (StatusCode::BAD_REQUEST, "invalid signature encoding"),
            HookBodyError::BodyReadError => (StatusCode::BAD_REQUEST, "failed to read request body"),
            HookBodyError::JsonError(_) => (StatusCode::BAD_REQUEST, "invalid JSON body"),
            HookBodyError::VerificationFailed => {
                (StatusCode::UNAUTHORIZED, "signature verification failed")
            }
        };
        (status, message).into_response()
    }
}

impl<T: Signature + Send> FromRequest<AppState> for HookBody<T> {
    type Rejection = HookBodyError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let header_value = req
            .headers()
            .get(SIGNATURE_HEADER)
            .map(|v| v.to_str().map(str::to_owned))
            .transpose()
            .map_err(|_| HookBodyError::InvalidHeader)?;

        let body_bytes = axum::body::to_bytes(req.into_body(), MAX_HOOK_BODY)
            .await
            .map_err(|_| HookBodyError::BodyReadError)?;
        let json =
            String::from_utf8(body_bytes.to_vec()).map_err(|_| HookBodyError::BodyReadError)?;

        let hooks = state.config.hooks.read().await;
        let body = match hooks.secret.as_deref() {
            Some(secret) => {
                let header_value = header_value.ok_or(HookBodyError::MissingHeader)?;
                SignedObject::<T>::from_header_and_body(&header_value, json)?.verify(secret)?
            }
            None => serde_json::from_str(&json).map_err(HookBodyError::JsonError)?,
        };
        drop(hooks);

        Ok(HookBody(body))
    }
}
