//! HMAC-SHA256 body signing for the store webhooks.
//!
//! When a hook secret is configured, every webhook call carries:
//!
//! ```text
//! Matchday-Signature: {unix_timestamp}.{base64_signature}
//! ```
//!
//! where the signature is `HMAC-SHA256("{timestamp}.{json_body}", secret)`.

use crate::objects::Signature;

/// Header name for the HMAC signature.
pub const SIGNATURE_HEADER: &str = "Matchday-Signature";

/// Header name for service (moderator/admin) authentication.
pub const SERVICE_AUTH_HEADER: &str = "Matchday-Service-Authorization";

/// Maximum allowed age of a signature (in seconds).
pub const MAX_SIGNATURE_AGE: i64 = 5 * 60;

/// Errors produced by signature operations.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("invalid header format")]
    InvalidFormat,
    #[error("invalid base64 encoding")]
    InvalidBase64,
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid signature")]
    SignatureMismatch,
    #[error("signature expired")]
    Expired,
}

impl From<ring::error::Unspecified> for SignatureError {
    fn from(_: ring::error::Unspecified) -> Self {
        Self::SignatureMismatch
    }
}

/// A signed webhook body carrying its typed payload, timestamp, raw JSON
/// and HMAC-SHA256 signature.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedObject<T: Signature> {
    pub body: T,
    pub timestamp: i64,
    pub json: String,
    pub signature: Box<[u8]>,
}

impl<T: Signature> SignedObject<T> {
    /// Serialize `body`, sign it at the current time, and return the
    /// assembled [`SignedObject`].
    pub fn new(body: T, key: &[u8]) -> Result<Self, serde_json::Error> {
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        let json = serde_json::to_string(&body)?;
        let signature = sign_body(now, &json, key);
        Ok(Self {
            body,
            timestamp: now,
            json,
            signature,
        })
    }

    /// Reconstruct a [`SignedObject`] from a raw `Matchday-Signature`
    /// header value and the JSON request body.
    ///
    /// This parses the header and the body but does **not** verify the
    /// HMAC; call [`verify`](Self::verify) for that.
    pub fn from_header_and_body(
        header_value: &str,
        body_json: String,
    ) -> Result<Self, SignatureError> {
        let (timestamp, signature) = parse_signature_header(header_value)?;
        let body: T = serde_json::from_str(&body_json)?;
        Ok(Self {
            body,
            timestamp,
            json: body_json,
            signature,
        })
    }

    /// Verify the HMAC signature and timestamp freshness, consuming `self`
    /// and returning the authenticated payload.
    pub fn verify(self, key: &[u8]) -> Result<T, SignatureError> {
        let data = format!("{}.{}", self.timestamp, self.json);
        ring::hmac::verify(
            &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key),
            data.as_bytes(),
            self.signature.as_ref(),
        )?;
        check_timestamp(self.timestamp)?;
        Ok(self.body)
    }

    /// Format the full `Matchday-Signature` header value.
    pub fn to_header(&self) -> String {
        format_signature_header(self.timestamp, &self.signature)
    }
}

fn sign_body(timestamp: i64, json: &str, key: &[u8]) -> Box<[u8]> {
    let data = format!("{timestamp}.{json}");
    let signature = ring::hmac::sign(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key),
        data.as_bytes(),
    );
    signature.as_ref().to_owned().into_boxed_slice()
}

/// Parse a `{timestamp}.{base64}` header value into
/// `(timestamp, raw_signature_bytes)`.
pub fn parse_signature_header(value: &str) -> Result<(i64, Box<[u8]>), SignatureError> {
    let (timestamp, encoded) = value.split_once('.').ok_or(SignatureError::InvalidFormat)?;
    let timestamp: i64 = timestamp
        .parse()
        .map_err(|_| SignatureError::InvalidFormat)?;
    let signature_bytes = fast32::base64::RFC4648_NOPAD
        .decode_str(encoded)
        .map_err(|_| SignatureError::InvalidBase64)?
        .into_boxed_slice();
    Ok((timestamp, signature_bytes))
}

/// Format a `{timestamp}.{base64}` header value from its parts.
pub fn format_signature_header(timestamp: i64, signature: &[u8]) -> String {
    format!(
        "{}.{}",
        timestamp,
        fast32::base64::RFC4648_NOPAD.encode(signature)
    )
}

/// Check that a signature timestamp is within [`MAX_SIGNATURE_AGE`] of now,
/// in either direction.
pub fn check_timestamp(timestamp: i64) -> Result<(), SignatureError> {
    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    if now.saturating_sub(timestamp).saturating_abs() > MAX_SIGNATURE_AGE {
        return Err(SignatureError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::hooks::{NotificationInsertedHook, NotificationRecord};

    fn hook() -> NotificationInsertedHook {
        NotificationInsertedHook {
            event_type: Some("INSERT".into()),
            table: Some("notifications".into()),
            record: NotificationRecord {
                id: None,
                user_id: Some(uuid::Uuid::nil()),
                notification_type: None,
                title: "t".into(),
                message: "m".into(),
                data: serde_json::Value::Null,
            },
        }
    }

    #[test]
    fn header_round_trips_through_verification() {
        let signed = SignedObject::new(hook(), b"hook-secret").unwrap();
        let header = signed.to_header();
        let parsed =
            SignedObject::<NotificationInsertedHook>::from_header_and_body(&header, signed.json)
                .unwrap();
        assert_eq!(parsed.verify(b"hook-secret").unwrap(), hook());
    }

    #[test]
    fn wrong_key_is_rejected() {
        let signed = SignedObject::new(hook(), b"hook-secret").unwrap();
        assert!(matches!(
            signed.verify(b"other-secret"),
            Err(SignatureError::SignatureMismatch)
        ));
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        assert!(check_timestamp(now).is_ok());
        assert!(matches!(
            check_timestamp(now - MAX_SIGNATURE_AGE - 1),
            Err(SignatureError::Expired)
        ));
    }

    #[test]
    fn far_future_timestamp_is_rejected() {
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        assert!(check_timestamp(now + 30).is_ok());
        assert!(matches!(
            check_timestamp(now + MAX_SIGNATURE_AGE + 60),
            Err(SignatureError::Expired)
        ));
        assert!(matches!(
            check_timestamp(i64::MAX),
            Err(SignatureError::Expired)
        ));
    }

    #[test]
    fn malformed_header_is_rejected() {
        assert!(matches!(
            parse_signature_header("no-dot-here"),
            Err(SignatureError::InvalidFormat)
        ));
        assert!(matches!(
            parse_signature_header("123.!!!"),
            Err(SignatureError::InvalidBase64)
        ));
    }
}
