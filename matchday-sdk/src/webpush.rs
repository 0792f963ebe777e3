//! Web Push message encryption and VAPID authentication.
//!
//! Messages are encrypted with the `aes128gcm` content coding (RFC 8188)
//! using the key agreement of RFC 8291:
//!
//! ```text
//! ecdh_secret = ECDH(as_private, ua_public)
//! PRK_key     = HKDF-Extract(auth_secret, ecdh_secret)
//! IKM         = HKDF-Expand(PRK_key, "WebPush: info\0" || ua_public || as_public, 32)
//! PRK         = HKDF-Extract(salt, IKM)
//! CEK         = HKDF-Expand(PRK, "Content-Encoding: aes128gcm\0", 16)
//! NONCE       = HKDF-Expand(PRK, "Content-Encoding: nonce\0", 12)
//! ```
//!
//! The encrypted body is `salt(16) || rs(4) || idlen(1) || as_public(65) ||
//! AES-128-GCM(CEK, NONCE, payload || 0x02)`.
//!
//! Push services are authenticated with an ES256 JWT (RFC 8292) sent as
//! `Authorization: vapid t={jwt}, k={public_key}`.

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use ring::rand::{SecureRandom, SystemRandom};
use ring::{aead, agreement, hkdf};
use serde::Serialize;

use crate::objects::push::PushSubscriptionDescriptor;

/// Record size advertised in the content-coding header.
pub const RECORD_SIZE: u32 = 4096;

/// Length of the content-coding header (salt, rs, idlen, keyid).
const HEADER_LEN: usize = 16 + 4 + 1 + 65;

const TAG_LEN: usize = 16;

/// Largest payload that fits into the single record a push message may use.
pub const MAX_PAYLOAD_LEN: usize = RECORD_SIZE as usize - HEADER_LEN - TAG_LEN - 1;

/// Lifetime of a VAPID token.
pub const VAPID_TOKEN_TTL_SECS: i64 = 12 * 60 * 60;

/// Errors produced while preparing a push message.
#[derive(Debug, thiserror::Error)]
pub enum WebPushError {
    #[error("invalid base64url value")]
    InvalidBase64,
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error("payload too large: {0} bytes")]
    PayloadTooLarge(usize),
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cryptographic operation failed")]
    Crypto,
    #[error("failed to sign VAPID token: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl From<ring::error::Unspecified> for WebPushError {
    fn from(_: ring::error::Unspecified) -> Self {
        Self::Crypto
    }
}

/// Decode a base64url value, with or without padding.
pub fn decode_base64url(value: &str) -> Result<Vec<u8>, WebPushError> {
    fast32::base64::RFC4648_URL_NOPAD
        .decode_str(value.trim().trim_end_matches('='))
        .map_err(|_| WebPushError::InvalidBase64)
}

/// Encode bytes as unpadded base64url.
pub fn encode_base64url(bytes: &[u8]) -> String {
    fast32::base64::RFC4648_URL_NOPAD.encode(bytes)
}

// ---------------------------------------------------------------------------
// Subscription keys
// ---------------------------------------------------------------------------

/// Decoded delivery target of one push subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushTarget {
    pub endpoint: String,
    /// Uncompressed P-256 public key of the user agent.
    pub p256dh: Vec<u8>,
    /// 16-byte authentication secret.
    pub auth: Vec<u8>,
}

impl PushTarget {
    /// Decode and check the keys of a browser subscription descriptor.
    pub fn from_descriptor(descriptor: &PushSubscriptionDescriptor) -> Result<Self, WebPushError> {
        let p256dh = decode_base64url(&descriptor.keys.p256dh)?;
        if p256dh.len() != 65 || p256dh[0] != 0x04 {
            return Err(WebPushError::InvalidKey(
                "p256dh must be an uncompressed P-256 point".into(),
            ));
        }
        let auth = decode_base64url(&descriptor.keys.auth)?;
        if auth.len() != 16 {
            return Err(WebPushError::InvalidKey(
                "auth secret must be 16 bytes".into(),
            ));
        }
        url::Url::parse(&descriptor.endpoint)?;
        Ok(Self {
            endpoint: descriptor.endpoint.clone(),
            p256dh,
            auth,
        })
    }
}

// ---------------------------------------------------------------------------
// Encryption
// ---------------------------------------------------------------------------

struct OkmLen(usize);

impl hkdf::KeyType for OkmLen {
    fn len(&self) -> usize {
        self.0
    }
}

/// Content-encryption key and nonce of one message.
struct MessageKeys {
    cek: [u8; 16],
    nonce: [u8; 12],
}

fn derive_message_keys(
    ecdh_secret: &[u8],
    auth_secret: &[u8],
    ua_public: &[u8],
    as_public: &[u8],
    salt: &[u8],
) -> Result<MessageKeys, WebPushError> {
    let prk_key = hkdf::Salt::new(hkdf::HKDF_SHA256, auth_secret).extract(ecdh_secret);
    let key_info: [&[u8]; 3] = [b"WebPush: info\0", ua_public, as_public];
    let mut ikm = [0u8; 32];
    prk_key.expand(&key_info, OkmLen(32))?.fill(&mut ikm)?;

    let prk = hkdf::Salt::new(hkdf::HKDF_SHA256, salt).extract(&ikm);
    let cek_info: [&[u8]; 1] = [b"Content-Encoding: aes128gcm\0"];
    let nonce_info: [&[u8]; 1] = [b"Content-Encoding: nonce\0"];
    let mut cek = [0u8; 16];
    let mut nonce = [0u8; 12];
    prk.expand(&cek_info, OkmLen(16))?.fill(&mut cek)?;
    prk.expand(&nonce_info, OkmLen(12))?.fill(&mut nonce)?;
    Ok(MessageKeys { cek, nonce })
}

/// Encrypt `payload` for the user agent owning `target`.
///
/// A fresh ephemeral key pair and salt are generated for every call, so the
/// same payload encrypts differently for every endpoint.
pub fn encrypt(payload: &[u8], target: &PushTarget) -> Result<Vec<u8>, WebPushError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(WebPushError::PayloadTooLarge(payload.len()));
    }

    let rng = SystemRandom::new();
    let mut salt = [0u8; 16];
    rng.fill(&mut salt)?;

    let as_private = agreement::EphemeralPrivateKey::generate(&agreement::ECDH_P256, &rng)?;
    let as_public = as_private.compute_public_key()?;
    let ua_public = agreement::UnparsedPublicKey::new(&agreement::ECDH_P256, &target.p256dh);
    let ecdh_secret = agreement::agree_ephemeral(as_private, &ua_public, |secret| secret.to_vec())?;

    let keys = derive_message_keys(
        &ecdh_secret,
        &target.auth,
        &target.p256dh,
        as_public.as_ref(),
        &salt,
    )?;

    let sealing_key = aead::LessSafeKey::new(aead::UnboundKey::new(&aead::AES_128_GCM, &keys.cek)?);
    let mut record = Vec::with_capacity(payload.len() + 1 + TAG_LEN);
    record.extend_from_slice(payload);
    // Padding delimiter of the last (and only) record.
    record.push(0x02);
    sealing_key.seal_in_place_append_tag(
        aead::Nonce::assume_unique_for_key(keys.nonce),
        aead::Aad::empty(),
        &mut record,
    )?;

    let mut body = Vec::with_capacity(HEADER_LEN + record.len());
    body.extend_from_slice(&salt);
    body.extend_from_slice(&RECORD_SIZE.to_be_bytes());
    body.push(as_public.as_ref().len() as u8);
    body.extend_from_slice(as_public.as_ref());
    body.extend_from_slice(&record);
    Ok(body)
}

// ---------------------------------------------------------------------------
// VAPID
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct VapidClaims<'a> {
    aud: &'a str,
    exp: i64,
    sub: &'a str,
}

/// DER prefix of a PKCS#8 v1 document holding a P-256 key, up to the private
/// scalar.
const PKCS8_P256_PREFIX: [u8; 36] = [
    0x30, 0x81, 0x87, 0x02, 0x01, 0x00, 0x30, 0x13, 0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d,
    0x02, 0x01, 0x06, 0x08, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07, 0x04, 0x6d, 0x30,
    0x6b, 0x02, 0x01, 0x01, 0x04, 0x20,
];

/// DER bytes between the private scalar and the public point.
const PKCS8_P256_PUBLIC_PREFIX: [u8; 5] = [0xa1, 0x44, 0x03, 0x42, 0x00];

/// Wrap a raw P-256 key pair into the PKCS#8 document the JWT encoder takes.
fn p256_pkcs8(private: &[u8], public: &[u8]) -> Result<Vec<u8>, WebPushError> {
    if private.len() != 32 {
        return Err(WebPushError::InvalidKey(
            "VAPID private key must be a 32-byte scalar".into(),
        ));
    }
    if public.len() != 65 || public[0] != 0x04 {
        return Err(WebPushError::InvalidKey(
            "VAPID public key must be an uncompressed P-256 point".into(),
        ));
    }
    let mut der = Vec::with_capacity(PKCS8_P256_PREFIX.len() + 32 + 5 + 65);
    der.extend_from_slice(&PKCS8_P256_PREFIX);
    der.extend_from_slice(private);
    der.extend_from_slice(&PKCS8_P256_PUBLIC_PREFIX);
    der.extend_from_slice(public);
    Ok(der)
}

/// Signs VAPID tokens with the application server key.
pub struct VapidSigner {
    encoding_key: EncodingKey,
    public_key: String,
    subject: String,
}

impl std::fmt::Debug for VapidSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VapidSigner")
            .field("public_key", &self.public_key)
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

impl VapidSigner {
    /// Build a signer from base64url keys as produced by common VAPID key
    /// generators: a 65-byte uncompressed public point and a 32-byte
    /// private scalar.
    pub fn from_base64_keys(
        public_key: &str,
        private_key: &str,
        subject: impl Into<String>,
    ) -> Result<Self, WebPushError> {
        let public = decode_base64url(public_key)?;
        let private = decode_base64url(private_key)?;
        let der = p256_pkcs8(&private, &public)?;
        let signer = Self {
            encoding_key: EncodingKey::from_ec_der(&der),
            public_key: encode_base64url(&public),
            subject: subject.into(),
        };
        // reject keys the JWT backend cannot sign with at load time
        signer
            .authorization("https://localhost", 0)
            .map_err(|e| WebPushError::InvalidKey(e.to_string()))?;
        Ok(signer)
    }

    /// The application server key to hand to `pushManager.subscribe()`.
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// The `Authorization` header value for a request to `endpoint`.
    pub fn authorization(&self, endpoint: &str, now: i64) -> Result<String, WebPushError> {
        let endpoint = url::Url::parse(endpoint)?;
        let audience = endpoint.origin().ascii_serialization();
        let claims = VapidClaims {
            aud: &audience,
            exp: now + VAPID_TOKEN_TTL_SECS,
            sub: &self.subject,
        };
        let token =
            jsonwebtoken::encode(&Header::new(Algorithm::ES256), &claims, &self.encoding_key)?;
        Ok(format!("vapid t={token}, k={}", self.public_key))
    }
}
