/// Web Push (VAPID) settings.
#[derive(Debug, Clone)]
pub struct PushConfig {
    /// base64url uncompressed P-256 public key.
    pub vapid_public_key: String,
    /// base64url 32-byte private scalar.
    pub vapid_private_key: String,
    /// `mailto:` or `https:` contact sent as the VAPID `sub` claim.
    pub subject: String,
    pub ttl_seconds: u32,
    /// Attempts per endpoint and invocation; 1 means at-most-once.
    pub max_attempts: u32,
}
