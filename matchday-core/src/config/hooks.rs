/// Incoming webhook settings.
#[derive(Debug, Clone, Default)]
pub struct HooksConfig {
    /// When set, webhook bodies must carry a valid `Matchday-Signature`.
    pub secret: Option<Box<[u8]>>,
}
