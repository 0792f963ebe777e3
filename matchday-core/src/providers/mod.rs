//! Clients for the external services the processors consume.

pub mod football;
pub mod push;

pub use football::{ApiFootballProvider, MatchDataProvider, ProviderError};
pub use push::{DeliveryError, PushDelivery, WebPushClient};
