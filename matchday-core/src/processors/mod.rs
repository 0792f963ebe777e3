//! Long-running and per-request processors.
//!
//! - `MatchPoller`: one provider poll for a room view
//! - `LiveMatchView`: reducer both the poller and the change stream write through
//! - `RoomSession`: one open room view (poll interval + change subscription)
//! - `ChangeListener`: Postgres LISTEN, fans row changes out on broadcast channels
//! - `PushDispatcher`: notification fan-out to every push subscription of a user

pub mod change_listener;
pub mod live_match_view;
pub mod match_poller;
pub mod push_dispatcher;
pub mod room_session;

pub use change_listener::{ChangeListener, ListenerError};
pub use live_match_view::{LiveMatchView, ViewUpdate};
pub use match_poller::{MatchPoller, PollOutcome};
pub use push_dispatcher::{DeliveryOutcome, DispatchError, DispatchReport, PushDispatcher};
pub use room_session::{RoomSession, RoomSessionHandle};
