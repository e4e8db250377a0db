//! Platform abstraction layer
//!
//! Everything the engine consumes from the host app:
//! - Time (monotonic clock)
//! - Asset loading keyed by asset key
//! - The paired-device channel used for ledger sync

pub mod assets;
pub mod clock;
pub mod peer;

pub use assets::{AssetKind, AssetLoader, AssetRequest, SimulatedLoader};
pub use clock::{Clock, ManualClock, SystemClock};
pub use peer::{LoopbackPeer, OfflinePeer, PeerChannel};
