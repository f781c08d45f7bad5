//! Who is online: the registry, the online-set broadcaster, and the reaper.

pub mod broadcaster;
pub mod reaper;
pub mod registry;

pub use broadcaster::PresenceBroadcaster;
pub use registry::{PresenceEntry, PresenceRegistry};
