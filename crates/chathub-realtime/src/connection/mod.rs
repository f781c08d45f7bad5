//! Connection lifecycle: handles, lifecycle events, heartbeat, and the manager
//! that serializes presence changes.

pub mod events;
pub mod handle;
pub mod heartbeat;
pub mod manager;

pub use events::ConnectionEvent;
pub use handle::ConnectionHandle;
pub use manager::ConnectionManager;
