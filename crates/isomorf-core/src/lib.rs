pub mod app;
pub mod contact_tracker;
pub mod controller;
pub mod ipc;
pub mod snapshot;
pub mod voice_allocator;

pub use app::*;
pub use contact_tracker::*;
pub use controller::*;
pub use ipc::*;
pub use snapshot::*;
pub use voice_allocator::*;
