pub mod geometry;
pub mod layout;
pub mod pitch_cell;
pub mod presets;

pub use geometry::*;
pub use layout::*;
pub use pitch_cell::*;
pub use presets::*;
