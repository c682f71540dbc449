pub mod audio;
pub mod backend;
pub mod midi;
pub mod settings;
pub mod surface;
pub mod types;

pub use audio::*;
pub use backend::*;
pub use midi::*;
pub use settings::*;
pub use surface::*;
pub use types::*;
