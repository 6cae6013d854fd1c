pub mod event_bus;
pub mod player;
pub mod timeline;

pub use event_bus::*;
pub use player::*;
pub use timeline::*;
