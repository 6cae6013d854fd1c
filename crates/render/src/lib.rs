pub mod frame;
pub mod renderer;
pub mod svg;
pub mod viewport;

pub use frame::*;
pub use renderer::*;
pub use svg::*;
pub use viewport::*;
