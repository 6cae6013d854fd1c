pub mod precision;
pub mod projection;

pub use precision::*;
pub use projection::*;
