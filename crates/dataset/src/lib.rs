pub mod ids;
pub mod selection;
pub mod store;
pub mod temporal;

pub use ids::*;
pub use selection::*;
pub use store::*;
