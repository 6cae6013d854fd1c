pub mod boundaries;
pub mod error;
pub mod recordings;

pub use boundaries::*;
pub use error::*;
pub use recordings::*;
