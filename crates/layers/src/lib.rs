pub mod metadata;
pub mod model;
pub mod query;
pub mod symbology;

pub use metadata::*;
pub use model::*;
pub use query::*;
pub use symbology::*;
