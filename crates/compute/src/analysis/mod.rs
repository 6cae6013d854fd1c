pub mod aggregate;
pub mod spatial;
pub mod statistics;
pub mod temporal;
