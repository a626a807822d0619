// Data structures shared by the handlers, services and backends

pub mod cluster;
pub mod sweep;

pub use cluster::*;
pub use sweep::*;
