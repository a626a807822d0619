pub mod cluster_handler;
pub mod health_handler;
