pub mod config;
pub mod hierarchy_server;
pub mod hierarchy_types;
pub mod logging;
pub mod tree_model;
