//! The `keylink` operator tool: generate delegate keys, authorize them with
//! a primary key held in a file, and check records and operations.

pub mod app;
pub mod cli;
pub mod config;
pub mod keyfile;
pub mod logging;
