pub mod backup;
pub mod calc;
pub mod config;
pub mod db;
pub mod gradebook;
pub mod ipc;
pub mod model;
pub mod report;
pub mod store;
