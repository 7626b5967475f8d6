pub mod bench;
pub mod config;
pub mod domain;
pub mod error;
pub mod report;
pub mod store;
