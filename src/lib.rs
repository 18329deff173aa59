pub mod config;
pub mod core;
pub mod mapping;
pub mod pipeline;
pub mod report;
