pub mod cli;
pub mod collect;
pub mod config;
pub mod error;
pub mod report;
pub mod sample;
pub mod store;
pub mod util;
