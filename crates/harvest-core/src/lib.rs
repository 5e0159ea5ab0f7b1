pub mod config;
pub mod logging;

pub mod consolidate;
pub mod driver;
pub mod fetch;
pub mod partition;
pub mod record;
pub mod runner;
pub mod session;
pub mod storage;
