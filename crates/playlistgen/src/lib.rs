pub mod app;
pub mod cli;
pub mod domain;
pub mod infra;

use infra::logging::LogLevel;

pub fn init(level: LogLevel) {
    infra::logging::init(level);
}
