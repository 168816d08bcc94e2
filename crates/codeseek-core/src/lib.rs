//! Configuration and wiring for the codeseek service.

pub mod bootstrap;
pub mod config;

pub use bootstrap::{App, AppBuilder, resolve_config_path};
pub use config::Config;
