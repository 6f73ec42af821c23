//! # Hermit Bot
//!
//! Chat bot on top of a wirelink session:
//!
//! - **config**: YAML configuration with environment overrides
//! - **commands**: the built-in `ping`, `echo` and `help` commands
//! - **bot**: wires session, dispatcher and commands together
//! - **logging** / **utils**: tracing setup and Ctrl+C handling

pub mod bot;
pub mod commands;
pub mod config;
pub mod logging;
pub mod utils;

pub use bot::Bot;
pub use config::{ConfigError, HermitConfig};
pub use logging::init_tracing;
pub use utils::ShutdownManager;
