//! Hermit chat bot
//!
//! ## Architecture
//!
//! - **bin_common**: helpers shared by the binaries (config path, runner)
//! - **wirelink**: resilient WebSocket session and dispatch (re-exported)
//! - **hermit_bot**: configuration, commands and bot wiring (re-exported)
//!
//! ## Usage in Binaries
//!
//! ```no_run
//! use hermit::bin_common::{load_config_from_env, ConfigType};
//! use hermit::hermit_bot::HermitConfig;
//!
//! let config = HermitConfig::load(load_config_from_env(ConfigType::Hermit));
//! ```

pub use hermit_bot;
pub use wirelink;

pub mod bin_common {
    //! Shared functionality for binary executables

    pub mod cli;
    pub mod runner;

    pub use cli::{load_config_from_env, parse_args, resolve_config_path, ConfigType};
    pub use runner::{BinaryRunner, RunConfig};
}
