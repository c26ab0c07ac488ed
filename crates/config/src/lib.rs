//! Configuration for blind schema reconstruction.
//!
//! A config file pins the target endpoint, HTTP settings (headers, timeouts,
//! retries) and reconstruction tuning (bucket sizes, concurrency, depth,
//! pacing) so that repeated runs against the same API do not need long command
//! lines. YAML, JSON and TOML are accepted.

mod config;
mod error;
mod loader;

pub use config::{BlindqlConfig, HttpConfig, ReconstructionConfig};
pub use error::{ConfigError, Result};
pub use loader::{find_config, load_config, load_config_from_str, CONFIG_FILES};
