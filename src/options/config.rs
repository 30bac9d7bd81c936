pub mod general;
pub mod paths;
pub mod swap;

use serde::Deserialize;

use self::{general::GeneralConfig, paths::PathsConfig, swap::SwapConfig};

/// The config file. Every section and value is optional; anything missing
/// falls back to a command-line argument or the built-in default.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub(crate) swap: Option<SwapConfig>,
    pub(crate) paths: Option<PathsConfig>,
    pub(crate) general: Option<GeneralConfig>,
}
