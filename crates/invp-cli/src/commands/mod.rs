//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod history;
pub mod parse;
pub mod process;
pub mod serve;
pub mod validate;

use std::path::Path;

use invp_core::InvpConfig;

/// Load configuration from `path`, else from the default config file when
/// it exists, else defaults. Environment overrides are applied last.
pub fn load_config(path: Option<&str>) -> anyhow::Result<InvpConfig> {
    let config = match path {
        Some(path) => InvpConfig::from_file(Path::new(path))?,
        None => {
            let default_path = config::default_config_path();
            if default_path.exists() {
                InvpConfig::from_file(&default_path)?
            } else {
                InvpConfig::default()
            }
        }
    };

    Ok(config.with_env_overrides())
}
