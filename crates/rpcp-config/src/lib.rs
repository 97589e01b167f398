pub mod layering;
pub mod tree;

pub use layering::{load_layered_yaml, load_layered_yaml_strs, LoadedConfig};
pub use tree::RpcpConfig;

use anyhow::{Context, Result};
use std::path::Path;

/// Load layered YAML config files and deserialize directly into the typed
/// [`RpcpConfig`] tree. This is the entry point `rpcp-daemon`/`rpcp-cli`
/// call at startup.
pub fn load_config(paths: &[impl AsRef<Path>]) -> Result<(RpcpConfig, LoadedConfig)> {
    let loaded = load_layered_yaml(paths)?;
    let cfg: RpcpConfig =
        serde_json::from_value(loaded.config_json.clone()).context("deserialize RpcpConfig")?;
    Ok((cfg, loaded))
}
