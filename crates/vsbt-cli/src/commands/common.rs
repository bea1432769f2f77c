use log::info;
use std::path::Path;
use vsbt_core::{Address, CollectionConfig};

/// Load the collection config (file or built-in defaults), apply `VSBT_*`
/// environment overrides and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<CollectionConfig, Box<dyn std::error::Error>> {
    let mut config = match path {
        Some(p) => {
            if !p.exists() {
                return Err(format!("Config file not found: {}", p.display()).into());
            }
            info!("Loading collection config from {}", p.display());
            CollectionConfig::load_from_file(p)?
        }
        None => CollectionConfig::default(),
    };
    config.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
}

pub fn parse_address(input: &str) -> Result<Address, Box<dyn std::error::Error>> {
    vsbt_core::parse_address(input)
        .map_err(|e| format!("Invalid address '{}': {}", input, e).into())
}
