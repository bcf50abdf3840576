use std::path::Path;

use anyhow::Result;
use calmirror_core::config::MirrorConfig;
use owo_colors::OwoColorize;

pub fn run(explicit_path: Option<&Path>, config: &MirrorConfig) -> Result<()> {
    let config_path = match explicit_path {
        Some(path) => path.to_path_buf(),
        None => MirrorConfig::config_path()?,
    };

    println!("{}", "Paths".bold());
    println!("  Config:     {}", config_path.display());
    println!("  Provider:   calmirror-provider-{}", config.provider);

    println!("\n{}", "Effective configuration".bold());
    for line in config.to_toml()?.lines() {
        println!("  {}", line);
    }

    Ok(())
}
