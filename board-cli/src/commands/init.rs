//! Write a default configuration file.

use anyhow::Result;
use std::path::Path;

use crate::config::BoardConfig;

/// Run the init command.
pub fn run(config_path: &Path, force: bool) -> Result<()> {
    // Check if already initialized
    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {}. Pass --force to overwrite.",
            config_path.display()
        );
    }

    let config = BoardConfig::default();
    config.save(config_path)?;

    println!("Board initialized successfully!");
    println!();
    println!("  Config:    {}", config_path.display());
    println!("  Data file: {}", config.data_path(config_path).display());
    println!();
    println!("Next steps:");
    println!("  1. Show the board (creates default lists): board-cli show");
    println!("  2. Add a card: board-cli add \"To Do\" \"My first card\"");

    Ok(())
}
