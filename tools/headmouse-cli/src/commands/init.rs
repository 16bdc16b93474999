//! Write the default configuration file.

use std::path::PathBuf;

use headmouse_common::config::{config_file_path, AppConfig};

pub fn run(path: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(config_file_path);

    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    AppConfig::default()
        .save_to(&path)
        .map_err(|e| anyhow::anyhow!("Failed to write config: {e}"))?;

    println!("Wrote default configuration to {}", path.display());
    println!();
    println!("Sections:");
    println!("  tuning   (sensitivity, dead zones, clamps, mode)");
    println!("  driver   (tick rate, source, sink, control keys)");
    println!("  logging  (level, json, file)");

    Ok(())
}
