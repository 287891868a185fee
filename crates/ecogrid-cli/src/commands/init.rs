use std::path::Path;

use anyhow::{Context, Result, bail};
use ecogrid_model::SimConfig;

/// Write the default configuration to `path`. Refuses to overwrite.
pub fn init_config(path: &str) -> Result<()> {
    let output = Path::new(path);
    if output.exists() {
        bail!("{} already exists", output.display());
    }

    let content = SimConfig::default().to_toml_string()?;
    std::fs::write(output, content)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("✓ Generated {}", output.display());
    Ok(())
}
