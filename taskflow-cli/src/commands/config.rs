use std::{fs, path::Path};

use anyhow::{Context, Result, bail};
use shared::config::ClientConfig;

/// Writes a configuration file with default values.
///
/// # Arguments
/// * `format` - "yaml" or "json".
/// * `output` - Target file; `config.<format>` in the current directory when `None`.
///
/// # Errors
/// Returns an error if the format is unsupported or if writing the file fails.
pub fn generate_config(format: &str, output: Option<&Path>) -> Result<()> {
    let config = ClientConfig::with_defaults();
    let (serialized, file_name) = match format {
        "yaml" => (serde_yml::to_string(&config)?, "config.yaml"),
        "json" => (serde_json::to_string_pretty(&config)?, "config.json"),
        other => bail!("unsupported format '{other}'. Use 'yaml' or 'json'."),
    };

    let target = output.unwrap_or_else(|| Path::new(file_name));
    fs::write(target, serialized)
        .with_context(|| format!("failed to write {}", target.display()))?;

    println!("Configuration file '{}' generated successfully.", target.display());
    Ok(())
}
