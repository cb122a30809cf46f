use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use timeline::config::{ConfigFormat, TimelineConfig};

/// Generates a default configuration file in the specified format.
///
/// # Arguments
/// * `format` - Serialization format of the file.
/// * `output` - Target path; `roomline.<format>` in the working directory
///   when omitted, stdout when `-`.
///
/// # Errors
/// Returns an error if rendering or writing the file fails.
pub fn generate_config(format: ConfigFormat, output: Option<&Path>) -> anyhow::Result<()> {
    let rendered = TimelineConfig::with_defaults()
        .render(format)
        .context("failed to render configuration")?;

    let target = output.map_or_else(
        || PathBuf::from(format!("roomline.{}", format.as_str())),
        Path::to_path_buf,
    );

    if target.as_os_str() == "-" {
        io::stdout().write_all(rendered.as_bytes())?;
        return Ok(());
    }

    fs::write(&target, rendered)
        .with_context(|| format!("failed to write {}", target.display()))?;
    println!(
        "Configuration file '{}' generated successfully.",
        target.display()
    );
    Ok(())
}
