//! Config command implementation.
//!
//! Writes a configuration file holding the built-in defaults.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::Config;

/// Generates a default configuration file, or prints it when no path is given.
pub fn command_config(output: Option<PathBuf>, format: ConfigFormat) -> anyhow::Result<()> {
    let content = Config::default().render(&format)?;

    match output {
        Some(path) if path.to_string_lossy() != "-" => {
            fs::write(&path, content)?;
            println!("✅ Configuration written to: {}", path.display());
        }
        _ => print!("{content}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;

    #[test]
    fn test_generated_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        for (format, file) in [
            (ConfigFormat::Yaml, "config.yaml"),
            (ConfigFormat::Json, "config.json"),
            (ConfigFormat::Toml, "config.toml"),
        ] {
            let path = dir.path().join(file);
            command_config(Some(path.clone()), format).unwrap();
            assert_eq!(load_config(Some(&path)).unwrap(), Config::default());
        }
    }
}
