use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use equity_val_core::{EngineConfig, ValuationError};

/// Read a snapshot document. Unparseable contents are rejected input
/// (`InvalidInput` on `input`), not an I/O failure.
pub fn read_json_value(path: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = read(&canonical)?;
    let value = serde_json::from_str(&contents).map_err(|e| ValuationError::InvalidInput {
        field: "input".into(),
        reason: format!("Failed to parse '{}': {}", canonical.display(), e),
    })?;
    Ok(value)
}

/// Read an engine configuration from JSON or YAML, chosen by extension.
/// Unknown keys and malformed values surface as `InvalidConfig`.
pub fn read_config(path: &str) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = read(&canonical)?;
    let ext = canonical
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let parsed: Result<EngineConfig, String> = match ext.as_deref() {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&contents).map_err(|e| e.to_string()),
        Some("json") => serde_json::from_str(&contents).map_err(|e| e.to_string()),
        _ => {
            return Err(format!(
                "Unsupported config format '{}': expected .json, .yaml or .yml",
                canonical.display()
            )
            .into())
        }
    };

    let config = parsed.map_err(|reason| ValuationError::InvalidConfig {
        field: canonical.display().to_string(),
        reason,
    })?;
    config.validate()?;
    Ok(config)
}

fn read(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    Ok(fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?)
}

/// Resolve the path against the working directory and check it is a file.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}
