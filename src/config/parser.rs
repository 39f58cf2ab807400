//! Loading render contexts from files.
//!
//! The command-line front-end reads the data context for a render from a
//! YAML, JSON, or TOML file. The format is chosen from the file extension.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::core::TemplatesError;

/// Supported context file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextFormat {
    Yaml,
    Json,
    Toml,
}

impl ContextFormat {
    /// Pick the format from a path's extension (case-insensitive).
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Yaml => "YAML",
            Self::Json => "JSON",
            Self::Toml => "TOML",
        }
    }
}

/// Parse a context file into `T`.
///
/// # Errors
///
/// - [`TemplatesError::ContextFileNotFound`] if the file does not exist
/// - [`TemplatesError::UnsupportedContextFormat`] for unknown extensions
/// - [`TemplatesError::ContextParseError`] if the content does not match `T`
///
/// # Examples
///
/// ```rust,no_run
/// use containerd_templates::config::{ContainerdConfig, parse_context};
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// let config: ContainerdConfig = parse_context(Path::new("containerd.yaml"))?;
/// println!("rendering for {}", config.program);
/// # Ok(())
/// # }
/// ```
pub fn parse_context<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(TemplatesError::ContextFileNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }

    let format =
        ContextFormat::from_path(path).ok_or_else(|| TemplatesError::UnsupportedContextFormat {
            path: path.to_path_buf(),
        })?;

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read context file: {}", path.display()))?;

    parse_context_str(&content, format).map_err(|reason| {
        anyhow::Error::from(TemplatesError::ContextParseError {
            path: path.to_path_buf(),
            format: format.name(),
            reason,
        })
    })
}

/// Parse context content already in memory.
///
/// Returns the deserializer's message on failure.
pub fn parse_context_str<T: DeserializeOwned>(
    content: &str,
    format: ContextFormat,
) -> std::result::Result<T, String> {
    match format {
        ContextFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        ContextFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        ContextFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
    }
}
