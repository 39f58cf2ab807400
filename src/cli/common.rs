//! Output handling shared by the render commands.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use crate::core::TemplatesError;
use crate::templating::checksum;

/// Where rendered output goes.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Write to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Fail if the output file would change instead of writing it
    #[arg(long, requires = "output")]
    pub check: bool,
}

impl OutputArgs {
    /// Write, check, or print `rendered`.
    pub fn emit(&self, rendered: &str) -> Result<()> {
        match &self.output {
            Some(path) if self.check => check_output(path, rendered),
            Some(path) => write_output(path, rendered),
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(rendered.as_bytes()).context("Failed to write to stdout")?;
                stdout.flush().context("Failed to write to stdout")
            }
        }
    }
}

fn check_output(path: &Path, rendered: &str) -> Result<()> {
    let expected = checksum(rendered);
    let actual = match fs::read_to_string(path) {
        Ok(existing) => checksum(&existing),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => "missing".to_string(),
        Err(e) => {
            return Err(TemplatesError::FileSystemError {
                operation: "read".to_string(),
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
            .into());
        }
    };

    if expected != actual {
        return Err(TemplatesError::OutputChanged {
            path: path.to_path_buf(),
            expected,
            actual,
        }
        .into());
    }

    tracing::info!("{} is up to date ({expected})", path.display());
    Ok(())
}

fn write_output(path: &Path, rendered: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| TemplatesError::FileSystemError {
            operation: "create directory".to_string(),
            path: parent.to_path_buf(),
            reason: e.to_string(),
        })?;
    }

    fs::write(path, rendered).map_err(|e| TemplatesError::FileSystemError {
        operation: "write".to_string(),
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    tracing::info!("Wrote {} ({})", path.display(), checksum(rendered));
    Ok(())
}

/// Read an override template from disk.
pub fn read_template(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(TemplatesError::TemplateFileNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }
    fs::read_to_string(path)
        .with_context(|| format!("Failed to read template file: {}", path.display()))
}
