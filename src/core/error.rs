//! Error handling for containerd-templates
//!
//! Two layers, like most of the crate:
//! - [`TemplatesError`] - strongly-typed failures the library and CLI can hit
//! - [`ErrorContext`] - a [`TemplatesError`] plus a suggestion and details for
//!   display on the terminal
//!
//! Template compilation and execution failures are [`TemplateError`]s; they are
//! wrapped in [`TemplatesError::Template`] when they cross into the CLI.
//!
//! # Examples
//!
//! ```rust,no_run
//! use containerd_templates::core::{TemplatesError, user_friendly_error};
//!
//! let error = anyhow::Error::from(TemplatesError::UnknownSchemaVersion {
//!     version: "4".to_string(),
//! });
//! user_friendly_error(error).display();
//! ```

use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::templating::TemplateError;

/// The main error type for containerd-templates operations.
#[derive(Error, Debug, Clone)]
pub enum TemplatesError {
    /// The context file passed on the command line does not exist.
    #[error("Context file not found: {}", path.display())]
    ContextFileNotFound {
        path: PathBuf,
    },

    /// The context file extension is not one of the supported formats.
    #[error("Unsupported context file format: {}", path.display())]
    UnsupportedContextFormat {
        path: PathBuf,
    },

    /// The context file could not be deserialized into the expected type.
    #[error("Invalid {format} in context file {}: {reason}", path.display())]
    ContextParseError {
        path: PathBuf,
        format: &'static str,
        reason: String,
    },

    /// The user-override template file does not exist.
    #[error("Template file not found: {}", path.display())]
    TemplateFileNotFound {
        path: PathBuf,
    },

    /// A schema version other than 2 or 3 was requested.
    #[error("Unknown containerd config schema version '{version}' (expected 2 or 3)")]
    UnknownSchemaVersion {
        version: String,
    },

    /// `--check` found that the rendered output differs from the file on disk.
    #[error("{} is out of date (expected {expected}, found {actual})", path.display())]
    OutputChanged {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// Reading or writing a file failed.
    #[error("File system error during {operation}: {}: {reason}", path.display())]
    FileSystemError {
        operation: String,
        path: PathBuf,
        reason: String,
    },

    /// Template compilation or execution failed.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Any other failure, with its context chain already formatted.
    #[error("{message}")]
    Other {
        message: String,
    },
}

/// Error wrapper with user-facing suggestion and details.
#[derive(Debug)]
pub struct ErrorContext {
    pub error: TemplatesError,
    pub suggestion: Option<String>,
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(error: TemplatesError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr: error in red, details in yellow, suggestion in green.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with suggestions where we know
/// what usually went wrong.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(templates_error) = error.downcast_ref::<TemplatesError>() {
        return create_error_context(templates_error.clone());
    }

    if let Some(template_error) = error.downcast_ref::<TemplateError>() {
        return create_error_context(TemplatesError::Template(template_error.clone()));
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        let context = ErrorContext::new(TemplatesError::FileSystemError {
            operation: "file access".to_string(),
            path: PathBuf::from("unknown"),
            reason: io_error.to_string(),
        });
        return match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => context
                .with_suggestion("Check ownership of the output directory or run with elevated permissions"),
            std::io::ErrorKind::NotFound => {
                context.with_suggestion("Check that the file or directory exists and the path is correct")
            }
            _ => context,
        };
    }

    // Keep the anyhow context chain for anything we don't recognise.
    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(TemplatesError::Other {
        message,
    })
}

fn create_error_context(error: TemplatesError) -> ErrorContext {
    match &error {
        TemplatesError::ContextFileNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Pass an existing YAML, JSON, or TOML file with --context"),
        TemplatesError::UnsupportedContextFormat {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Rename the context file to end in .yaml, .yml, .json, or .toml"),
        TemplatesError::ContextParseError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check field names against the documented context layout")
            .with_details("Unknown fields are ignored; fields with the wrong type are rejected"),
        TemplatesError::TemplateFileNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Omit --template to render the base template unchanged"),
        TemplatesError::UnknownSchemaVersion {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Use --schema 2 for containerd 1.x or --schema 3 for containerd 2.x"),
        TemplatesError::OutputChanged {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Re-run without --check to regenerate the file"),
        TemplatesError::Template(template_error) => {
            let details = template_error.format_with_context();
            let context = ErrorContext::new(error.clone()).with_details(details);
            if template_error.is_definition_error() {
                context.with_suggestion(
                    "Fix the template syntax: variables use {{ var }}, control flow uses {% %}, comments use {# #}",
                )
            } else {
                context.with_suggestion(
                    "Check that every field the template uses exists in the context file",
                )
            }
        }
        TemplatesError::FileSystemError {
            ..
        }
        | TemplatesError::Other {
            ..
        } => ErrorContext::new(error),
    }
}
