//! Core error types shared by the library and the CLI.
//!
//! - [`TemplatesError`] enumerates everything that can go wrong outside the
//!   template engine itself (context files, schema selection, output checks)
//!   and wraps [`TemplateError`](crate::templating::TemplateError) for the rest
//! - [`ErrorContext`] adds a suggestion and details for terminal display
//! - [`user_friendly_error`] turns any [`anyhow::Error`] into an [`ErrorContext`]

pub mod error;

pub use error::{ErrorContext, TemplatesError, user_friendly_error};
