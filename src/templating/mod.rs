//! Template compilation, helpers, and output canonicalization.
//!
//! The pipeline for every generated file is the same:
//!
//! 1. compile the base template (and, for the containerd config, the user
//!    override layered over it) with [`TemplateCompiler`];
//! 2. execute the top-level unit against a typed context;
//! 3. [`canonicalize`] the text so blank lines produced by conditionals never
//!    reach the file.
//!
//! Templates use Tera syntax. Two helper filters are always available:
//! `deschemify` (strip a URL scheme) and `quote` (emit a TOML basic string).

mod canonical;
mod checksum;
mod compiler;
mod error;
mod filters;
mod variables;


pub use canonical::canonicalize;
pub use checksum::checksum;
pub use compiler::{BaseUnit, CompiledTemplate, TemplateCompiler, render_layered, render_single};
pub use error::{ErrorLocation, TemplateError};
pub use filters::{Helper, HelperFn, HelperFunctions, deschemify, quote};
