//! Global constants used throughout the crate.
//!
//! Template-set names, the generated-file header format, and defaults shared
//! by the library and the command-line front-end.

/// Name under which the executed (top-level) template is registered.
///
/// For layered renders this is the user-override template; for single renders
/// it is the only template in the set.
pub const COMPILED_TEMPLATE_NAME: &str = "compiled_template";

/// Name under which the base template is registered in a layered template set.
///
/// User-override templates reference the base by this name, either with
/// `{% include "base" %}` or `{% extends "base" %}`.
pub const BASE_TEMPLATE_NAME: &str = "base";

/// Program name used when a context file does not name its generator.
pub const DEFAULT_PROGRAM: &str = "k3s";

/// Name of the user-override template file operators drop next to `config.toml`.
pub const USER_TEMPLATE_FILE_NAME: &str = "config.toml.tmpl";

/// Prefix of the SHA-256 checksums reported for rendered output.
pub const CHECKSUM_PREFIX: &str = "sha256:";

/// Number of template lines shown on each side of a failing line in error output.
pub const ERROR_CONTEXT_LINES: usize = 3;

/// Maximum Levenshtein distance, as a percentage of the variable length,
/// for a context path to be offered as a suggestion.
pub const SIMILARITY_THRESHOLD_PERCENT: usize = 50;
