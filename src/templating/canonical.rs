//! Blank-line and section-spacing normalization for rendered TOML.
//!
//! Conditional template blocks that render to nothing leave runs of empty or
//! whitespace-only lines behind. [`canonicalize`] removes all of them and then
//! puts back exactly one blank line before every table header, which gives the
//! generated files a stable layout regardless of how the template was written.

/// Normalize rendered template output.
///
/// Processing is line by line:
///
/// 1. lines that are empty after trimming whitespace are dropped;
/// 2. a line starting with `[` gets one blank line in front of it, unless it
///    is the first line emitted;
/// 3. every emitted line ends with a single `\n`.
///
/// `\r\n` line endings are accepted and written back as `\n`. The function is
/// total and idempotent.
///
/// ```
/// use containerd_templates::templating::canonicalize;
///
/// let raw = "# header\n\n\nversion = 2\n   \n[grpc]\n  address = \"/run/sock\"\n\n";
/// assert_eq!(
///     canonicalize(raw),
///     "# header\nversion = 2\n\n[grpc]\n  address = \"/run/sock\"\n"
/// );
/// ```
#[must_use]
pub fn canonicalize(raw: &str) -> String {
    let mut output = String::with_capacity(raw.len());
    for line in raw.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with('[') && !output.is_empty() {
            output.push('\n');
        }
        output.push_str(line);
        output.push('\n');
    }
    output
}
