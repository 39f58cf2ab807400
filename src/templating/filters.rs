//! Helper functions available to every template.
//!
//! Helpers are registered as Tera filters. The set is held in a
//! [`HelperFunctions`] table that is built once and never changes afterwards;
//! every compiler registers the same table into its own template set.
//!
//! | filter | input | output |
//! |---|---|---|
//! | `deschemify` | string | the string without a leading `scheme://` |
//! | `quote` | string, number, or bool | a double-quoted TOML basic string |
//!
//! # Examples
//!
//! ```text
//! [grpc]
//!   address = {{ node_config.containerd.address | deschemify | quote }}
//! ```

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::OnceLock;

use tera::{Tera, Value};

/// Signature shared by all helpers: Tera's filter calling convention.
pub type HelperFn = fn(&Value, &HashMap<String, Value>) -> tera::Result<Value>;

/// A named template helper.
#[derive(Debug, Clone, Copy)]
pub struct Helper {
    /// Name the templates call the helper by.
    pub name: &'static str,
    /// One-line description shown by `containerd-templates helpers`.
    pub description: &'static str,
    function: HelperFn,
}

impl Helper {
    pub const fn new(name: &'static str, description: &'static str, function: HelperFn) -> Self {
        Self {
            name,
            description,
            function,
        }
    }

    /// Invoke the helper directly, outside of a template.
    pub fn call(&self, value: &Value) -> tera::Result<Value> {
        (self.function)(value, &HashMap::new())
    }
}

/// Immutable table of template helpers.
///
/// Build it with [`HelperFunctions::standard`] (optionally extended with
/// [`HelperFunctions::with`]) before any rendering starts, then hand a
/// reference to each [`TemplateCompiler`](super::TemplateCompiler).
#[derive(Debug, Clone)]
pub struct HelperFunctions {
    helpers: Vec<Helper>,
}

static SHARED: OnceLock<HelperFunctions> = OnceLock::new();

impl HelperFunctions {
    /// The helpers the bundled templates rely on.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            helpers: vec![
                Helper::new(
                    "deschemify",
                    "strip a leading scheme and '://' from an address",
                    deschemify_filter,
                ),
                Helper::new(
                    "quote",
                    "render a value as a double-quoted, escaped TOML string",
                    quote_filter,
                ),
            ],
        }
    }

    /// Process-wide standard table, initialised on first use.
    pub fn shared() -> &'static HelperFunctions {
        SHARED.get_or_init(Self::standard)
    }

    /// Return a new table with `helper` added, replacing any helper of the same name.
    #[must_use]
    pub fn with(mut self, helper: Helper) -> Self {
        self.helpers.retain(|existing| existing.name != helper.name);
        self.helpers.push(helper);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Helper> {
        self.helpers.iter().find(|helper| helper.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Helper> {
        self.helpers.iter()
    }

    pub fn len(&self) -> usize {
        self.helpers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.helpers.is_empty()
    }

    /// Register every helper as a filter of `tera`.
    pub(crate) fn register(&self, tera: &mut Tera) {
        for helper in &self.helpers {
            tera.register_filter(helper.name, helper.function);
        }
    }
}

impl Default for HelperFunctions {
    fn default() -> Self {
        Self::standard()
    }
}

/// Strip a leading URI scheme and its `://` separator.
///
/// The listen address is stored as `unix:///run/containerd.sock` or
/// `tcp://127.0.0.1:1234`, but `config.toml` wants it without the scheme.
/// Strings without a valid scheme prefix are returned unchanged.
///
/// ```
/// use containerd_templates::templating::deschemify;
///
/// assert_eq!(deschemify("tcp://127.0.0.1:1234"), "127.0.0.1:1234");
/// assert_eq!(deschemify("unix:///run/k3s/containerd/containerd.sock"), "/run/k3s/containerd/containerd.sock");
/// assert_eq!(deschemify("/run/sock"), "/run/sock");
/// ```
#[must_use]
pub fn deschemify(address: &str) -> &str {
    match address.split_once("://") {
        Some((scheme, rest)) if is_scheme(scheme) => rest,
        _ => address,
    }
}

// RFC 3986: ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )
fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    matches!(chars.next(), Some(first) if first.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Quote `value` as a TOML basic string.
///
/// Escapes `"` and `\`, uses the short escapes TOML defines for backspace,
/// tab, newline, form feed, and carriage return, and `\uXXXX` for any other
/// control character. Everything else is copied through.
///
/// ```
/// use containerd_templates::templating::quote;
///
/// assert_eq!(quote("/usr/bin/runc"), r#""/usr/bin/runc""#);
/// assert_eq!(quote("say \"hi\""), r#""say \"hi\"""#);
/// ```
#[must_use]
pub fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\u{8}' => quoted.push_str("\\b"),
            '\t' => quoted.push_str("\\t"),
            '\n' => quoted.push_str("\\n"),
            '\u{c}' => quoted.push_str("\\f"),
            '\r' => quoted.push_str("\\r"),
            c if c.is_control() => {
                let _ = write!(quoted, "\\u{:04X}", c as u32);
            }
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

fn deschemify_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let address = value.as_str().ok_or_else(|| {
        tera::Error::msg(format!("Filter `deschemify` expects a string, got `{value}`"))
    })?;
    Ok(Value::String(deschemify(address).to_string()))
}

fn quote_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(tera::Error::msg(format!(
                "Filter `quote` expects a string, number, or bool, got `{other}`"
            )));
        }
    };
    Ok(Value::String(quote(&text)))
}
