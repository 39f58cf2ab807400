//! Template compilation on top of Tera.
//!
//! Rendering happens in two phases:
//!
//! 1. the base template is parsed into a [`BaseUnit`], a template set holding
//!    the base under the name [`BASE_TEMPLATE_NAME`] plus the helper filters;
//! 2. a user template is parsed into a copy of that set
//!    ([`BaseUnit::layer`]), where it can `{% include "base" %}` or
//!    `{% extends "base" %}`.
//!
//! Only the top-level unit ([`COMPILED_TEMPLATE_NAME`]) is ever executed, and
//! only after every variable it can reach resolves against the context
//! ([`CompiledTemplate::check`]).
//! Template sets are never shared mutably: each layered render owns its set,
//! and a [`BaseUnit`] can be layered from several threads at once.

use regex::Regex;
use serde::Serialize;
use tera::{Context as TeraContext, Tera};

use super::canonical::canonicalize;
use super::error::{ErrorLocation, TemplateError};
use super::filters::HelperFunctions;
use super::variables::{available_variables, check_variables, find_similar_variables};
use crate::constants::{BASE_TEMPLATE_NAME, COMPILED_TEMPLATE_NAME, ERROR_CONTEXT_LINES};

/// Compiles templates against one immutable helper table.
#[derive(Debug, Clone, Copy)]
pub struct TemplateCompiler<'h> {
    helpers: &'h HelperFunctions,
}

impl<'h> TemplateCompiler<'h> {
    pub fn new(helpers: &'h HelperFunctions) -> Self {
        Self {
            helpers,
        }
    }

    /// Compiler using the process-wide standard helpers.
    pub fn standard() -> TemplateCompiler<'static> {
        TemplateCompiler::new(HelperFunctions::shared())
    }

    pub fn helpers(&self) -> &'h HelperFunctions {
        self.helpers
    }

    /// Fresh template set with auto-escaping off and the helpers registered.
    fn template_set(&self) -> Tera {
        let mut tera = Tera::default();
        // Output is TOML, not HTML.
        tera.autoescape_on(vec![]);
        self.helpers.register(&mut tera);
        tera
    }

    /// Parse `base_template` as the named base unit.
    ///
    /// # Errors
    ///
    /// [`TemplateError::Definition`] if the base does not parse.
    pub fn compile_base(&self, base_template: &str) -> Result<BaseUnit, TemplateError> {
        let mut tera = self.template_set();
        add_template(&mut tera, BASE_TEMPLATE_NAME, base_template)?;
        tracing::debug!("Compiled base template ({} bytes)", base_template.len());
        Ok(BaseUnit {
            tera,
        })
    }

    /// Parse a standalone template with no base to refer to.
    ///
    /// # Errors
    ///
    /// [`TemplateError::Definition`] if the template does not parse.
    pub fn compile_unit(&self, template: &str) -> Result<CompiledTemplate, TemplateError> {
        let mut tera = self.template_set();
        add_template(&mut tera, COMPILED_TEMPLATE_NAME, template)?;
        Ok(CompiledTemplate {
            tera,
        })
    }

    /// Render `user_template` layered over `base_template`, without canonicalizing.
    ///
    /// # Errors
    ///
    /// - [`TemplateError::Definition`] if either template fails to parse
    /// - [`TemplateError::VariableNotFound`] / [`TemplateError::Execution`] if
    ///   execution fails against `context`
    /// - [`TemplateError::InvalidContext`] if `context` is not a map
    pub fn compile_layered<C>(
        &self,
        user_template: &str,
        base_template: &str,
        context: &C,
    ) -> Result<String, TemplateError>
    where
        C: Serialize + ?Sized,
    {
        self.compile_base(base_template)?.layer(user_template)?.execute(context)
    }

    /// Render a single template, without canonicalizing.
    ///
    /// # Errors
    ///
    /// Same as [`compile_layered`](Self::compile_layered).
    pub fn compile_single<C>(&self, template: &str, context: &C) -> Result<String, TemplateError>
    where
        C: Serialize + ?Sized,
    {
        self.compile_unit(template)?.execute(context)
    }
}

/// A parsed base template, ready to have user templates layered over it.
#[derive(Debug, Clone)]
pub struct BaseUnit {
    tera: Tera,
}

impl BaseUnit {
    /// Parse `user_template` into a copy of this set as the top-level unit.
    ///
    /// # Errors
    ///
    /// [`TemplateError::Definition`] if the user template does not parse or
    /// extends an unknown template.
    pub fn layer(&self, user_template: &str) -> Result<CompiledTemplate, TemplateError> {
        let mut tera = self.tera.clone();
        add_template(&mut tera, COMPILED_TEMPLATE_NAME, user_template)?;
        Ok(CompiledTemplate {
            tera,
        })
    }
}

/// A template set whose top-level unit can be executed.
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    tera: Tera,
}

impl CompiledTemplate {
    /// Execute the top-level unit against `context`. Returns raw text.
    ///
    /// # Errors
    ///
    /// See [`TemplateCompiler::compile_layered`].
    pub fn execute<C>(&self, context: &C) -> Result<String, TemplateError>
    where
        C: Serialize + ?Sized,
    {
        let context = tera_context(context)?;
        check_variables(&self.tera, COMPILED_TEMPLATE_NAME, &context.clone().into_json())?;

        let rendered = self
            .tera
            .render(COMPILED_TEMPLATE_NAME, &context)
            .map_err(|e| execution_error(&e, &context))?;

        tracing::debug!("Rendered template ({} bytes)", rendered.len());
        Ok(rendered)
    }

    /// Resolve every variable the unit can read against `context` without
    /// executing it.
    ///
    /// A field that is missing from `context` is an error even when it is
    /// only read by a condition, where Tera alone would treat it as false.
    ///
    /// # Errors
    ///
    /// [`TemplateError::VariableNotFound`] for the first unresolved name, or
    /// [`TemplateError::InvalidContext`] if `context` is not a map.
    pub fn check<C>(&self, context: &C) -> Result<(), TemplateError>
    where
        C: Serialize + ?Sized,
    {
        let context = tera_context(context)?;
        check_variables(&self.tera, COMPILED_TEMPLATE_NAME, &context.into_json())
    }

    /// Execute and canonicalize.
    ///
    /// # Errors
    ///
    /// See [`TemplateCompiler::compile_layered`].
    pub fn render<C>(&self, context: &C) -> Result<String, TemplateError>
    where
        C: Serialize + ?Sized,
    {
        self.execute(context).map(|raw| canonicalize(&raw))
    }
}

/// Render a user template layered over a base template and canonicalize the result.
///
/// Uses the standard helper table. This is the entry point for the container
/// engine config file; pass [`DEFAULT_USER_TEMPLATE`](crate::templates::DEFAULT_USER_TEMPLATE)
/// as `user_template` when the operator supplied no override.
///
/// # Errors
///
/// See [`TemplateCompiler::compile_layered`].
///
/// # Examples
///
/// ```
/// use containerd_templates::templating::render_layered;
/// use serde_json::json;
///
/// let output = render_layered(
///     "{% include \"base\" %}\n[extra]\nkey = 1\n",
///     "# generated by {{ program }}\n\n\n[main]\nkey = 0\n",
///     &json!({ "program": "k3s" }),
/// )?;
/// assert_eq!(output, "# generated by k3s\n\n[main]\nkey = 0\n\n[extra]\nkey = 1\n");
/// # Ok::<(), containerd_templates::templating::TemplateError>(())
/// ```
pub fn render_layered<C>(
    user_template: &str,
    base_template: &str,
    context: &C,
) -> Result<String, TemplateError>
where
    C: Serialize + ?Sized,
{
    TemplateCompiler::standard()
        .compile_layered(user_template, base_template, context)
        .map(|raw| canonicalize(&raw))
}

/// Render a single template and canonicalize the result.
///
/// # Errors
///
/// See [`TemplateCompiler::compile_layered`].
pub fn render_single<C>(template: &str, context: &C) -> Result<String, TemplateError>
where
    C: Serialize + ?Sized,
{
    TemplateCompiler::standard().compile_single(template, context).map(|raw| canonicalize(&raw))
}

fn tera_context<C>(context: &C) -> Result<TeraContext, TemplateError>
where
    C: Serialize + ?Sized,
{
    TeraContext::from_serialize(context).map_err(|e| TemplateError::InvalidContext {
        message: format_tera_error(&e),
    })
}

fn add_template(tera: &mut Tera, name: &str, body: &str) -> Result<(), TemplateError> {
    tera.add_raw_template(name, body).map_err(|e| definition_error(name, body, &e))
}

fn definition_error(name: &str, body: &str, error: &tera::Error) -> TemplateError {
    let line_number = extract_line_from_tera_error(error);
    let context_lines = line_number
        .map(|line| extract_context_lines(body, line, ERROR_CONTEXT_LINES))
        .unwrap_or_default();

    TemplateError::Definition {
        template: name.to_string(),
        message: format_tera_error(error),
        location: Box::new(ErrorLocation {
            line_number,
            context_lines,
        }),
    }
}

fn execution_error(error: &tera::Error, context: &TeraContext) -> TemplateError {
    let messages = error_chain(error);
    let template =
        failing_template(&messages).unwrap_or_else(|| COMPILED_TEMPLATE_NAME.to_string());

    if let Some(variable) = messages.iter().find_map(|msg| extract_variable_name(msg)) {
        let available = available_variables(&context.clone().into_json());
        let suggestions = find_similar_variables(&variable, &available);
        return TemplateError::VariableNotFound {
            template,
            variable,
            suggestions,
        };
    }

    TemplateError::Execution {
        template,
        message: format_tera_error(error),
    }
}

/// Every message in the error's source chain, outermost first.
fn error_chain(error: &tera::Error) -> Vec<String> {
    use std::error::Error;

    let mut messages = vec![error.to_string()];
    let mut current: Option<&dyn Error> = error.source();
    while let Some(err) = current {
        messages.push(err.to_string());
        current = err.source();
    }
    messages
}

/// Join the source chain into one diagnostic.
fn format_tera_error(error: &tera::Error) -> String {
    let messages: Vec<String> = error_chain(error)
        .into_iter()
        .map(|msg| msg.trim().to_string())
        .filter(|msg| !msg.is_empty())
        .collect();

    if messages.is_empty() {
        "unknown template error".to_string()
    } else {
        messages.join("\n  → ")
    }
}

/// Innermost template named in the chain ("while rendering 'base'").
fn failing_template(messages: &[String]) -> Option<String> {
    let re = Regex::new(r"(?:rendering|render) '([^']+)'").ok()?;
    messages
        .iter()
        .rev()
        .find_map(|msg| re.captures(msg).and_then(|caps| caps.get(1)))
        .map(|m| m.as_str().to_string())
}

/// Extract `foo` from "Variable `foo` not found".
fn extract_variable_name(message: &str) -> Option<String> {
    let re = Regex::new(r"Variable `([^`]+)` not found").ok()?;
    re.captures(message).and_then(|caps| caps.get(1)).map(|m| m.as_str().to_string())
}

/// Line number from the parser's ` --> line:column` marker.
fn extract_line_from_tera_error(error: &tera::Error) -> Option<usize> {
    let re = Regex::new(r"-->\s*(\d+):(\d+)").ok()?;
    error_chain(error)
        .iter()
        .find_map(|msg| re.captures(msg).and_then(|caps| caps.get(1)))
        .and_then(|m| m.as_str().parse().ok())
}

/// Up to `context_size` lines either side of `error_line` (1-based), numbered.
fn extract_context_lines(
    content: &str,
    error_line: usize,
    context_size: usize,
) -> Vec<(usize, String)> {
    let lines: Vec<&str> = content.lines().collect();
    if error_line == 0 || error_line > lines.len() {
        return Vec::new();
    }

    let start = error_line.saturating_sub(context_size + 1);
    let end = (error_line + context_size).min(lines.len());

    lines[start..end]
        .iter()
        .enumerate()
        .map(|(idx, line)| (start + idx + 1, (*line).to_string()))
        .collect()
}
