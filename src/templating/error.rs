//! Structured errors for template compilation and execution.
//!
//! Every failure is fatal for the file being generated. The error carries the
//! engine's diagnostic plus whatever location information is available, so a
//! broken override template can be fixed without guessing.

use std::fmt;

/// Which phase of a render failed, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// A template body failed to parse or could not be linked into the
    /// template set (for example `{% extends %}` naming an unknown template).
    Definition {
        template: String,
        message: String,
        location: Box<ErrorLocation>,
    },

    /// Execution referenced a field the context does not have.
    VariableNotFound {
        template: String,
        variable: String,
        suggestions: Vec<String>,
    },

    /// Execution failed for any other reason, such as a helper rejecting its input.
    Execution {
        template: String,
        message: String,
    },

    /// The context could not be turned into a template context (it must
    /// serialize to a map).
    InvalidContext {
        message: String,
    },
}

/// Where in a template body a definition error was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorLocation {
    /// 1-based line reported by the parser.
    pub line_number: Option<usize>,
    /// Numbered lines surrounding `line_number`.
    pub context_lines: Vec<(usize, String)>,
}

impl TemplateError {
    /// Name of the template the error belongs to, if any.
    pub fn template(&self) -> Option<&str> {
        match self {
            Self::Definition {
                template,
                ..
            }
            | Self::VariableNotFound {
                template,
                ..
            }
            | Self::Execution {
                template,
                ..
            } => Some(template),
            Self::InvalidContext {
                ..
            } => None,
        }
    }

    /// `true` for errors raised before any execution started.
    pub fn is_definition_error(&self) -> bool {
        matches!(self, Self::Definition { .. })
    }

    /// Multi-line description with source excerpt and suggestions.
    pub fn format_with_context(&self) -> String {
        match self {
            Self::Definition {
                template,
                message,
                location,
            } => format_definition_error(template, message, location),
            Self::VariableNotFound {
                template,
                variable,
                suggestions,
            } => format_variable_not_found_error(template, variable, suggestions),
            Self::Execution {
                template,
                message,
            } => format!("ERROR: Template Execution Failed\n\nTemplate: {template}\nError: {message}\n"),
            Self::InvalidContext {
                message,
            } => format!(
                "ERROR: Invalid Template Context\n\nError: {message}\n\n\
                 The render context must serialize to a map of named fields.\n"
            ),
        }
    }
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Definition {
                template,
                message,
                location,
            } => match location.line_number {
                Some(line) => {
                    write!(f, "Failed to parse template '{template}' at line {line}: {message}")
                }
                None => write!(f, "Failed to parse template '{template}': {message}"),
            },
            Self::VariableNotFound {
                template,
                variable,
                ..
            } => {
                write!(f, "Template '{template}' references unknown variable '{variable}'")
            }
            Self::Execution {
                template,
                message,
            } => write!(f, "Failed to execute template '{template}': {message}"),
            Self::InvalidContext {
                message,
            } => write!(f, "Invalid template context: {message}"),
        }
    }
}

impl std::error::Error for TemplateError {}

fn format_definition_error(template: &str, message: &str, location: &ErrorLocation) -> String {
    let mut msg = String::new();

    msg.push_str("ERROR: Template Syntax Error\n\n");
    msg.push_str(&format!("Template: {template}\n"));
    if let Some(line) = location.line_number {
        msg.push_str(&format!("Line: {line}\n"));
    }
    msg.push_str(&format!("Error: {message}\n"));

    if !location.context_lines.is_empty() {
        msg.push('\n');
        let width = location.context_lines.last().map_or(1, |(n, _)| n.to_string().len());
        for (number, line) in &location.context_lines {
            let marker = if Some(*number) == location.line_number {
                ">"
            } else {
                " "
            };
            msg.push_str(&format!("{marker} {number:>width$} | {line}\n"));
        }
    }

    msg.push_str("\nSUGGESTION: Check the template for unclosed tags or invalid expressions.\n");
    msg.push_str("Common issues:\n");
    msg.push_str("  - Unclosed {{ }} or {% %} delimiters\n");
    msg.push_str("  - {% if %} / {% for %} / {% block %} without a matching end tag\n");
    msg.push_str("  - Extending or including a template other than \"base\"\n");

    msg
}

fn format_variable_not_found_error(template: &str, variable: &str, suggestions: &[String]) -> String {
    let mut msg = String::new();

    msg.push_str("ERROR: Template Variable Not Found\n\n");
    msg.push_str(&format!("Variable: {variable}\n"));
    msg.push_str(&format!("Template: {template}\n\n"));

    if !suggestions.is_empty() {
        msg.push_str("Did you mean one of these?\n");
        for suggestion in suggestions {
            msg.push_str(&format!("  - {suggestion}\n"));
        }
        msg.push('\n');
    }

    msg
}
