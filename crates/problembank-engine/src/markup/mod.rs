//! The generic markup tree.
//!
//! This layer turns raw problem source into an uninterpreted soup of text
//! spans, environments, and commands. It knows nothing about which construct
//! names are meaningful; assigning meaning (and rejecting unknown names) is
//! the converter's job.
//!
//! Math delimiters are normalized to environment names so the converter can
//! dispatch on them uniformly: `$...$` becomes `$`, `\(...\)` becomes `\(`,
//! `$$...$$` becomes `$$`, and `\[...\]` becomes `displaymath`. Math and
//! verbatim environments carry their raw source in [`Environment::body`]
//! rather than parsed `contents`.

pub mod cursor;
mod parser;

pub use parser::{parse, parse_fragment};

use thiserror::Error;

/// Errors produced while building the generic markup tree.
#[derive(Debug, Error)]
pub enum MarkupError {
    #[error("environment {name} opened on line {line} is never closed")]
    UnclosedEnvironment { name: String, line: usize },

    #[error("group opened on line {line} is never closed")]
    UnclosedGroup { line: usize },

    #[error("math delimiter {delim} opened on line {line} is never closed")]
    UnclosedMath { delim: &'static str, line: usize },

    #[error(r"\end{{{name}}} on line {line} has no matching \begin")]
    UnmatchedEnd { name: String, line: usize },

    #[error(r"\begin on line {line} is missing its environment name")]
    MissingEnvironmentName { line: usize },
}

/// A node in the generic markup tree.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkupNode {
    /// A raw text span.
    Text(String),
    /// A block construct with contents (or a raw body, for math/verbatim).
    Environment(Environment),
    /// A command invocation with positional arguments.
    Command(Command),
}

impl MarkupNode {
    /// The construct name used for dispatch, if this is not plain text.
    pub fn name(&self) -> Option<&str> {
        match self {
            MarkupNode::Text(_) => None,
            MarkupNode::Environment(env) => Some(&env.name),
            MarkupNode::Command(cmd) => Some(&cmd.name),
        }
    }

    pub(crate) fn is_whitespace_text(&self) -> bool {
        matches!(self, MarkupNode::Text(text) if text.chars().all(char::is_whitespace))
    }
}

/// A block-like construct: `\begin{name}...\end{name}` or a math span.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    pub name: String,
    pub args: Vec<Arg>,
    /// Parsed children, for ordinary environments.
    pub contents: Vec<MarkupNode>,
    /// Raw source, for math and verbatim environments.
    pub body: String,
}

/// A command-like construct: `\name` followed by argument groups.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub name: String,
    pub args: Vec<Arg>,
}

/// One `{...}` or `[...]` argument group.
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    /// The group's interior, verbatim.
    pub raw: String,
    /// The group's interior parsed as markup. Falls back to a single
    /// [`MarkupNode::Text`] when the interior is not parseable on its own.
    pub contents: Vec<MarkupNode>,
}

impl Arg {
    /// The argument as a literal string.
    pub fn text(&self) -> &str {
        &self.raw
    }
}
