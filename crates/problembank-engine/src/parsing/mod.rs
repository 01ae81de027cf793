//! Parsing problem source into the typed tree.
//!
//! The pipeline has two passes. The first walks the generic markup tree and
//! converts each construct to its typed node via a name-keyed dispatch table
//! (see [`convert`]). The second rebuilds the converted tree so that runs of
//! text-like nodes are grouped into paragraphs, splitting on blank lines
//! (see [`paragraphs`]).
//!
//! [`parse`] runs both passes; [`parse_raw`] stops after conversion, which
//! is what tests pinning exact converter output want.

mod convert;
pub mod markdown;
pub mod paragraphs;

pub use convert::Converter;
pub use markdown::parse_markdown;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::markup::{self, MarkupError};
use crate::model::{IllegalChild, Node};

/// Errors produced while converting problem source into the typed tree.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error(transparent)]
    Markup(#[from] MarkupError),

    /// An environment or command name with no entry in the dispatch tables.
    #[error(r"unknown construct \{0}")]
    UnknownConstruct(String),

    /// A known construct whose arguments do not have the expected shape.
    #[error(r"malformed \{construct}: {reason}")]
    MalformedArguments {
        construct: &'static str,
        reason: String,
    },

    /// A referenced file (image, code listing) could not be read.
    #[error("could not read {path}: {source}")]
    ResourceResolution {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    IllegalChild(#[from] IllegalChild),

    /// The source does not consist of exactly one top-level construct.
    #[error("a problem must consist of exactly one top-level environment")]
    MalformedDocument,
}

/// Where a problem's source lives on disk.
///
/// Constructs that reference sibling files (`\includegraphics`,
/// `\inputminted`) resolve their paths against `dir`. Parsing source that
/// references no files works fine with `dir` set to `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Context<'a> {
    pub dir: Option<&'a Path>,
}

impl<'a> Context<'a> {
    pub fn new(dir: Option<&'a Path>) -> Self {
        Self { dir }
    }

    /// Resolve a problem-relative path and read the file's bytes.
    fn read(&self, relative: &str) -> Result<Vec<u8>, ParseError> {
        let path = match self.dir {
            Some(dir) => relative_path::RelativePath::new(relative).to_path(dir),
            None => {
                return Err(ParseError::ResourceResolution {
                    path: PathBuf::from(relative),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "no problem directory to resolve against",
                    ),
                });
            }
        };
        std::fs::read(&path).map_err(|source| ParseError::ResourceResolution { path, source })
    }
}

/// Parse problem source into a fully paragraphed tree.
pub fn parse(source: &str, dir: Option<&Path>) -> Result<Node, ParseError> {
    let raw = parse_raw(source, dir)?;
    Ok(paragraphs::rebuild(&raw))
}

/// Parse problem source, skipping the paragraph pass.
pub fn parse_raw(source: &str, dir: Option<&Path>) -> Result<Node, ParseError> {
    let nodes = markup::parse(source)?;
    let [node] = nodes.as_slice() else {
        return Err(ParseError::MalformedDocument);
    };
    Converter::new().convert(node, &Context::new(dir))
}

/// Strip the common leading whitespace from every line of `text`.
///
/// Lines consisting entirely of whitespace are normalized to empty and do
/// not participate in determining the common prefix. Verbatim code bodies
/// arrive indented to the nesting depth of their environment; this restores
/// the author's intended indentation.
pub(crate) fn dedent(text: &str) -> String {
    let mut prefix: Option<&str> = None;
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let indent = &line[..line.len() - line.trim_start().len()];
        prefix = Some(match prefix {
            None => indent,
            Some(common) => common_prefix(common, indent),
        });
    }
    let prefix = prefix.unwrap_or("");

    let mut out = text
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else {
                line.strip_prefix(prefix).unwrap_or(line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    if text.ends_with('\n') {
        out.push('\n');
    }
    out
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let len = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    &a[..len]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("", "")]
    #[case("plain\ntext", "plain\ntext")]
    #[case("    a\n    b", "a\nb")]
    #[case("    a\n        b", "a\n    b")]
    #[case("\tx\n\ty", "x\ny")]
    fn dedent_strips_common_indent(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(dedent(input), expected);
    }

    #[test]
    fn dedent_ignores_whitespace_only_lines() {
        // The blank line's stray spaces neither block dedenting nor survive.
        assert_eq!(dedent("    a\n  \n    b"), "a\n\nb");
    }

    #[test]
    fn dedent_of_verbatim_environment_body() {
        let body = "\n    def f(x):\n        return x + 1\n    ";
        assert_eq!(dedent(body), "\ndef f(x):\n    return x + 1\n");
    }

    #[test]
    fn dedent_keeps_trailing_newline() {
        assert_eq!(dedent("  a\n  b\n"), "a\nb\n");
    }

    #[test]
    fn parse_rejects_multiple_top_level_nodes() {
        let err = parse(r"\begin{prob}a\end{prob}\begin{prob}b\end{prob}", None).unwrap_err();
        assert!(matches!(err, ParseError::MalformedDocument));
    }

    #[test]
    fn parse_rejects_leading_prose() {
        let err = parse(r"stray text \begin{prob}a\end{prob}", None).unwrap_err();
        assert!(matches!(err, ParseError::MalformedDocument));
    }

    #[test]
    fn parse_accepts_surrounding_whitespace() {
        let tree = parse("\n  \\begin{prob}hi\\end{prob}\n\n", None).unwrap();
        assert_eq!(tree.kind(), crate::model::NodeKind::Problem);
    }
}
