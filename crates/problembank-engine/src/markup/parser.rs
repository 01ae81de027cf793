//! Recursive descent over raw problem source.
//!
//! Each `parse_*` helper owns one construct shape and leaves the cursor just
//! past it. Whitespace-only text spans are dropped from the produced node
//! lists; converters rely on this (a `choices` environment's contents begin
//! at its first marker command, not at the newline before it).

use super::cursor::Cursor;
use super::{Arg, Command, Environment, MarkupError, MarkupNode};

/// Environments whose bodies are captured raw instead of being parsed.
const RAW_BODY_ENVIRONMENTS: &[&str] = &["displaymath", "align", "align*", "minted"];

/// Parse a whole document into its top-level markup nodes.
pub fn parse(source: &str) -> Result<Vec<MarkupNode>, MarkupError> {
    let mut cur = Cursor::new(source);
    parse_nodes(&mut cur, None)
}

/// Parse an argument group's interior as markup.
pub fn parse_fragment(source: &str) -> Result<Vec<MarkupNode>, MarkupError> {
    parse(source)
}

/// The terminator of the node list being parsed: the enclosing environment's
/// name and the line its `\begin` appeared on.
type Terminator<'a> = Option<(&'a str, usize)>;

fn parse_nodes(cur: &mut Cursor<'_>, terminator: Terminator<'_>) -> Result<Vec<MarkupNode>, MarkupError> {
    let mut nodes = Vec::new();
    let mut text = String::new();

    loop {
        if cur.eof() {
            match terminator {
                None => break,
                Some((name, line)) => {
                    return Err(MarkupError::UnclosedEnvironment { name: name.to_string(), line });
                }
            }
        }

        if let Some((name, _)) = terminator {
            let end_marker = format!("\\end{{{name}}}");
            if cur.rest().starts_with(&end_marker) {
                cur.bump_n(end_marker.len());
                break;
            }
        }

        match cur.peek().expect("not at eof") {
            b'\\' => {
                if cur.starts_with(b"\\begin") {
                    flush_text(&mut nodes, &mut text);
                    nodes.push(MarkupNode::Environment(parse_environment(cur)?));
                } else if cur.starts_with(b"\\end{") {
                    // A matching terminator was handled above.
                    let line = cur.line();
                    cur.bump_n(5);
                    let name = read_name(cur);
                    return Err(MarkupError::UnmatchedEnd { name, line });
                } else if cur.starts_with(b"\\[") {
                    flush_text(&mut nodes, &mut text);
                    nodes.push(parse_delimited_math(cur, "\\[", "\\]", "displaymath")?);
                } else if cur.starts_with(b"\\(") {
                    flush_text(&mut nodes, &mut text);
                    nodes.push(parse_delimited_math(cur, "\\(", "\\)", "\\(")?);
                } else if cur.peek2().is_some_and(|b| b.is_ascii_alphabetic()) {
                    flush_text(&mut nodes, &mut text);
                    nodes.push(MarkupNode::Command(parse_command(cur)?));
                } else if let Some(escaped) = cur.rest().chars().nth(1) {
                    // An escaped character stands for itself. It may be
                    // more than one byte wide.
                    cur.bump_n(1 + escaped.len_utf8());
                    text.push(escaped);
                } else {
                    cur.bump();
                    text.push('\\');
                }
            }
            b'$' => {
                flush_text(&mut nodes, &mut text);
                if cur.peek2() == Some(b'$') {
                    nodes.push(parse_delimited_math(cur, "$$", "$$", "$$")?);
                } else {
                    nodes.push(parse_delimited_math(cur, "$", "$", "$")?);
                }
            }
            b'%' => {
                // Comment runs to end of line; the newline itself stays.
                while let Some(b) = cur.peek() {
                    if b == b'\n' {
                        break;
                    }
                    cur.bump();
                }
            }
            _ => {
                let ch = cur.rest().chars().next().expect("not at eof");
                cur.bump_n(ch.len_utf8());
                text.push(ch);
            }
        }
    }

    flush_text(&mut nodes, &mut text);
    nodes.retain(|node| !node.is_whitespace_text());
    Ok(nodes)
}

fn flush_text(nodes: &mut Vec<MarkupNode>, text: &mut String) {
    if !text.is_empty() {
        nodes.push(MarkupNode::Text(std::mem::take(text)));
    }
}

/// Reads a construct name: letters, digits, and a trailing `*`, up to a
/// closing brace.
fn read_name(cur: &mut Cursor<'_>) -> String {
    let mut name = String::new();
    while let Some(b) = cur.peek() {
        if b.is_ascii_alphanumeric() || b == b'*' {
            name.push(b as char);
            cur.bump();
        } else {
            break;
        }
    }
    if cur.peek() == Some(b'}') {
        cur.bump();
    }
    name
}

fn parse_environment(cur: &mut Cursor<'_>) -> Result<Environment, MarkupError> {
    let begin_line = cur.line();
    cur.bump_n("\\begin".len());

    if cur.peek() != Some(b'{') {
        return Err(MarkupError::MissingEnvironmentName { line: begin_line });
    }
    cur.bump();
    let name = read_name(cur);
    if name.is_empty() {
        return Err(MarkupError::MissingEnvironmentName { line: begin_line });
    }

    let mut args = Vec::new();
    // Verbatim environments take a mandatory brace argument (the language).
    while cur.peek() == Some(b'{') && name == "minted" {
        args.push(parse_group(cur, b'{', b'}')?);
    }
    while cur.peek() == Some(b'[') {
        args.push(parse_group(cur, b'[', b']')?);
    }

    if RAW_BODY_ENVIRONMENTS.contains(&name.as_str()) {
        let end_marker = format!("\\end{{{name}}}");
        let Some(at) = cur.rest().find(&end_marker) else {
            return Err(MarkupError::UnclosedEnvironment { name, line: begin_line });
        };
        let body = cur.rest()[..at].to_string();
        cur.bump_n(at + end_marker.len());
        return Ok(Environment { name, args, contents: Vec::new(), body });
    }

    let contents = parse_nodes(cur, Some((&name, begin_line)))?;
    Ok(Environment { name, args, contents, body: String::new() })
}

fn parse_command(cur: &mut Cursor<'_>) -> Result<Command, MarkupError> {
    cur.bump(); // backslash
    let mut name = String::new();
    while let Some(b) = cur.peek() {
        if b.is_ascii_alphabetic() {
            name.push(b as char);
            cur.bump();
        } else {
            break;
        }
    }
    if cur.peek() == Some(b'*') {
        name.push('*');
        cur.bump();
    }

    let mut args = Vec::new();
    loop {
        match cur.peek() {
            Some(b'{') => args.push(parse_group(cur, b'{', b'}')?),
            Some(b'[') => args.push(parse_group(cur, b'[', b']')?),
            _ => break,
        }
    }

    Ok(Command { name, args })
}

/// Parses a delimiter-fenced math span into an environment-shaped node so
/// the converter can dispatch on its name like any other construct.
fn parse_delimited_math(
    cur: &mut Cursor<'_>,
    open: &'static str,
    close: &'static str,
    name: &str,
) -> Result<MarkupNode, MarkupError> {
    let line = cur.line();
    cur.bump_n(open.len());
    let Some(at) = cur.rest().find(close) else {
        return Err(MarkupError::UnclosedMath { delim: open, line });
    };
    let body = cur.rest()[..at].to_string();
    cur.bump_n(at + close.len());
    Ok(MarkupNode::Environment(Environment {
        name: name.to_string(),
        args: Vec::new(),
        contents: Vec::new(),
        body,
    }))
}

/// Parses one `{...}` or `[...]` group, balancing braces and honoring
/// backslash escapes inside the group.
fn parse_group(cur: &mut Cursor<'_>, open: u8, close: u8) -> Result<Arg, MarkupError> {
    let line = cur.line();
    cur.bump(); // opening delimiter
    let start = cur.i;
    let mut depth = 1usize;

    while let Some(b) = cur.peek() {
        if b == b'\\' {
            cur.bump();
            cur.bump();
            continue;
        }
        if b == open && open != close {
            depth += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                let raw = cur.s[start..cur.i].to_string();
                cur.bump(); // closing delimiter
                let contents = parse_fragment(&raw)
                    .unwrap_or_else(|_| vec![MarkupNode::Text(raw.clone())]);
                return Ok(Arg { raw, contents });
            }
        }
        cur.bump();
    }

    Err(MarkupError::UnclosedGroup { line })
}
