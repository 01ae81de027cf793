//! Conversion from the generic markup tree to the typed problem tree.
//!
//! Conversion is driven by two name-keyed dispatch tables, one for
//! environments and one for commands. Each entry is a plain function taking
//! the converter back as an argument so it can recurse into child content.
//! A name absent from its table is an error, never a passthrough.

use std::collections::HashMap;

use super::{dedent, Context, ParseError};
use crate::markup::{Command, Environment, MarkupNode};
use crate::model::Node;

type EnvFn = fn(&Converter, &Environment, &Context<'_>) -> Result<Node, ParseError>;
type CmdFn = fn(&Converter, &Command, &Context<'_>) -> Result<Node, ParseError>;

/// Maps construct names to typed-tree builders.
pub struct Converter {
    environments: HashMap<&'static str, EnvFn>,
    commands: HashMap<&'static str, CmdFn>,
}

impl Converter {
    pub fn new() -> Self {
        let mut environments: HashMap<&'static str, EnvFn> = HashMap::new();
        environments.insert("prob", convert_prob);
        environments.insert("subprob", convert_subprob);
        environments.insert("soln", convert_soln);
        environments.insert("choices", convert_choices);
        environments.insert("minted", convert_minted);
        environments.insert("$", convert_inline_math);
        environments.insert(r"\(", convert_inline_math);
        environments.insert("$$", convert_display_math);
        environments.insert("displaymath", convert_display_math);
        environments.insert("align", convert_align);
        environments.insert("align*", convert_align);

        let mut commands: HashMap<&'static str, CmdFn> = HashMap::new();
        commands.insert("textbf", convert_textbf);
        commands.insert("textit", convert_textit);
        commands.insert("mintinline", convert_mintinline);
        commands.insert("inputminted", convert_inputminted);
        commands.insert("Tf", convert_tf);
        commands.insert("tF", convert_tf);
        commands.insert("inlineresponsebox", convert_inlineresponsebox);
        commands.insert("includegraphics", convert_includegraphics);

        Self { environments, commands }
    }

    /// Convert one markup node to its typed counterpart.
    pub fn convert(&self, node: &MarkupNode, ctx: &Context<'_>) -> Result<Node, ParseError> {
        match node {
            MarkupNode::Text(text) => Ok(Node::normal_text(text.clone())),
            MarkupNode::Environment(env) => match self.environments.get(env.name.as_str()) {
                Some(f) => f(self, env, ctx),
                None => Err(ParseError::UnknownConstruct(env.name.clone())),
            },
            MarkupNode::Command(cmd) => match self.commands.get(cmd.name.as_str()) {
                Some(f) => f(self, cmd, ctx),
                None => Err(ParseError::UnknownConstruct(cmd.name.clone())),
            },
        }
    }

    fn convert_into<'n>(
        &self,
        parent: &mut Node,
        nodes: impl IntoIterator<Item = &'n MarkupNode>,
        ctx: &Context<'_>,
    ) -> Result<(), ParseError> {
        for node in nodes {
            parent.add_child(self.convert(node, ctx)?)?;
        }
        Ok(())
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

fn convert_prob(c: &Converter, env: &Environment, ctx: &Context<'_>) -> Result<Node, ParseError> {
    let mut problem = Node::problem();
    for node in &env.contents {
        // A subprobset is pure grouping; its subproblems attach directly
        // to the problem.
        if let MarkupNode::Environment(inner) = node {
            if inner.name == "subprobset" {
                c.convert_into(&mut problem, &inner.contents, ctx)?;
                continue;
            }
        }
        problem.add_child(c.convert(node, ctx)?)?;
    }
    Ok(problem)
}

fn convert_subprob(c: &Converter, env: &Environment, ctx: &Context<'_>) -> Result<Node, ParseError> {
    let mut subproblem = Node::subproblem();
    c.convert_into(&mut subproblem, &env.contents, ctx)?;
    Ok(subproblem)
}

fn convert_soln(c: &Converter, env: &Environment, ctx: &Context<'_>) -> Result<Node, ParseError> {
    let mut solution = Node::solution();
    c.convert_into(&mut solution, &env.contents, ctx)?;
    Ok(solution)
}

fn convert_inline_math(
    _: &Converter,
    env: &Environment,
    _: &Context<'_>,
) -> Result<Node, ParseError> {
    Ok(Node::inline_math(env.body.clone()))
}

fn convert_display_math(
    _: &Converter,
    env: &Environment,
    _: &Context<'_>,
) -> Result<Node, ParseError> {
    Ok(Node::display_math(env.body.clone()))
}

/// Alignment environments keep their alignment when rendered by wrapping the
/// body in an `aligned` block, which is valid inside display delimiters.
fn convert_align(_: &Converter, env: &Environment, _: &Context<'_>) -> Result<Node, ParseError> {
    let latex = format!("\\begin{{aligned}}{}\\end{{aligned}}", env.body);
    Ok(Node::display_math(latex))
}

fn convert_minted(_: &Converter, env: &Environment, _: &Context<'_>) -> Result<Node, ParseError> {
    let Some(language) = env.args.first() else {
        return Err(ParseError::MalformedArguments {
            construct: "minted",
            reason: "missing language argument".into(),
        });
    };
    Ok(Node::code(language.text(), dedent(&env.body)))
}

fn convert_choices(c: &Converter, env: &Environment, ctx: &Context<'_>) -> Result<Node, ParseError> {
    let mut container = if env.args.first().is_some_and(|arg| arg.text() == "rectangle") {
        Node::multiple_select()
    } else {
        Node::multiple_choices()
    };

    for segment in segment_at_markers(&env.contents) {
        let correct = match segment[0].name() {
            Some("correctchoice") => true,
            Some("choice") => false,
            _ => {
                return Err(ParseError::MalformedArguments {
                    construct: "choices",
                    reason: r"content before the first \choice".into(),
                });
            }
        };
        let mut choice = Node::choice(correct);
        c.convert_into(&mut choice, segment[1..].iter().copied(), ctx)?;
        container.add_child(choice)?;
    }
    Ok(container)
}

/// Split a node list into segments, each starting at a `\choice` or
/// `\correctchoice` marker. Content preceding the first marker forms a
/// marker-less leading segment, which the caller rejects.
fn segment_at_markers(nodes: &[MarkupNode]) -> Vec<Vec<&MarkupNode>> {
    let mut segments: Vec<Vec<&MarkupNode>> = Vec::new();
    let mut current: Vec<&MarkupNode> = Vec::new();
    for node in nodes {
        let is_marker = matches!(node.name(), Some("choice" | "correctchoice"));
        if is_marker && !current.is_empty() {
            segments.push(std::mem::take(&mut current));
        }
        current.push(node);
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

fn single_arg<'a>(cmd: &'a Command, construct: &'static str) -> Result<&'a str, ParseError> {
    match cmd.args.as_slice() {
        [arg] => Ok(arg.text()),
        _ => Err(ParseError::MalformedArguments {
            construct,
            reason: "expected one argument".into(),
        }),
    }
}

fn convert_textbf(_: &Converter, cmd: &Command, _: &Context<'_>) -> Result<Node, ParseError> {
    Ok(Node::bold_text(single_arg(cmd, "textbf")?))
}

fn convert_textit(_: &Converter, cmd: &Command, _: &Context<'_>) -> Result<Node, ParseError> {
    Ok(Node::italic_text(single_arg(cmd, "textit")?))
}

fn convert_mintinline(_: &Converter, cmd: &Command, _: &Context<'_>) -> Result<Node, ParseError> {
    let [language, code] = cmd.args.as_slice() else {
        return Err(ParseError::MalformedArguments {
            construct: "mintinline",
            reason: "expected {language}{code}".into(),
        });
    };
    Ok(Node::inline_code(language.text(), code.text()))
}

fn convert_inputminted(_: &Converter, cmd: &Command, ctx: &Context<'_>) -> Result<Node, ParseError> {
    let [language, path] = cmd.args.as_slice() else {
        return Err(ParseError::MalformedArguments {
            construct: "inputminted",
            reason: "expected {language}{path}".into(),
        });
    };
    let bytes = ctx.read(&strip_thisdir(path.text()))?;
    let code = String::from_utf8_lossy(&bytes).into_owned();
    Ok(Node::code(language.text(), code))
}

fn convert_tf(_: &Converter, cmd: &Command, _: &Context<'_>) -> Result<Node, ParseError> {
    Ok(Node::true_false(cmd.name == "Tf"))
}

fn convert_inlineresponsebox(
    c: &Converter,
    cmd: &Command,
    ctx: &Context<'_>,
) -> Result<Node, ParseError> {
    // The box's expected answer is its last argument; earlier arguments
    // are sizing options.
    let mut blank = Node::fill_in_the_blank();
    if let Some(answer) = cmd.args.last() {
        c.convert_into(&mut blank, &answer.contents, ctx)?;
    }
    Ok(blank)
}

fn convert_includegraphics(
    _: &Converter,
    cmd: &Command,
    ctx: &Context<'_>,
) -> Result<Node, ParseError> {
    let Some(path) = cmd.args.last() else {
        return Err(ParseError::MalformedArguments {
            construct: "includegraphics",
            reason: "missing path argument".into(),
        });
    };
    let relative = strip_thisdir(path.text());
    let data = ctx.read(&relative)?;
    Ok(Node::image(relative, data))
}

/// `\thisdir/` is how problem source spells "relative to my directory";
/// resolution happens against the context, so the marker itself goes away.
fn strip_thisdir(path: &str) -> String {
    path.replace("\\thisdir/", "")
}
