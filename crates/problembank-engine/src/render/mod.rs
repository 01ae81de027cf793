//! HTML rendering of problem trees.
//!
//! Rendering is a single exhaustive match over [`Node`]; adding a node kind
//! without a rendering fails to compile. Text and code are HTML-escaped.
//! Math bodies pass through raw inside `\(...\)` / `\[...\]` delimiters for
//! client-side typesetting. Answers (solutions, true/false, blanks, correct
//! choices) are emitted but hidden or class-marked, so styling decides when
//! they show.

mod page;

pub use page::{render_page, DEFAULT_TEMPLATE};

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::model::Node;

/// Render one problem tree as an HTML fragment.
pub fn problem_html(problem: &Node) -> String {
    let mut out = String::new();
    write_node(&mut out, problem);
    out
}

fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Problem { children } => write_container(out, "div", "problem", children),
        Node::Subproblem { children } => write_container(out, "div", "subproblem", children),
        Node::Paragraph { children } => {
            out.push_str("<p>");
            write_children(out, children);
            out.push_str("</p>");
        }
        Node::NormalText { text } => out.push_str(&encode_text(text)),
        Node::BoldText { text } => {
            out.push_str("<b>");
            out.push_str(&encode_text(text));
            out.push_str("</b>");
        }
        Node::ItalicText { text } => {
            out.push_str("<i>");
            out.push_str(&encode_text(text));
            out.push_str("</i>");
        }
        Node::DisplayMath { latex } => {
            out.push_str("<div class=\"math\">\\[");
            out.push_str(latex);
            out.push_str("\\]</div>");
        }
        Node::InlineMath { latex } => {
            out.push_str("<span class=\"math\">\\(");
            out.push_str(latex);
            out.push_str("\\)</span>");
        }
        Node::Code { language, code } => {
            out.push_str("<pre class=\"code\"><code class=\"language-");
            out.push_str(&encode_double_quoted_attribute(language));
            out.push_str("\">");
            out.push_str(&encode_text(code));
            out.push_str("</code></pre>");
        }
        Node::InlineCode { code, .. } => {
            out.push_str("<code class=\"code\">");
            out.push_str(&encode_text(code));
            out.push_str("</code>");
        }
        Node::Image { relative_path, .. } => {
            out.push_str("<img src=\"");
            out.push_str(&encode_double_quoted_attribute(relative_path.as_str()));
            out.push_str("\" />");
        }
        Node::MultipleChoices { children } => {
            write_container(out, "div", "multiple-choices", children)
        }
        Node::MultipleSelect { children } => {
            write_container(out, "div", "multiple-select", children)
        }
        Node::Choice { correct, children } => {
            let class = if *correct { "choice correct" } else { "choice" };
            write_container(out, "div", class, children);
        }
        Node::TrueFalse { solution } => {
            out.push_str("<details class=\"true-false\"><summary>True or false?</summary>");
            out.push_str(if *solution { "True" } else { "False" });
            out.push_str("</details>");
        }
        Node::FillInTheBlank { children } => {
            out.push_str("<details class=\"fill-in-the-blank\"><summary>Answer</summary>");
            write_children(out, children);
            out.push_str("</details>");
        }
        Node::Solution { children } => {
            out.push_str("<details class=\"solution\"><summary>Solution</summary>");
            write_children(out, children);
            out.push_str("</details>");
        }
    }
}

fn write_container(out: &mut String, tag: &str, class: &str, children: &[Node]) {
    out.push_str("<");
    out.push_str(tag);
    out.push_str(" class=\"");
    out.push_str(class);
    out.push_str("\">");
    write_children(out, children);
    out.push_str("</");
    out.push_str(tag);
    out.push_str(">");
}

fn write_children(out: &mut String, children: &[Node]) {
    for child in children {
        write_node(out, child);
    }
}
