//! The Markdown problem format.
//!
//! Markdown problems produce the same typed tree as the markup format, so
//! everything downstream of parsing is shared. CommonMark already delimits
//! paragraphs, so this front end builds [`Node::Paragraph`] nodes directly
//! and skips the paragraph reconstruction pass.
//!
//! The supported subset is paragraphs, emphasis, inline code, fenced and
//! indented code blocks, `$`/`$$` math, and images. Unsupported block
//! structure (lists, quotes, tables) degrades to its text content.

use std::path::Path;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use super::{Context, ParseError};
use crate::model::Node;

/// Language given to code with no fence info string.
const DEFAULT_LANGUAGE: &str = "text";

/// Parse a Markdown problem into a typed tree rooted at [`Node::Problem`].
pub fn parse_markdown(source: &str, dir: Option<&Path>) -> Result<Node, ParseError> {
    let ctx = Context::new(dir);
    let mut converter = MarkdownConverter::new(&ctx);
    for event in Parser::new_ext(source, Options::ENABLE_MATH) {
        converter.process_event(event)?;
    }
    converter.finish()
}

#[derive(Clone, Copy)]
enum Style {
    Normal,
    Bold,
    Italic,
}

struct CodeBuffer {
    language: String,
    content: String,
}

struct MarkdownConverter<'a, 'p> {
    ctx: &'a Context<'p>,
    problem: Node,
    paragraph: Option<Node>,
    text: String,
    style: Style,
    code: Option<CodeBuffer>,
    in_image_alt: bool,
}

impl<'a, 'p> MarkdownConverter<'a, 'p> {
    fn new(ctx: &'a Context<'p>) -> Self {
        Self {
            ctx,
            problem: Node::problem(),
            paragraph: None,
            text: String::new(),
            style: Style::Normal,
            code: None,
            in_image_alt: false,
        }
    }

    fn process_event(&mut self, event: Event) -> Result<(), ParseError> {
        match event {
            Event::Start(Tag::Paragraph) | Event::End(TagEnd::Paragraph) => {
                self.end_paragraph()?;
            }
            Event::Start(Tag::Strong) => {
                self.flush_text()?;
                self.style = Style::Bold;
            }
            Event::End(TagEnd::Strong) => {
                self.flush_text()?;
                self.style = Style::Normal;
            }
            Event::Start(Tag::Emphasis) => {
                self.flush_text()?;
                self.style = Style::Italic;
            }
            Event::End(TagEnd::Emphasis) => {
                self.flush_text()?;
                self.style = Style::Normal;
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                self.end_paragraph()?;
                let language = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => lang.to_string(),
                    _ => DEFAULT_LANGUAGE.to_string(),
                };
                self.code = Some(CodeBuffer { language, content: String::new() });
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(code) = self.code.take() {
                    self.push_block(Node::code(code.language, code.content))?;
                }
            }
            Event::Start(Tag::Image { dest_url, .. }) => {
                let data = self.ctx.read(&dest_url)?;
                self.push_block(Node::image(dest_url.as_ref(), data))?;
                // Alt text events follow; they have nowhere to go.
                self.in_image_alt = true;
            }
            Event::End(TagEnd::Image) => {
                self.in_image_alt = false;
            }
            Event::Text(text) => {
                if let Some(code) = self.code.as_mut() {
                    code.content.push_str(&text);
                } else if !self.in_image_alt {
                    self.text.push_str(&text);
                }
            }
            Event::Code(code) => {
                self.push_inline(Node::inline_code(DEFAULT_LANGUAGE, code.as_ref()))?;
            }
            Event::InlineMath(latex) => {
                self.push_inline(Node::inline_math(latex.as_ref()))?;
            }
            Event::DisplayMath(latex) => {
                self.push_block(Node::display_math(latex.as_ref()))?;
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some(code) = self.code.as_mut() {
                    code.content.push('\n');
                } else {
                    self.text.push('\n');
                }
            }
            // Remaining block structure degrades to its text content.
            _ => {}
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Node, ParseError> {
        self.end_paragraph()?;
        Ok(self.problem)
    }

    /// Move buffered text into the open paragraph as a styled text node.
    fn flush_text(&mut self) -> Result<(), ParseError> {
        if self.text.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.text);
        let node = match self.style {
            Style::Normal => Node::normal_text(text),
            Style::Bold => Node::bold_text(text),
            Style::Italic => Node::italic_text(text),
        };
        self.attach_inline(node)
    }

    /// Attach an inline node after any text buffered before it.
    fn push_inline(&mut self, node: Node) -> Result<(), ParseError> {
        self.flush_text()?;
        self.attach_inline(node)
    }

    fn attach_inline(&mut self, node: Node) -> Result<(), ParseError> {
        self.paragraph
            .get_or_insert_with(Node::paragraph)
            .add_child(node)?;
        Ok(())
    }

    /// Attach a block node directly to the problem, closing any open
    /// paragraph first.
    fn push_block(&mut self, node: Node) -> Result<(), ParseError> {
        self.end_paragraph()?;
        self.problem.add_child(node)?;
        Ok(())
    }

    fn end_paragraph(&mut self) -> Result<(), ParseError> {
        self.flush_text()?;
        if let Some(paragraph) = self.paragraph.take() {
            if !paragraph.children().is_empty() {
                self.problem.add_child(paragraph)?;
            }
        }
        Ok(())
    }
}
