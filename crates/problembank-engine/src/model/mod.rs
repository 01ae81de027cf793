//! The typed problem tree.
//!
//! Problems are parsed from their on-disk representations into the types in
//! this module, and rendered to HTML from them. The tree is the intermediate
//! representation decoupling the parsers from the renderers.
//!
//! Each internal node kind declares the set of child kinds it may hold;
//! [`Node::add_child`] enforces the declaration at insertion time, so an
//! invalid tree can never be built in the first place.

use relative_path::RelativePathBuf;
use thiserror::Error;

/// Raised when attaching a child whose kind is outside the parent's
/// allowed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("a {child} node is not an allowed child of a {parent} node")]
pub struct IllegalChild {
    pub parent: NodeKind,
    pub child: NodeKind,
}

/// The kind of a [`Node`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Problem,
    Subproblem,
    Paragraph,
    NormalText,
    BoldText,
    ItalicText,
    DisplayMath,
    InlineMath,
    Code,
    InlineCode,
    Image,
    MultipleChoices,
    MultipleSelect,
    Choice,
    TrueFalse,
    FillInTheBlank,
    Solution,
}

const PROBLEM_CHILDREN: &[NodeKind] = &[
    NodeKind::Subproblem,
    NodeKind::Code,
    NodeKind::DisplayMath,
    NodeKind::Image,
    NodeKind::MultipleChoices,
    NodeKind::MultipleSelect,
    NodeKind::TrueFalse,
    NodeKind::FillInTheBlank,
    NodeKind::Solution,
    NodeKind::NormalText,
    NodeKind::BoldText,
    NodeKind::ItalicText,
    NodeKind::InlineMath,
    NodeKind::InlineCode,
    NodeKind::Paragraph,
];

// Subproblems cannot nest.
const SUBPROBLEM_CHILDREN: &[NodeKind] = &[
    NodeKind::Code,
    NodeKind::DisplayMath,
    NodeKind::Image,
    NodeKind::MultipleChoices,
    NodeKind::MultipleSelect,
    NodeKind::TrueFalse,
    NodeKind::FillInTheBlank,
    NodeKind::Solution,
    NodeKind::NormalText,
    NodeKind::BoldText,
    NodeKind::ItalicText,
    NodeKind::InlineMath,
    NodeKind::InlineCode,
    NodeKind::Paragraph,
];

const PARAGRAPH_CHILDREN: &[NodeKind] = &[
    NodeKind::NormalText,
    NodeKind::BoldText,
    NodeKind::ItalicText,
    NodeKind::InlineMath,
    NodeKind::InlineCode,
];

const CHOICES_CHILDREN: &[NodeKind] = &[NodeKind::Choice];

// Shared by Choice, Solution, and FillInTheBlank.
const CHOICE_CHILDREN: &[NodeKind] = &[
    NodeKind::NormalText,
    NodeKind::BoldText,
    NodeKind::ItalicText,
    NodeKind::InlineMath,
    NodeKind::DisplayMath,
    NodeKind::Code,
    NodeKind::InlineCode,
    NodeKind::Image,
    NodeKind::Paragraph,
];

impl NodeKind {
    /// The set of child kinds this kind may hold. Empty for leaf kinds.
    ///
    /// This table is the single source of truth consulted by
    /// [`Node::add_child`] and by the paragraph pass's eligibility check.
    pub fn allowed_children(self) -> &'static [NodeKind] {
        match self {
            NodeKind::Problem => PROBLEM_CHILDREN,
            NodeKind::Subproblem => SUBPROBLEM_CHILDREN,
            NodeKind::Paragraph => PARAGRAPH_CHILDREN,
            NodeKind::MultipleChoices | NodeKind::MultipleSelect => CHOICES_CHILDREN,
            NodeKind::Choice | NodeKind::FillInTheBlank | NodeKind::Solution => CHOICE_CHILDREN,
            NodeKind::NormalText
            | NodeKind::BoldText
            | NodeKind::ItalicText
            | NodeKind::DisplayMath
            | NodeKind::InlineMath
            | NodeKind::Code
            | NodeKind::InlineCode
            | NodeKind::Image
            | NodeKind::TrueFalse => &[],
        }
    }

    /// Whether this kind is a container (owns an ordered child sequence).
    pub fn is_internal(self) -> bool {
        matches!(
            self,
            NodeKind::Problem
                | NodeKind::Subproblem
                | NodeKind::Paragraph
                | NodeKind::MultipleChoices
                | NodeKind::MultipleSelect
                | NodeKind::Choice
                | NodeKind::FillInTheBlank
                | NodeKind::Solution
        )
    }

    /// Whether nodes of this kind may live inside a [`Node::Paragraph`].
    pub fn is_paragraph_eligible(self) -> bool {
        PARAGRAPH_CHILDREN.contains(&self)
    }

    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Problem => "Problem",
            NodeKind::Subproblem => "Subproblem",
            NodeKind::Paragraph => "Paragraph",
            NodeKind::NormalText => "NormalText",
            NodeKind::BoldText => "BoldText",
            NodeKind::ItalicText => "ItalicText",
            NodeKind::DisplayMath => "DisplayMath",
            NodeKind::InlineMath => "InlineMath",
            NodeKind::Code => "Code",
            NodeKind::InlineCode => "InlineCode",
            NodeKind::Image => "Image",
            NodeKind::MultipleChoices => "MultipleChoices",
            NodeKind::MultipleSelect => "MultipleSelect",
            NodeKind::Choice => "Choice",
            NodeKind::TrueFalse => "TrueFalse",
            NodeKind::FillInTheBlank => "FillInTheBlank",
            NodeKind::Solution => "Solution",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A node in the problem tree.
///
/// Structural equality is derived: two nodes are equal when they have the
/// same kind, equal attributes, and pairwise-equal children in order.
///
/// Build trees through the constructors plus [`Node::add_child`] /
/// [`Node::with_children`]; constructing variants directly skips child
/// validation.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A practice problem.
    Problem { children: Vec<Node> },
    /// A subproblem within a problem.
    Subproblem { children: Vec<Node> },
    /// A paragraph of text-like content.
    Paragraph { children: Vec<Node> },
    /// Text with no formatting.
    NormalText { text: String },
    /// Text that should be bolded.
    BoldText { text: String },
    /// Text that should be italicized.
    ItalicText { text: String },
    /// Math typeset on its own line.
    DisplayMath { latex: String },
    /// Math typeset within a line of text.
    InlineMath { latex: String },
    /// A block of code.
    Code { language: String, code: String },
    /// A run of code displayed inline.
    InlineCode { language: String, code: String },
    /// An image, stored as the path relative to the problem's directory
    /// plus the raw bytes read from it.
    Image {
        relative_path: RelativePathBuf,
        data: Vec<u8>,
    },
    /// A choose-one area. Holds [`Node::Choice`] children.
    MultipleChoices { children: Vec<Node> },
    /// A select-all-that-apply area. Holds [`Node::Choice`] children.
    MultipleSelect { children: Vec<Node> },
    /// One choice within a multiple choice question.
    Choice { correct: bool, children: Vec<Node> },
    /// A true/false question with its solution.
    TrueFalse { solution: bool },
    /// A fill-in-the-blank response area.
    FillInTheBlank { children: Vec<Node> },
    /// A solution to a problem.
    Solution { children: Vec<Node> },
}

impl Node {
    pub fn problem() -> Node {
        Node::Problem { children: Vec::new() }
    }

    pub fn subproblem() -> Node {
        Node::Subproblem { children: Vec::new() }
    }

    pub fn paragraph() -> Node {
        Node::Paragraph { children: Vec::new() }
    }

    pub fn normal_text(text: impl Into<String>) -> Node {
        Node::NormalText { text: text.into() }
    }

    pub fn bold_text(text: impl Into<String>) -> Node {
        Node::BoldText { text: text.into() }
    }

    pub fn italic_text(text: impl Into<String>) -> Node {
        Node::ItalicText { text: text.into() }
    }

    pub fn display_math(latex: impl Into<String>) -> Node {
        Node::DisplayMath { latex: latex.into() }
    }

    pub fn inline_math(latex: impl Into<String>) -> Node {
        Node::InlineMath { latex: latex.into() }
    }

    pub fn code(language: impl Into<String>, code: impl Into<String>) -> Node {
        Node::Code { language: language.into(), code: code.into() }
    }

    pub fn inline_code(language: impl Into<String>, code: impl Into<String>) -> Node {
        Node::InlineCode { language: language.into(), code: code.into() }
    }

    pub fn image(relative_path: impl Into<RelativePathBuf>, data: Vec<u8>) -> Node {
        Node::Image { relative_path: relative_path.into(), data }
    }

    pub fn multiple_choices() -> Node {
        Node::MultipleChoices { children: Vec::new() }
    }

    pub fn multiple_select() -> Node {
        Node::MultipleSelect { children: Vec::new() }
    }

    pub fn choice(correct: bool) -> Node {
        Node::Choice { correct, children: Vec::new() }
    }

    pub fn true_false(solution: bool) -> Node {
        Node::TrueFalse { solution }
    }

    pub fn fill_in_the_blank() -> Node {
        Node::FillInTheBlank { children: Vec::new() }
    }

    pub fn solution() -> Node {
        Node::Solution { children: Vec::new() }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Problem { .. } => NodeKind::Problem,
            Node::Subproblem { .. } => NodeKind::Subproblem,
            Node::Paragraph { .. } => NodeKind::Paragraph,
            Node::NormalText { .. } => NodeKind::NormalText,
            Node::BoldText { .. } => NodeKind::BoldText,
            Node::ItalicText { .. } => NodeKind::ItalicText,
            Node::DisplayMath { .. } => NodeKind::DisplayMath,
            Node::InlineMath { .. } => NodeKind::InlineMath,
            Node::Code { .. } => NodeKind::Code,
            Node::InlineCode { .. } => NodeKind::InlineCode,
            Node::Image { .. } => NodeKind::Image,
            Node::MultipleChoices { .. } => NodeKind::MultipleChoices,
            Node::MultipleSelect { .. } => NodeKind::MultipleSelect,
            Node::Choice { .. } => NodeKind::Choice,
            Node::TrueFalse { .. } => NodeKind::TrueFalse,
            Node::FillInTheBlank { .. } => NodeKind::FillInTheBlank,
            Node::Solution { .. } => NodeKind::Solution,
        }
    }

    /// The node's children, in insertion order. Empty for leaf nodes.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Problem { children }
            | Node::Subproblem { children }
            | Node::Paragraph { children }
            | Node::MultipleChoices { children }
            | Node::MultipleSelect { children }
            | Node::Choice { children, .. }
            | Node::FillInTheBlank { children }
            | Node::Solution { children } => children,
            _ => &[],
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Problem { children }
            | Node::Subproblem { children }
            | Node::Paragraph { children }
            | Node::MultipleChoices { children }
            | Node::MultipleSelect { children }
            | Node::Choice { children, .. }
            | Node::FillInTheBlank { children }
            | Node::Solution { children } => Some(children),
            _ => None,
        }
    }

    /// Append a child, checking it against this kind's allowed-child set.
    pub fn add_child(&mut self, child: Node) -> Result<(), IllegalChild> {
        let parent = self.kind();
        if !parent.allowed_children().contains(&child.kind()) {
            return Err(IllegalChild { parent, child: child.kind() });
        }
        // The allowed set is non-empty, so this is an internal node.
        self.children_mut()
            .expect("kinds with allowed children are internal")
            .push(child);
        Ok(())
    }

    /// Append a child known to satisfy this kind's allowed-child set.
    ///
    /// Callers must have already established legality; the paragraph pass
    /// uses this for kinds it re-attaches unchanged.
    pub(crate) fn push_child_unchecked(&mut self, child: Node) {
        debug_assert!(self.kind().allowed_children().contains(&child.kind()));
        self.children_mut()
            .expect("push_child_unchecked called on a leaf")
            .push(child);
    }

    /// Builder form of [`Node::add_child`].
    pub fn with_children(
        mut self,
        children: impl IntoIterator<Item = Node>,
    ) -> Result<Node, IllegalChild> {
        for child in children {
            self.add_child(child)?;
        }
        Ok(self)
    }

    /// A copy of this node's attributes with an empty child list.
    ///
    /// This is the generic attribute-copy used by the paragraph pass to
    /// rebuild a tree without mutating the original.
    pub fn copy_without_children(&self) -> Node {
        let mut copy = self.clone();
        if let Some(children) = copy.children_mut() {
            children.clear();
        }
        copy
    }
}
