//! Paragraph reconstruction.
//!
//! The converter emits text-like nodes as direct children of whatever
//! container they appeared in. This pass rebuilds each container so that
//! maximal runs of paragraph-eligible children are wrapped in
//! [`Node::Paragraph`] nodes, splitting a run wherever a text child
//! contains a blank line (`\n\n`). Non-eligible children keep their
//! positions between the produced paragraphs.
//!
//! Text ending in a blank line yields a trailing paragraph holding one
//! empty text node; renderers emit it as an empty `<p>`, which is
//! harmless, and source that tidy does not end mid-blank-line anyway.

use crate::model::Node;

/// One element of a flattened eligible run: either a node to place in the
/// current paragraph, or a break starting the next one.
enum Piece {
    Node(Node),
    Break,
}

/// Rebuild `node` with paragraphs reconstructed throughout its subtree.
///
/// The input is not mutated. Leaf nodes are returned as-is.
pub fn rebuild(node: &Node) -> Node {
    if !node.kind().is_internal() {
        return node.clone();
    }
    let mut rebuilt = node.copy_without_children();
    let mut run: Vec<&Node> = Vec::new();
    for child in node.children() {
        if child.kind().is_paragraph_eligible() {
            run.push(child);
        } else {
            flush_run(&mut rebuilt, &mut run);
            rebuilt.push_child_unchecked(rebuild(child));
        }
    }
    flush_run(&mut rebuilt, &mut run);
    rebuilt
}

fn flush_run(parent: &mut Node, run: &mut Vec<&Node>) {
    if run.is_empty() {
        return;
    }
    for paragraph in paragraphs_of(std::mem::take(run)) {
        parent.push_child_unchecked(paragraph);
    }
}

/// Split one eligible run into paragraphs at blank lines. A run with `k`
/// blank-line breaks yields `k + 1` paragraphs.
fn paragraphs_of(run: Vec<&Node>) -> Vec<Node> {
    let mut pieces = Vec::new();
    for node in run {
        match node {
            Node::NormalText { text } if text.contains("\n\n") => {
                for (i, part) in text.split("\n\n").enumerate() {
                    if i > 0 {
                        pieces.push(Piece::Break);
                    }
                    pieces.push(Piece::Node(Node::normal_text(part)));
                }
            }
            other => pieces.push(Piece::Node(other.clone())),
        }
    }

    let mut paragraphs = Vec::new();
    let mut current = Node::paragraph();
    for piece in pieces {
        match piece {
            Piece::Node(node) => current.push_child_unchecked(node),
            Piece::Break => {
                paragraphs.push(std::mem::replace(&mut current, Node::paragraph()));
            }
        }
    }
    paragraphs.push(current);
    paragraphs
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn para(children: Vec<Node>) -> Node {
        Node::paragraph().with_children(children).unwrap()
    }

    #[test]
    fn single_run_becomes_one_paragraph() {
        let tree = Node::problem()
            .with_children(vec![
                Node::normal_text("see "),
                Node::bold_text("this"),
                Node::normal_text(" here"),
            ])
            .unwrap();
        assert_eq!(
            rebuild(&tree),
            Node::problem()
                .with_children(vec![para(vec![
                    Node::normal_text("see "),
                    Node::bold_text("this"),
                    Node::normal_text(" here"),
                ])])
                .unwrap()
        );
    }

    #[test]
    fn blank_line_splits_paragraphs() {
        let tree = Node::problem()
            .with_children(vec![Node::normal_text("first\n\nsecond")])
            .unwrap();
        assert_eq!(
            rebuild(&tree),
            Node::problem()
                .with_children(vec![
                    para(vec![Node::normal_text("first")]),
                    para(vec![Node::normal_text("second")]),
                ])
                .unwrap()
        );
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(4)]
    fn k_breaks_yield_k_plus_one_paragraphs(#[case] k: usize) {
        let text = vec!["chunk"; k + 1].join("\n\n");
        let tree = Node::problem()
            .with_children(vec![Node::normal_text(text)])
            .unwrap();
        assert_eq!(rebuild(&tree).children().len(), k + 1);
    }

    #[test]
    fn trailing_blank_line_yields_empty_paragraph() {
        let tree = Node::problem()
            .with_children(vec![Node::normal_text("hello\n\n")])
            .unwrap();
        assert_eq!(
            rebuild(&tree),
            Node::problem()
                .with_children(vec![
                    para(vec![Node::normal_text("hello")]),
                    para(vec![Node::normal_text("")]),
                ])
                .unwrap()
        );
    }

    #[test]
    fn non_eligible_children_keep_their_positions() {
        let tree = Node::problem()
            .with_children(vec![
                Node::normal_text("before"),
                Node::code("python", "f()"),
                Node::normal_text("after"),
            ])
            .unwrap();
        assert_eq!(
            rebuild(&tree),
            Node::problem()
                .with_children(vec![
                    para(vec![Node::normal_text("before")]),
                    Node::code("python", "f()"),
                    para(vec![Node::normal_text("after")]),
                ])
                .unwrap()
        );
    }

    #[test]
    fn recurses_into_nested_containers() {
        let tree = Node::problem()
            .with_children(vec![Node::solution()
                .with_children(vec![Node::normal_text("a\n\nb")])
                .unwrap()])
            .unwrap();
        assert_eq!(
            rebuild(&tree),
            Node::problem()
                .with_children(vec![Node::solution()
                    .with_children(vec![
                        para(vec![Node::normal_text("a")]),
                        para(vec![Node::normal_text("b")]),
                    ])
                    .unwrap()])
                .unwrap()
        );
    }

    #[test]
    fn input_tree_is_not_mutated() {
        let tree = Node::problem()
            .with_children(vec![Node::normal_text("a\n\nb")])
            .unwrap();
        let before = tree.clone();
        let _ = rebuild(&tree);
        assert_eq!(tree, before);
    }

    #[test]
    fn leaf_input_is_returned_unchanged() {
        let leaf = Node::true_false(true);
        assert_eq!(rebuild(&leaf), leaf);
    }
}
