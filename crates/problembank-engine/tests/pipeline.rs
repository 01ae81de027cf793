//! End-to-end tests: source text in, trees and sites out.

use std::fs;

use pretty_assertions::assert_eq;
use problembank_engine::io::{load_bank, CONFIG_FILE};
use problembank_engine::{parse, site, Node, NodeKind, ParseError};

#[test]
fn minimal_problem_has_no_children() {
    let tree = parse(r"\begin{prob}\end{prob}", None).unwrap();
    assert_eq!(tree, Node::problem());
}

#[test]
fn text_and_math_merge_into_one_paragraph() {
    let tree = parse(r"\begin{prob}This is $x^2$.\end{prob}", None).unwrap();
    assert_eq!(
        tree,
        Node::problem()
            .with_children(vec![Node::paragraph()
                .with_children(vec![
                    Node::normal_text("This is "),
                    Node::inline_math("x^2"),
                    Node::normal_text("."),
                ])
                .unwrap()])
            .unwrap()
    );
}

#[test]
fn paragraphing_recurses_into_solutions() {
    let source = "\\begin{prob}Q. \\begin{soln}First part.\n\nSecond part.\\end{soln}\\end{prob}";
    let tree = parse(source, None).unwrap();
    let solution = &tree.children()[1];
    assert_eq!(solution.kind(), NodeKind::Solution);
    assert_eq!(
        solution.children(),
        &[
            Node::paragraph()
                .with_children(vec![Node::normal_text("First part.")])
                .unwrap(),
            Node::paragraph()
                .with_children(vec![Node::normal_text("Second part.")])
                .unwrap(),
        ]
    );
}

#[test]
fn unresolvable_image_aborts_the_parse() {
    let dir = tempfile::tempdir().unwrap();
    let err = parse(
        r"\begin{prob}Look: \includegraphics{\thisdir/gone.png}\end{prob}",
        Some(dir.path()),
    )
    .unwrap_err();
    let ParseError::ResourceResolution { path, .. } = err else {
        panic!("expected a resource resolution error");
    };
    assert!(path.ends_with("gone.png"));
}

#[test]
fn full_document_parses_every_construct() {
    let source = "\\begin{prob}\n\
        A \\textbf{graph} is \\textit{acyclic} if it has no cycles.\n\
        \\[V - E + F = 2\\]\n\
        Call \\mintinline{python}{dfs(v)} on the root.\n\
        \\begin{minted}{python}\ndef dfs(v):\n    pass\n\\end{minted}\n\
        \\begin{subprob}Trees are acyclic. \\Tf{}\\end{subprob}\n\
        \\begin{subprob}\n\
        \\begin{choices}\n\
        \\choice $n$\n\
        \\correctchoice $n - 1$\n\
        \\end{choices}\n\
        \\end{subprob}\n\
        \\begin{soln}Induction on $n$.\\end{soln}\n\
        \\end{prob}";
    let tree = parse(source, None).unwrap();

    let kinds: Vec<NodeKind> = tree.children().iter().map(Node::kind).collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::Paragraph,
            NodeKind::DisplayMath,
            NodeKind::Paragraph,
            NodeKind::Code,
            NodeKind::Subproblem,
            NodeKind::Subproblem,
            NodeKind::Solution,
        ]
    );

    let choices = &tree.children()[5].children()[0];
    assert_eq!(choices.kind(), NodeKind::MultipleChoices);
    let correct: Vec<bool> = choices
        .children()
        .iter()
        .map(|choice| matches!(choice, Node::Choice { correct: true, .. }))
        .collect();
    assert_eq!(correct, vec![false, true]);
}

#[test]
fn bank_to_site() {
    let root = tempfile::tempdir().unwrap();
    fs::write(
        root.path().join(CONFIG_FILE),
        "title: Demo Bank\ntagsets:\n  - title: Everything\n    identifier: everything\n    tags: __ALL__\n",
    )
    .unwrap();

    let p1 = root.path().join("1");
    fs::create_dir(&p1).unwrap();
    fs::write(
        p1.join("problem.tex"),
        "%% tags: [counting]\n\\begin{prob}How many subsets does $\\{1,2,3\\}$ have? \\inlineresponsebox{$8$}\\end{prob}\n",
    )
    .unwrap();

    let p2 = root.path().join("2");
    fs::create_dir(&p2).unwrap();
    fs::write(p2.join("fig.png"), b"png bytes").unwrap();
    fs::write(
        p2.join("problem.md"),
        "---\ntags: [figures]\n---\nName this shape:\n\n![shape](fig.png)\n",
    )
    .unwrap();

    let bank = load_bank(root.path()).unwrap();
    assert_eq!(bank.problems.len(), 2);
    let problems = bank.parse_problems().unwrap();

    let out = tempfile::tempdir().unwrap();
    site::generate(&bank.config, &problems, out.path(), None).unwrap();

    let index = fs::read_to_string(out.path().join("index.html")).unwrap();
    assert!(index.contains("Demo Bank"));
    assert!(index.contains("tags/everything.html"));
    assert!(index.contains("tags/counting.html"));

    assert_eq!(
        fs::read(out.path().join("images/2/fig.png")).unwrap(),
        b"png bytes"
    );
    let all = fs::read_to_string(out.path().join("all.html")).unwrap();
    assert!(all.contains(r#"<img src="images/2/fig.png" />"#));
    assert!(!out.path().join("untagged.html").exists());
}
