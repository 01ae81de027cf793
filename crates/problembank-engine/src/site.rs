//! Static site assembly.
//!
//! A generated site is flat HTML: `index.html` linking everything, an
//! `all.html` listing, per-tag listings under `tags/`, an `untagged.html`
//! listing when any problem carries no tags, and extracted image files
//! under `images/<identifier>/`. Rendered copies of each tree have their
//! image paths re-pointed at the extracted files.

use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use html_escape::encode_text;
use relative_path::RelativePathBuf;
use thiserror::Error;

use crate::io::{BankConfig, BankProblem};
use crate::model::Node;
use crate::render;

#[derive(Debug, Error)]
pub enum SiteError {
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Generate the whole site under `out_dir`, creating it if needed.
pub fn generate(
    config: &BankConfig,
    problems: &[BankProblem],
    out_dir: &Path,
    template: Option<&str>,
) -> Result<(), SiteError> {
    write_images(problems, out_dir)?;

    // Tag -> problems carrying it, in identifier order.
    let mut by_tag: BTreeMap<&str, Vec<&BankProblem>> = BTreeMap::new();
    for problem in problems {
        for tag in &problem.metadata.tags {
            by_tag.entry(tag).or_default().push(problem);
        }
    }

    for (tag, tagged) in &by_tag {
        let body = listing_body(tag, None, tagged, "../images/");
        let page = render::render_page(&body, "../", template);
        write_file(&out_dir.join("tags").join(format!("{}.html", slugify(tag))), page)?;
    }

    for tagset in &config.tagsets {
        let members: Vec<&BankProblem> = problems
            .iter()
            .filter(|problem| tagset.tags.matches(&problem.metadata.tags))
            .collect();
        let body = listing_body(&tagset.title, tagset.description.as_deref(), &members, "../images/");
        let page = render::render_page(&body, "../", template);
        write_file(
            &out_dir.join("tags").join(format!("{}.html", slugify(&tagset.identifier))),
            page,
        )?;
    }

    let all: Vec<&BankProblem> = problems.iter().collect();
    let body = listing_body("All problems", None, &all, "images/");
    write_file(&out_dir.join("all.html"), render::render_page(&body, "", template))?;

    let untagged: Vec<&BankProblem> = problems
        .iter()
        .filter(|problem| problem.metadata.tags.is_empty())
        .collect();
    if !untagged.is_empty() {
        let body = listing_body("Untagged problems", None, &untagged, "images/");
        write_file(&out_dir.join("untagged.html"), render::render_page(&body, "", template))?;
    }

    let body = index_body(config, problems, &by_tag, !untagged.is_empty());
    write_file(&out_dir.join("index.html"), render::render_page(&body, "", template))?;
    Ok(())
}

fn write_images(problems: &[BankProblem], out_dir: &Path) -> Result<(), SiteError> {
    for problem in problems {
        for (relative_path, data) in images(&problem.tree) {
            let path = relative_path
                .to_path(out_dir.join("images").join(problem.identifier.to_string()));
            write_file(&path, data)?;
        }
    }
    Ok(())
}

/// Every image in the tree, in breadth-first order.
fn images(tree: &Node) -> Vec<(&RelativePathBuf, &[u8])> {
    let mut found = Vec::new();
    let mut queue = VecDeque::from([tree]);
    while let Some(node) = queue.pop_front() {
        if let Node::Image { relative_path, data } = node {
            found.push((relative_path, data.as_slice()));
        }
        queue.extend(node.children());
    }
    found
}

/// A copy of the tree with image paths re-pointed at the site's extracted
/// image directory for this problem.
fn with_image_prefix(node: &Node, prefix: &str, identifier: u32) -> Node {
    match node {
        Node::Image { relative_path, data } => Node::image(
            format!("{prefix}{identifier}/{relative_path}"),
            data.clone(),
        ),
        _ if node.kind().is_internal() => {
            let mut copy = node.copy_without_children();
            for child in node.children() {
                copy.push_child_unchecked(with_image_prefix(child, prefix, identifier));
            }
            copy
        }
        _ => node.clone(),
    }
}

fn listing_body(
    title: &str,
    description: Option<&str>,
    problems: &[&BankProblem],
    image_prefix: &str,
) -> String {
    let mut body = format!("<h1>{}</h1>\n", encode_text(title));
    if let Some(description) = description {
        body.push_str(&format!("<p>{}</p>\n", encode_text(description)));
    }
    for problem in problems {
        let tree = with_image_prefix(&problem.tree, image_prefix, problem.identifier);
        body.push_str(&format!(
            "<section id=\"problem-{id}\">\n<h2>Problem {id}</h2>\n{html}\n</section>\n",
            id = problem.identifier,
            html = render::problem_html(&tree),
        ));
    }
    body
}

fn index_body(
    config: &BankConfig,
    problems: &[BankProblem],
    by_tag: &BTreeMap<&str, Vec<&BankProblem>>,
    has_untagged: bool,
) -> String {
    let title = config.title.as_deref().unwrap_or("Practice Problems");
    let mut body = format!("<h1>{}</h1>\n", encode_text(title));
    if let Some(description) = &config.description {
        body.push_str(&format!("<p>{}</p>\n", encode_text(description)));
    }

    if !config.tagsets.is_empty() {
        body.push_str("<h2>Collections</h2>\n<ul>\n");
        for tagset in &config.tagsets {
            body.push_str(&format!(
                "<li><a href=\"tags/{}.html\">{}</a></li>\n",
                slugify(&tagset.identifier),
                encode_text(&tagset.title),
            ));
        }
        body.push_str("</ul>\n");
    }

    if !by_tag.is_empty() {
        body.push_str("<h2>Tags</h2>\n<ul>\n");
        for (tag, tagged) in by_tag {
            body.push_str(&format!(
                "<li><a href=\"tags/{}.html\">{}</a> ({})</li>\n",
                slugify(tag),
                encode_text(tag),
                tagged.len(),
            ));
        }
        body.push_str("</ul>\n");
    }

    body.push_str(&format!(
        "<p><a href=\"all.html\">All problems</a> ({})</p>\n",
        problems.len()
    ));
    if has_untagged {
        body.push_str("<p><a href=\"untagged.html\">Untagged problems</a></p>\n");
    }
    body
}

/// Tag names become filenames: lowercased, with anything that is not
/// alphanumeric collapsed to a hyphen.
fn slugify(tag: &str) -> String {
    tag.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect()
}

fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<(), SiteError> {
    let write_err = |source| SiteError::Write { path: path.to_path_buf(), source };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, contents).map_err(write_err)
}
