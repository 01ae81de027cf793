//! Loading problem banks from disk.
//!
//! A bank is a directory of numbered problem directories plus a
//! `problembank.yaml` configuration. Each problem directory holds exactly
//! one source file, `problem.tex` or `problem.md`, optionally opening with
//! YAML front matter carrying the problem's metadata.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::model::Node;
use crate::parsing::{self, ParseError};

/// The bank configuration file name.
pub const CONFIG_FILE: &str = "problembank.yaml";

/// The tag selection string matching every problem.
pub const ALL_TAGS: &str = "__ALL__";

const TEX_FILE: &str = "problem.tex";
const MD_FILE: &str = "problem.md";

/// Errors aborting a bank load.
#[derive(Debug, Error)]
pub enum BankError {
    #[error("bank root {0} is not a directory")]
    InvalidRoot(PathBuf),

    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid bank configuration {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("problem directory {0} is not numbered")]
    UnnumberedDirectory(PathBuf),

    #[error("duplicate problem identifier {0}")]
    DuplicateIdentifier(u32),

    #[error(transparent)]
    Problem(#[from] ProblemError),
}

/// A failure confined to one problem.
#[derive(Debug, Error)]
#[error("problem {identifier}: {message}")]
pub struct ProblemError {
    pub identifier: u32,
    pub message: String,
}

impl ProblemError {
    fn new(identifier: u32, message: impl Into<String>) -> Self {
        Self { identifier, message: message.into() }
    }
}

/// Per-problem metadata from front matter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Metadata {
    #[serde(default)]
    pub tags: Vec<String>,
    /// Where the problem came from (a course, a book, an exam).
    #[serde(default)]
    pub source: Option<String>,
}

/// Which on-disk format a problem is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Tex,
    Markdown,
}

/// One problem's source, loaded but not yet parsed.
#[derive(Debug, Clone)]
pub struct ProblemSource {
    pub identifier: u32,
    pub format: SourceFormat,
    /// Source text with front matter removed.
    pub contents: String,
    pub metadata: Metadata,
    pub dir: PathBuf,
}

impl ProblemSource {
    /// Parse the source into its problem tree.
    pub fn parse(&self) -> Result<Node, ParseError> {
        match self.format {
            SourceFormat::Tex => parsing::parse(&self.contents, Some(&self.dir)),
            SourceFormat::Markdown => parsing::parse_markdown(&self.contents, Some(&self.dir)),
        }
    }
}

/// A problem parsed all the way to its tree, ready for rendering.
#[derive(Debug, Clone)]
pub struct BankProblem {
    pub identifier: u32,
    pub metadata: Metadata,
    pub tree: Node,
}

/// The bank configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BankConfig {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tagsets: Vec<TagSet>,
}

/// A named group of tags given its own index page.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagSet {
    pub title: String,
    pub identifier: String,
    #[serde(default)]
    pub description: Option<String>,
    pub tags: TagSelection,
}

/// Either an explicit tag list or the `__ALL__` marker.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TagSelection {
    Special(String),
    Tags(Vec<String>),
}

impl TagSelection {
    /// Whether a problem carrying `tags` belongs to this selection.
    pub fn matches(&self, tags: &[String]) -> bool {
        match self {
            // Validated to be ALL_TAGS at load time.
            TagSelection::Special(_) => true,
            TagSelection::Tags(wanted) => tags.iter().any(|tag| wanted.contains(tag)),
        }
    }
}

/// A loaded bank.
#[derive(Debug)]
pub struct Bank {
    pub root: PathBuf,
    pub config: BankConfig,
    /// Problem sources in identifier order.
    pub problems: Vec<ProblemSource>,
}

impl Bank {
    /// Parse every problem's source into its tree.
    pub fn parse_problems(&self) -> Result<Vec<BankProblem>, ProblemError> {
        self.problems
            .iter()
            .map(|problem| {
                let tree = problem.parse().map_err(|err| {
                    ProblemError::new(problem.identifier, err.to_string())
                })?;
                Ok(BankProblem {
                    identifier: problem.identifier,
                    metadata: problem.metadata.clone(),
                    tree,
                })
            })
            .collect()
    }
}

/// Load a bank, failing on the first invalid problem.
pub fn load_bank(root: &Path) -> Result<Bank, BankError> {
    load(root, true).map(|(bank, _)| bank)
}

/// Load a bank, collecting invalid problems instead of aborting on them.
pub fn load_bank_lenient(root: &Path) -> Result<(Bank, Vec<ProblemError>), BankError> {
    load(root, false)
}

fn load(root: &Path, strict: bool) -> Result<(Bank, Vec<ProblemError>), BankError> {
    if !root.is_dir() {
        return Err(BankError::InvalidRoot(root.to_path_buf()));
    }
    let config = load_config(&root.join(CONFIG_FILE))?;

    let entries = fs::read_dir(root)
        .map_err(|source| BankError::Read { path: root.to_path_buf(), source })?;
    let mut problems = Vec::new();
    let mut skipped = Vec::new();
    let mut seen = HashSet::new();
    for entry in entries {
        let entry =
            entry.map_err(|source| BankError::Read { path: root.to_path_buf(), source })?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') || name.starts_with('_') {
            continue;
        }
        let Ok(identifier) = name.parse::<u32>() else {
            return Err(BankError::UnnumberedDirectory(path));
        };
        // "1" and "01" would collide.
        if !seen.insert(identifier) {
            return Err(BankError::DuplicateIdentifier(identifier));
        }
        match load_problem(&path, identifier) {
            Ok(problem) => problems.push(problem),
            Err(err) if strict => return Err(err.into()),
            Err(err) => skipped.push(err),
        }
    }
    problems.sort_by_key(|problem| problem.identifier);
    skipped.sort_by_key(|err| err.identifier);

    Ok((Bank { root: root.to_path_buf(), config, problems }, skipped))
}

fn load_config(path: &Path) -> Result<BankConfig, BankError> {
    let config_err = |message: String| BankError::Config {
        path: path.to_path_buf(),
        message,
    };
    let raw = fs::read_to_string(path).map_err(|err| config_err(err.to_string()))?;
    let config: BankConfig =
        serde_yaml::from_str(&raw).map_err(|err| config_err(err.to_string()))?;
    for tagset in &config.tagsets {
        if let TagSelection::Special(special) = &tagset.tags {
            if special != ALL_TAGS {
                return Err(config_err(format!(
                    "tagset {}: tags must be a list or \"{ALL_TAGS}\"",
                    tagset.identifier
                )));
            }
        }
    }
    Ok(config)
}

/// Load one problem directory.
pub fn load_problem(dir: &Path, identifier: u32) -> Result<ProblemSource, ProblemError> {
    let tex = dir.join(TEX_FILE);
    let md = dir.join(MD_FILE);
    let (path, format) = match (tex.is_file(), md.is_file()) {
        (true, true) => {
            return Err(ProblemError::new(
                identifier,
                format!("has both {TEX_FILE} and {MD_FILE}"),
            ));
        }
        (true, false) => (tex, SourceFormat::Tex),
        (false, true) => (md, SourceFormat::Markdown),
        (false, false) => {
            return Err(ProblemError::new(
                identifier,
                format!("has neither {TEX_FILE} nor {MD_FILE}"),
            ));
        }
    };

    let raw = fs::read_to_string(&path)
        .map_err(|err| ProblemError::new(identifier, format!("{}: {err}", path.display())))?;
    let (front_matter, contents) = split_front_matter(&raw, format);
    let metadata = if front_matter.trim().is_empty() {
        Metadata::default()
    } else {
        serde_yaml::from_str(&front_matter)
            .map_err(|err| ProblemError::new(identifier, format!("invalid front matter: {err}")))?
    };

    Ok(ProblemSource {
        identifier,
        format,
        contents,
        metadata,
        dir: dir.to_path_buf(),
    })
}

fn split_front_matter(raw: &str, format: SourceFormat) -> (String, String) {
    match format {
        SourceFormat::Tex => split_tex_front_matter(raw),
        SourceFormat::Markdown => split_md_front_matter(raw),
    }
}

/// `.tex` front matter is the leading run of `%%` comment lines.
fn split_tex_front_matter(raw: &str) -> (String, String) {
    let lines: Vec<&str> = raw.lines().collect();
    let header = lines
        .iter()
        .take_while(|line| line.starts_with("%%"))
        .count();
    let front_matter = lines[..header]
        .iter()
        .map(|line| {
            let line = line.trim_start_matches('%');
            // One separating space after the markers, deeper indentation
            // belongs to the YAML.
            line.strip_prefix(' ').unwrap_or(line)
        })
        .collect::<Vec<_>>()
        .join("\n");
    (front_matter, lines[header..].join("\n"))
}

/// `.md` front matter is a leading `---` fenced block.
fn split_md_front_matter(raw: &str) -> (String, String) {
    let mut lines = raw.lines();
    if lines.next().map(str::trim) != Some("---") {
        return (String::new(), raw.to_string());
    }
    let remaining: Vec<&str> = lines.collect();
    match remaining.iter().position(|line| line.trim() == "---") {
        Some(fence) => (
            remaining[..fence].join("\n"),
            remaining[fence + 1..].join("\n"),
        ),
        None => (String::new(), raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    const CONFIG: &str = "title: Test Bank\ntagsets:\n  - title: Everything\n    identifier: all\n    tags: __ALL__\n  - title: Recursion\n    identifier: recursion\n    tags: [recursion]\n";

    fn bank_root(dir: &Path) {
        fs::write(dir.join(CONFIG_FILE), CONFIG).unwrap();
    }

    fn add_tex_problem(root: &Path, name: &str, contents: &str) {
        let dir = root.join(name);
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join(TEX_FILE), contents).unwrap();
    }

    #[test]
    fn loads_problems_in_identifier_order() {
        let root = tempfile::tempdir().unwrap();
        bank_root(root.path());
        add_tex_problem(root.path(), "10", r"\begin{prob}ten\end{prob}");
        add_tex_problem(root.path(), "2", r"\begin{prob}two\end{prob}");
        let bank = load_bank(root.path()).unwrap();
        let ids: Vec<u32> = bank.problems.iter().map(|p| p.identifier).collect();
        assert_eq!(ids, vec![2, 10]);
    }

    #[test]
    fn tex_front_matter_becomes_metadata() {
        let root = tempfile::tempdir().unwrap();
        bank_root(root.path());
        add_tex_problem(
            root.path(),
            "1",
            "%% tags: [recursion, trees]\n%% source: CS 101\n\\begin{prob}x\\end{prob}\n",
        );
        let bank = load_bank(root.path()).unwrap();
        assert_eq!(
            bank.problems[0].metadata,
            Metadata {
                tags: vec!["recursion".into(), "trees".into()],
                source: Some("CS 101".into()),
            }
        );
        assert_eq!(bank.problems[0].contents, "\\begin{prob}x\\end{prob}");
    }

    #[test]
    fn markdown_front_matter_becomes_metadata() {
        let root = tempfile::tempdir().unwrap();
        bank_root(root.path());
        let dir = root.path().join("1");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join(MD_FILE), "---\ntags: [graphs]\n---\nWhat is a tree?\n").unwrap();
        let bank = load_bank(root.path()).unwrap();
        assert_eq!(bank.problems[0].format, SourceFormat::Markdown);
        assert_eq!(bank.problems[0].metadata.tags, vec!["graphs".to_string()]);
        assert_eq!(bank.problems[0].contents, "What is a tree?");
    }

    #[test]
    fn missing_front_matter_defaults() {
        let root = tempfile::tempdir().unwrap();
        bank_root(root.path());
        add_tex_problem(root.path(), "1", r"\begin{prob}x\end{prob}");
        let bank = load_bank(root.path()).unwrap();
        assert_eq!(bank.problems[0].metadata, Metadata::default());
    }

    #[test]
    fn dot_and_underscore_directories_are_skipped() {
        let root = tempfile::tempdir().unwrap();
        bank_root(root.path());
        add_tex_problem(root.path(), "1", r"\begin{prob}x\end{prob}");
        fs::create_dir(root.path().join(".git")).unwrap();
        fs::create_dir(root.path().join("_drafts")).unwrap();
        let bank = load_bank(root.path()).unwrap();
        assert_eq!(bank.problems.len(), 1);
    }

    #[test]
    fn unnumbered_directory_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        bank_root(root.path());
        add_tex_problem(root.path(), "extras", r"\begin{prob}x\end{prob}");
        let err = load_bank(root.path()).unwrap_err();
        assert!(matches!(err, BankError::UnnumberedDirectory(_)));
    }

    #[test]
    fn colliding_identifiers_are_an_error() {
        let root = tempfile::tempdir().unwrap();
        bank_root(root.path());
        add_tex_problem(root.path(), "1", r"\begin{prob}a\end{prob}");
        add_tex_problem(root.path(), "01", r"\begin{prob}b\end{prob}");
        let err = load_bank(root.path()).unwrap_err();
        assert!(matches!(err, BankError::DuplicateIdentifier(1)));
    }

    #[test]
    fn both_source_files_is_a_problem_error() {
        let root = tempfile::tempdir().unwrap();
        bank_root(root.path());
        let dir = root.path().join("1");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join(TEX_FILE), r"\begin{prob}x\end{prob}").unwrap();
        fs::write(dir.join(MD_FILE), "x").unwrap();
        let err = load_bank(root.path()).unwrap_err();
        assert!(matches!(err, BankError::Problem(p) if p.identifier == 1));
    }

    #[test]
    fn empty_problem_directory_is_a_problem_error() {
        let root = tempfile::tempdir().unwrap();
        bank_root(root.path());
        fs::create_dir(root.path().join("1")).unwrap();
        let err = load_bank(root.path()).unwrap_err();
        assert!(matches!(err, BankError::Problem(p) if p.identifier == 1));
    }

    #[test]
    fn invalid_front_matter_names_the_problem() {
        let root = tempfile::tempdir().unwrap();
        bank_root(root.path());
        add_tex_problem(root.path(), "7", "%% nonsense: true\n\\begin{prob}x\\end{prob}");
        let err = load_bank(root.path()).unwrap_err();
        let BankError::Problem(err) = err else {
            panic!("expected a problem error, got {err}");
        };
        assert_eq!(err.identifier, 7);
        assert!(err.message.contains("front matter"));
    }

    #[test]
    fn lenient_load_collects_failures() {
        let root = tempfile::tempdir().unwrap();
        bank_root(root.path());
        add_tex_problem(root.path(), "1", r"\begin{prob}fine\end{prob}");
        fs::create_dir(root.path().join("2")).unwrap();
        add_tex_problem(root.path(), "3", r"\begin{prob}also fine\end{prob}");
        let (bank, skipped) = load_bank_lenient(root.path()).unwrap();
        assert_eq!(bank.problems.len(), 2);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].identifier, 2);
    }

    #[test]
    fn missing_config_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        add_tex_problem(root.path(), "1", r"\begin{prob}x\end{prob}");
        let err = load_bank(root.path()).unwrap_err();
        assert!(matches!(err, BankError::Config { .. }));
    }

    #[test]
    fn tagset_special_string_must_be_all() {
        let root = tempfile::tempdir().unwrap();
        fs::write(
            root.path().join(CONFIG_FILE),
            "tagsets:\n  - title: Broken\n    identifier: broken\n    tags: __SOME__\n",
        )
        .unwrap();
        let err = load_bank(root.path()).unwrap_err();
        assert!(matches!(err, BankError::Config { .. }));
    }

    #[test]
    fn tag_selection_matching() {
        let all = TagSelection::Special(ALL_TAGS.to_string());
        let some = TagSelection::Tags(vec!["graphs".into()]);
        let tags = vec!["graphs".to_string(), "trees".to_string()];
        assert!(all.matches(&tags));
        assert!(all.matches(&[]));
        assert!(some.matches(&tags));
        assert!(!some.matches(&["recursion".to_string()]));
    }

    #[test]
    fn parse_problems_builds_trees() {
        let root = tempfile::tempdir().unwrap();
        bank_root(root.path());
        add_tex_problem(root.path(), "1", r"\begin{prob}hello\end{prob}");
        let bank = load_bank(root.path()).unwrap();
        let problems = bank.parse_problems().unwrap();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].tree.kind(), crate::model::NodeKind::Problem);
    }
}
