use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use problembank_config::Config;
use problembank_engine::io::{self, BankProblem, ProblemError};
use problembank_engine::site;

const USAGE: &str = "usage: problembank [<bank-dir>] [<output-dir>] [--template <path>]";

struct Args {
    bank: Option<PathBuf>,
    output: Option<PathBuf>,
    template: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut positional = Vec::new();
    let mut template = None;
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--template" => {
                let path = args.next().context("--template needs a path")?;
                template = Some(PathBuf::from(path));
            }
            "--help" | "-h" => {
                println!("{USAGE}");
                process::exit(0);
            }
            _ if arg.starts_with('-') => bail!("unknown option {arg}\n{USAGE}"),
            _ => positional.push(PathBuf::from(arg)),
        }
    }
    if positional.len() > 2 {
        bail!("too many arguments\n{USAGE}");
    }
    let mut positional = positional.into_iter();
    Ok(Args {
        bank: positional.next(),
        output: positional.next(),
        template,
    })
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = parse_args()?;
    let config = Config::load().context("failed to load configuration")?;

    let bank_dir = args
        .bank
        .or_else(|| config.as_ref().map(|c| c.bank_path.clone()))
        .with_context(|| format!("no bank directory given and no defaults configured\n{USAGE}"))?;
    let out_dir = args
        .output
        .or_else(|| config.as_ref().and_then(|c| c.output_path.clone()))
        .with_context(|| format!("no output directory given and no defaults configured\n{USAGE}"))?;
    let template_path = args
        .template
        .or_else(|| config.as_ref().and_then(|c| c.template_path.clone()));

    if out_dir.exists() {
        bail!("output directory {} already exists", out_dir.display());
    }

    let template = template_path
        .as_deref()
        .map(read_template)
        .transpose()?;

    let (bank, skipped) = io::load_bank_lenient(&bank_dir)
        .with_context(|| format!("failed to load bank {}", bank_dir.display()))?;
    let (problems, skipped) = parse_problems_lenient(&bank, skipped);
    for err in &skipped {
        eprintln!("skipping {err}");
    }
    if problems.is_empty() {
        bail!("no valid problems in {}", bank_dir.display());
    }

    site::generate(&bank.config, &problems, &out_dir, template.as_deref())
        .context("failed to generate site")?;

    println!(
        "wrote {} problems to {} ({} skipped)",
        problems.len(),
        out_dir.display(),
        skipped.len()
    );
    Ok(())
}

fn read_template(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("failed to read template {}", path.display()))
}

/// Parse every loaded problem, folding parse failures into the skip list.
/// The merged list is re-sorted so the report stays in identifier order.
fn parse_problems_lenient(
    bank: &io::Bank,
    mut skipped: Vec<ProblemError>,
) -> (Vec<BankProblem>, Vec<ProblemError>) {
    let mut problems = Vec::new();
    for source in &bank.problems {
        match source.parse() {
            Ok(tree) => problems.push(BankProblem {
                identifier: source.identifier,
                metadata: source.metadata.clone(),
                tree,
            }),
            Err(err) => skipped.push(ProblemError {
                identifier: source.identifier,
                message: err.to_string(),
            }),
        }
    }
    skipped.sort_by_key(|err| err.identifier);
    (problems, skipped)
}
