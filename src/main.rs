//! docgen - DocBook structure analyzer

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;

use docgen::dom::{self, Document, NodeId};
use docgen::{Outline, Rank, Settings, StructuralModel};

#[derive(Parser)]
#[command(name = "docgen")]
#[command(version, about = "DocBook structure analyzer", long_about = None)]
#[command(after_help = "EXAMPLES:
    docgen manual.xml                        Print the table of contents as JSON
    docgen manual.xml -s docgen.json         Use settings from a JSON file
    docgen manual.xml --file-rank chapter    One page per chapter
    docgen manual.xml --index                Include the index terms")]
struct Cli {
    /// DocBook 5 XML file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// JSON settings file
    #[arg(short, long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Lowest rank that gets its own page
    #[arg(long, value_name = "RANK")]
    file_rank: Option<Rank>,

    /// Lowest rank listed in the table of contents
    #[arg(long, value_name = "RANK")]
    page_toc_rank: Option<Rank>,

    /// Directory image references are resolved against
    #[arg(long, value_name = "DIR")]
    content_dir: Option<PathBuf>,

    /// Number sections, not only chapters and above
    #[arg(long)]
    numbered_sections: bool,

    /// Drop pages of elements without content of their own
    #[arg(long)]
    simple_navigation: bool,

    /// Build for offline use (keeps nodes removed for online builds)
    #[arg(long)]
    offline: bool,

    /// Include the index terms in the output
    #[arg(long)]
    index: bool,

    /// Only print errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Serialize)]
struct Report {
    source: String,
    toc: Outline,
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<Vec<IndexEntry>>,
}

#[derive(Serialize)]
struct IndexEntry {
    term: String,
    /// Output files with an occurrence, in first-seen order.
    files: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    secondary: Vec<IndexEntry>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.quiet { "error" } else { "info" };
    // stdout carries the JSON
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Stderr)
        .init();

    match run(&cli) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> docgen::Result<String> {
    let settings = settings(cli)?;
    let mut doc = dom::load(&cli.input)?;
    let model = docgen::analyze(&mut doc, &settings)?;

    let report = Report {
        source: cli.input.display().to_string(),
        toc: model.outline(&doc),
        index: cli.index.then(|| index_entries(&doc, &model)),
    };
    serde_json::to_string_pretty(&report).map_err(|e| docgen::Error::Bug(e.to_string()))
}

/// Settings file first, then command line overrides.
fn settings(cli: &Cli) -> docgen::Result<Settings> {
    let mut settings = match &cli.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(rank) = cli.file_rank {
        settings.lowest_file_element_rank = rank;
    }
    if let Some(rank) = cli.page_toc_rank {
        settings.lowest_page_toc_element_rank = rank;
    }
    if let Some(dir) = &cli.content_dir {
        settings.content_dir = dir.clone();
    }
    settings.numbered_sections |= cli.numbered_sections;
    settings.simple_navigation_mode |= cli.simple_navigation;
    settings.offline |= cli.offline;
    Ok(settings)
}

fn index_entries(doc: &Document, model: &StructuralModel) -> Vec<IndexEntry> {
    let index = &model.index_terms;
    index
        .primary_terms()
        .iter()
        .map(|term| IndexEntry {
            term: term.clone(),
            files: files_of(doc, model, index.occurrences(term)),
            secondary: index
                .secondary_terms(term)
                .iter()
                .map(|s| IndexEntry {
                    term: s.text.clone(),
                    files: files_of(doc, model, &s.occurrences),
                    secondary: Vec::new(),
                })
                .collect(),
        })
        .collect()
}

fn files_of(doc: &Document, model: &StructuralModel, occurrences: &[NodeId]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    occurrences
        .iter()
        .filter_map(|&n| model.toc.containing_file(doc, n))
        .filter(|f| seen.insert(*f))
        .map(str::to_string)
        .collect()
}
