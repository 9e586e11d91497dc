//! CLI for wikicite - Split wiki articles into sections and index their citations.

use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use wikicite::{
    load_articles, load_options, parse_articles, process_batch, render_outline, Article,
    CitationTable, EntityDocument, InputFormat, Options,
};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// Split wiki articles into sections and index their citations
#[derive(Parser)]
#[command(name = "wikicite")]
#[command(version)]
#[command(after_help = "\
Examples:
  wikicite process dump.jsonl -o report.json
  wikicite sections Paris.wiki --all-sections
  wikicite citations Paris.wiki
  cat Paris.wiki | wikicite sections -")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and print one JSON report per article
    #[command(after_help = "\
Examples:
  wikicite process articles.json
  wikicite process a.wiki b.wiki --statements -o report.json
  wikicite process dump.jsonl --config wikicite.toml

Input formats: .json (array of {title, content}), .jsonl (one object per line),
anything else is the markup of a single article titled after the file name.")]
    Process {
        /// Input files (use '-' for stdin)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Print the section outline of each article
    Sections {
        /// Input file (use '-' for stdin)
        input: PathBuf,

        /// Deepest level to show (the article itself is level 1)
        #[arg(long)]
        max_level: Option<usize>,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Print the citation table of each article as JSON
    Citations {
        /// Input file (use '-' for stdin)
        input: PathBuf,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },
}

/// Flags that switch pipeline stages on or off. They override the config file.
#[derive(Args)]
struct PipelineArgs {
    /// TOML file with pipeline options
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Remove file anchors and resolve [[link|text]] anchors
    #[arg(long)]
    clean_references: bool,

    /// Split on every heading depth, not just ==Heading==
    #[arg(long)]
    all_sections: bool,

    /// Don't extract citations
    #[arg(long)]
    no_references: bool,

    /// Parse <ref>http://...</ref> like any other reference
    #[arg(long)]
    no_broken_references: bool,

    /// Keep the whole text in a single section
    #[arg(long)]
    no_sections: bool,

    /// Build the citing-statement index
    #[arg(long)]
    statements: bool,
}

impl PipelineArgs {
    fn options(&self) -> Result<Options, AppError> {
        let mut options = match &self.config {
            Some(path) => load_options(path)
                .map_err(|e| AppError::Config(format!("'{}': {}", path.display(), e)))?,
            None => Options::default(),
        };

        if self.clean_references {
            options.clean_references = true;
        }
        if self.all_sections {
            options.main_sections_only = false;
        }
        if self.no_references {
            options.extract_references = false;
        }
        if self.no_broken_references {
            options.extract_broken_references = false;
        }
        if self.no_sections {
            options.split_sections = false;
        }
        if self.statements {
            options.extract_statements = true;
        }

        tracing::debug!(?options, "resolved pipeline options");
        Ok(options)
    }
}

// ---------------------------------------------------------------------------
// AppError: semantic exit codes
// ---------------------------------------------------------------------------

enum AppError {
    /// Exit 10: input file not found / unreadable / malformed
    Input(String),
    /// Exit 11: config file not found / invalid
    Config(String),
    /// Exit 12: cannot write output
    Output(String),
}

impl AppError {
    fn exit_code(&self) -> i32 {
        match self {
            AppError::Input(_) => 10,
            AppError::Config(_) => 11,
            AppError::Output(_) => 12,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Input(msg) => {
                write!(
                    f,
                    "{}\n  hint: .json files must hold an array of {{\"title\", \"content\"}} objects, .jsonl files one such object per line",
                    msg
                )
            }
            AppError::Config(msg) => {
                write!(
                    f,
                    "{}\n  hint: known keys are clean_references, main_sections_only, extract_references, extract_broken_references, split_sections, extract_statements",
                    msg
                )
            }
            AppError::Output(msg) => {
                write!(
                    f,
                    "{}\n  hint: check that the output directory exists and is writable",
                    msg
                )
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

/// Logs go to stderr so they never mix with reports on stdout.
fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match verbose {
        0 => "warn",
        1 => "wikicite=debug",
        _ => "wikicite=trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Commands::Process {
            inputs,
            output,
            pipeline,
        } => process_command(&inputs, output.as_deref(), &pipeline.options()?),
        Commands::Sections {
            input,
            max_level,
            pipeline,
        } => sections_command(&input, max_level, &pipeline.options()?),
        Commands::Citations { input, pipeline } => {
            citations_command(&input, &pipeline.options()?)
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Run the pipeline over every article of every input.
fn process_command(
    inputs: &[PathBuf],
    output: Option<&Path>,
    options: &Options,
) -> Result<(), AppError> {
    let mut articles = Vec::new();
    for input in inputs {
        articles.extend(read_articles(input)?);
    }

    let docs = process_batch(&articles, options);
    let json = to_json(&docs)?;

    let citations: usize = docs.iter().map(|doc| doc.citations().len()).sum();
    let diagnostics: usize = docs.iter().map(|doc| doc.diagnostics().len()).sum();

    write_result(&json, output)?;
    if let Some(output_path) = output {
        eprintln!(
            "processed {} article(s), {} citation(s), {} diagnostic(s), wrote {}",
            docs.len(),
            citations,
            diagnostics,
            output_path.display()
        );
    }

    Ok(())
}

/// Print the section outline of each article.
fn sections_command(
    input: &Path,
    max_level: Option<usize>,
    options: &Options,
) -> Result<(), AppError> {
    let docs = process_batch(&read_articles(input)?, options);

    let mut result = String::new();
    for doc in &docs {
        if docs.len() > 1 {
            result.push_str(&format!("# {}\n", doc.title()));
        }
        result.push_str(&render_outline(doc.root_section(), max_level));
    }

    write_result(&result, None)
}

#[derive(Serialize)]
struct CitationReport<'a> {
    title: &'a str,
    citations: &'a CitationTable,
}

/// Print the citation table of each article.
fn citations_command(input: &Path, options: &Options) -> Result<(), AppError> {
    let docs: Vec<EntityDocument> = process_batch(&read_articles(input)?, options);

    let reports: Vec<CitationReport> = docs
        .iter()
        .map(|doc| CitationReport {
            title: doc.title(),
            citations: doc.citations(),
        })
        .collect();

    write_result(&to_json(&reports)?, None)
}

// ---------------------------------------------------------------------------
// I/O helpers
// ---------------------------------------------------------------------------

/// Reads articles from a file, or one markup article from stdin for '-'.
fn read_articles(input: &Path) -> Result<Vec<Article>, AppError> {
    if input == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| AppError::Input(format!("failed to read from stdin: {}", e)))?;
        return parse_articles(&buf, InputFormat::Markup, "stdin")
            .map_err(|e| AppError::Input(format!("stdin: {}", e)));
    }

    let articles = load_articles(input)
        .map_err(|e| AppError::Input(format!("'{}': {}", input.display(), e)))?;
    tracing::debug!(input = %input.display(), articles = articles.len(), "loaded input");
    Ok(articles)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, AppError> {
    let mut json = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Output(format!("failed to serialize report: {}", e)))?;
    json.push('\n');
    Ok(json)
}

/// Write to file or stdout.
fn write_result(result: &str, output: Option<&Path>) -> Result<(), AppError> {
    if let Some(output_path) = output {
        fs::write(output_path, result)
            .map_err(|e| AppError::Output(format!("'{}': {}", output_path.display(), e)))?;
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        write!(handle, "{}", result).map_err(|e| AppError::Output(format!("stdout: {}", e)))?;
    }
    Ok(())
}
