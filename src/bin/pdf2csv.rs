use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::LazyLock;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use pdf_table_extract::{
    DEFAULT_PREVIEW_ROWS, ExtractionConfig, ExtractionResult, Flavor, GeometrySettings, Method,
    Naming, WriteOptions, extract, render, write_with_options,
};
use regex::Regex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

static PAGE_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\d+(\s*,\s*\d+)+\s*$").expect("page list pattern should compile")
});

#[derive(Debug, Parser)]
#[command(
    name = "pdf2csv",
    version,
    about = "Extract tables from PDF documents into CSV files"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract the tables of one PDF, or of every PDF in the input directory.
    Extract(ExtractArgs),
    /// List the PDFs found in the input directory.
    List(ListArgs),
}

#[derive(Debug, Args)]
struct DirArgs {
    /// Directory searched for PDFs.
    #[arg(long, env = "PDF2CSV_INPUT_DIR", default_value = "pdf_input")]
    input_dir: PathBuf,
}

#[derive(Debug, Args)]
struct ListArgs {
    #[command(flatten)]
    dirs: DirArgs,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Input PDF. Without it every PDF in the input directory is processed.
    pdf: Option<PathBuf>,

    /// Output base name; its file stem names the CSV files.
    output: Option<String>,

    /// Back-end selection: auto, text-layout or geometry.
    #[arg(long, default_value_t = Method::Auto)]
    method: Method,

    /// Pages like 1,3,5 or `all`.
    #[arg(long)]
    pages: Option<String>,

    /// Geometry flavor: stream or lattice.
    #[arg(long, default_value_t = Flavor::Stream)]
    flavor: Flavor,

    /// Vertical tolerance when grouping text into rows.
    #[arg(long)]
    row_tol: Option<f64>,

    /// Horizontal slack when assigning text to columns.
    #[arg(long)]
    column_tol: Option<f64>,

    /// Run both geometry flavors and keep the one with more columns.
    #[arg(long)]
    try_both_flavors: bool,

    /// Print table previews instead of writing files.
    #[arg(long)]
    preview: bool,

    /// Print previews as JSON.
    #[arg(long, requires = "preview")]
    json: bool,

    /// Name files `<base>--<suffix>_table<i>.csv`.
    #[arg(long)]
    custom_naming: bool,

    /// Suffix used with --custom-naming.
    #[arg(long, default_value = "appropriations-donations")]
    custom_suffix: String,

    #[command(flatten)]
    dirs: DirArgs,

    /// Directory receiving the CSV files.
    #[arg(long, env = "PDF2CSV_OUTPUT_DIR", default_value = "csv_output")]
    output_dir: PathBuf,

    /// Output delimiter character.
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// Log back-end decisions.
    #[arg(short, long)]
    verbose: bool,
}

enum Outcome {
    Tables,
    Empty,
}

fn find_pdfs(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(input_dir)
        .with_context(|| format!("failed to read input directory '{}'", input_dir.display()))?;

    let mut pdfs = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| extension.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            pdfs.push(path);
        }
    }
    pdfs.sort();
    Ok(pdfs)
}

fn resolve_pdf(pdf: &Path, input_dir: &Path) -> PathBuf {
    if pdf.is_file() {
        return pdf.to_path_buf();
    }
    match pdf.file_name() {
        Some(name) if input_dir.join(name).is_file() => {
            info!(path = %input_dir.join(name).display(), "using PDF from input directory");
            input_dir.join(name)
        }
        _ => pdf.to_path_buf(),
    }
}

fn base_name(pdf: &Path, output: Option<&str>) -> Result<String> {
    let source = output.map_or(pdf, Path::new);
    source
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("cannot derive an output name from '{}'", source.display()))
}

fn geometry_settings(args: &ExtractArgs) -> GeometrySettings {
    let defaults = GeometrySettings::default();
    GeometrySettings {
        row_tol: args.row_tol.unwrap_or(defaults.row_tol),
        column_tol: args.column_tol.unwrap_or(defaults.column_tol),
        ..defaults
    }
}

fn print_preview(result: &ExtractionResult, json: bool) -> Result<()> {
    let summaries = render(result, DEFAULT_PREVIEW_ROWS);
    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        for summary in &summaries {
            println!("{summary}");
        }
    }
    Ok(())
}

fn run_document(
    args: &ExtractArgs,
    pdf: &Path,
    output: Option<&str>,
    pages: Option<&str>,
) -> Result<Outcome> {
    let config = ExtractionConfig::new(pdf)
        .with_page_spec(pages)
        .context("failed to parse --pages")?
        .with_method(args.method)
        .with_flavor(args.flavor)
        .with_compare_flavors(args.try_both_flavors)
        .with_preview(args.preview)
        .with_geometry(geometry_settings(args));

    let result = extract(&config)
        .with_context(|| format!("failed to extract tables from '{}'", pdf.display()))?;
    if !result.is_success() {
        warn!(document = %pdf.display(), "no tables found");
        eprintln!("no tables found in '{}'", pdf.display());
        return Ok(Outcome::Empty);
    }

    if args.preview {
        print_preview(&result, args.json)?;
        return Ok(Outcome::Tables);
    }

    std::fs::create_dir_all(&args.output_dir).with_context(|| {
        format!(
            "failed to create output directory '{}'",
            args.output_dir.display()
        )
    })?;
    let options = WriteOptions {
        delimiter: args.delimiter as u8,
        naming: if args.custom_naming {
            Naming::Suffixed(args.custom_suffix.clone())
        } else {
            Naming::Plain
        },
    };
    let base = base_name(pdf, output)?;
    let written = write_with_options(&result, &base, &args.output_dir, &options)
        .with_context(|| format!("failed to write tables of '{}'", pdf.display()))?;

    println!(
        "extracted {} table(s) from '{}' into {} file(s)",
        result.table_count(),
        pdf.display(),
        written.len()
    );
    for path in &written {
        println!("  {}", path.display());
    }
    Ok(Outcome::Tables)
}

fn run_extract(args: &ExtractArgs) -> Result<Vec<Result<Outcome>>> {
    if !args.delimiter.is_ascii() {
        bail!("delimiter must be a single ASCII character");
    }

    let mut output = args.output.as_deref();
    let mut pages = args.pages.as_deref();
    if pages.is_none() && output.is_some_and(|value| PAGE_LIST.is_match(value)) {
        info!(pages = ?output, "treating OUTPUT as a page list");
        pages = output.take();
    }

    let documents = match &args.pdf {
        Some(pdf) => vec![resolve_pdf(pdf, &args.dirs.input_dir)],
        None => {
            let found = find_pdfs(&args.dirs.input_dir)?;
            if found.is_empty() {
                bail!("no PDF files found in '{}'", args.dirs.input_dir.display());
            }
            found
        }
    };

    Ok(documents
        .iter()
        .map(|pdf| run_document(args, pdf, output, pages))
        .collect())
}

fn run_list(args: &ListArgs) -> Result<()> {
    let pdfs = find_pdfs(&args.dirs.input_dir)?;
    if pdfs.is_empty() {
        eprintln!("no PDF files found in '{}'", args.dirs.input_dir.display());
    }
    for pdf in pdfs {
        println!("{}", pdf.display());
    }
    Ok(())
}

fn exit_code(outcomes: &[Result<Outcome>]) -> ExitCode {
    let mut failed = false;
    let mut empty = false;
    for outcome in outcomes {
        match outcome {
            Ok(Outcome::Tables) => {}
            Ok(Outcome::Empty) => empty = true,
            Err(error) => {
                eprintln!("error: {error:#}");
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::from(1)
    } else if empty {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    }
}

fn init_logging(verbose: bool) {
    let fallback = if verbose {
        "pdf_table_extract=info,pdf2csv=info"
    } else {
        "pdf_table_extract=warn,pdf2csv=warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Commands::Extract(args) => {
            init_logging(args.verbose);
            match run_extract(&args) {
                Ok(outcomes) => exit_code(&outcomes),
                Err(error) => {
                    eprintln!("error: {error:#}");
                    ExitCode::from(1)
                }
            }
        }
        Commands::List(args) => {
            init_logging(false);
            match run_list(&args) {
                Ok(()) => ExitCode::SUCCESS,
                Err(error) => {
                    eprintln!("error: {error:#}");
                    ExitCode::from(1)
                }
            }
        }
    }
}
