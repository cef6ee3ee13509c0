//! folio-dump - Interpret a raw PDF content stream
//!
//! Reads a decoded page content stream, replays it against an optional
//! resource dictionary and prints what the page draws.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, ValueEnum};
use folio_core::geometry::Rectangle;
use folio_core::interp::{Token, tokenize};
use folio_core::model::{Dictionary, Object};
use folio_core::{PageContent, PageSetup, ParsingOptions, ScopedResources, process_page};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "FOLIO_LOG";

/// Output format for the interpreted page.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputType {
    /// Full page content as JSON (default)
    #[default]
    Json,
    /// Extracted text only
    Text,
    /// Object counts and text as JSON
    Summary,
}

/// Interpret a PDF page content stream and dump letters, paths, images
/// and marked content.
#[derive(Parser, Debug)]
#[command(name = "folio-dump")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Decoded content stream to interpret
    content: PathBuf,

    /// Page resource dictionary, written in PDF syntax (`<< /Font << ... >> >>`)
    #[arg(short = 'r', long)]
    resources: Option<PathBuf>,

    /// Use debug logging level
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,

    /// Output file name ("-" for stdout)
    #[arg(short = 'o', long, default_value = "-")]
    outfile: String,

    /// Output format
    #[arg(short = 't', long = "output-type", value_enum, default_value_t = OutputType::Json)]
    output_type: OutputType,

    // === Page options ===
    /// Crop box as four numbers: x0 y0 x1 y1
    #[arg(long = "crop-box", num_args = 4, value_names = ["X0", "Y0", "X1", "Y1"], allow_negative_numbers = true)]
    crop_box: Option<Vec<f64>>,

    /// Page rotation in degrees (a multiple of 90)
    #[arg(short = 'R', long, default_value = "0", allow_negative_numbers = true)]
    rotation: i64,

    /// Page user unit
    #[arg(long = "user-unit", default_value = "1.0")]
    user_unit: f64,

    /// Page number reported in diagnostics
    #[arg(short = 'p', long = "page-number", default_value = "1")]
    page_number: usize,

    // === Interpreter options ===
    /// Log and skip operators naming missing resources
    #[arg(short = 'S', long = "skip-missing", action = ArgAction::SetTrue)]
    skip_missing: bool,

    /// Do not intersect painted paths with the clipping path
    #[arg(long = "no-clip", action = ArgAction::SetTrue)]
    no_clip: bool,

    /// Keep combining marks as separate letters
    #[arg(long = "no-combine-diacritics", action = ArgAction::SetTrue)]
    no_combine_diacritics: bool,

    /// Deepest allowed chain of nested form XObjects
    #[arg(long = "max-form-depth", default_value = "32")]
    max_form_depth: usize,
}

#[derive(Debug, Serialize)]
struct Summary<'a> {
    letters: usize,
    paths: usize,
    images: usize,
    xobjects: usize,
    marked_content: usize,
    text: &'a str,
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Reads a resource dictionary written in content-stream syntax.
fn load_resources(path: &Path) -> Result<Dictionary> {
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    match tokenize(data).into_iter().next() {
        Some(Token::Operand(Object::Dict(dict))) => Ok(dict),
        Some(other) => bail!(
            "{}: expected a dictionary, found {:?}",
            path.display(),
            other
        ),
        None => Ok(Dictionary::new()),
    }
}

fn page_setup(args: &Args) -> Result<PageSetup> {
    let crop_box = match args.crop_box.as_deref() {
        None => Rectangle::new(0.0, 0.0, 612.0, 792.0),
        Some(&[x0, y0, x1, y1]) => Rectangle::new(x0, y0, x1, y1),
        Some(other) => bail!("--crop-box takes four numbers, got {}", other.len()),
    };
    Ok(PageSetup::new(crop_box, args.rotation, args.user_unit).with_page_number(args.page_number))
}

fn write_output(out: &mut dyn Write, page: &PageContent, output_type: OutputType) -> Result<()> {
    match output_type {
        OutputType::Json => serde_json::to_writer_pretty(&mut *out, page)?,
        OutputType::Text => out.write_all(page.text().as_bytes())?,
        OutputType::Summary => {
            let text = page.text();
            let summary = Summary {
                letters: page.letters.len(),
                paths: page.paths.len(),
                images: page.images.len(),
                xobjects: page.xobjects.len(),
                marked_content: page.marked_content.len(),
                text: &text,
            };
            serde_json::to_writer_pretty(&mut *out, &summary)?;
        }
    }
    writeln!(out)?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let content = fs::read(&args.content)
        .with_context(|| format!("reading {}", args.content.display()))?;
    let page_resources = match &args.resources {
        Some(path) => load_resources(path)?,
        None => Dictionary::new(),
    };
    let setup = page_setup(&args)?;
    let options = ParsingOptions::new()
        .with_skip_missing_resources(args.skip_missing)
        .with_clip_paths(!args.no_clip)
        .with_combine_diacritics(!args.no_combine_diacritics)
        .with_max_form_depth(args.max_form_depth);
    debug!(?options, page = setup.page_number, "interpreting");

    let mut resources = ScopedResources::new(page_resources);
    let page = process_page(&content, setup, &mut resources, options)
        .with_context(|| format!("interpreting {}", args.content.display()))?;
    info!(
        letters = page.letters.len(),
        paths = page.paths.len(),
        images = page.images.len(),
        "page done"
    );

    let mut output: Box<dyn Write> = if args.outfile == "-" {
        Box::new(BufWriter::new(io::stdout()))
    } else {
        let file = File::create(&args.outfile)
            .with_context(|| format!("creating output file {}", args.outfile))?;
        Box::new(BufWriter::new(file))
    };
    write_output(&mut *output, &page, args.output_type)?;
    output.flush()?;
    Ok(())
}
