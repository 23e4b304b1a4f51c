//! quire - Render compiled books to PDF, DOCX, HTML or Markdown

use std::fs::{self, File};
use std::io::BufWriter;
use std::process::ExitCode;

use clap::Parser;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use quire::{
    CompiledContent, DocxConfig, DocxExporter, Exporter, Format, HtmlConfig, HtmlExporter,
    Manuscript, Markup, MarkdownConfig, MarkdownExporter, PdfConfig, PdfExporter,
};

#[derive(Parser)]
#[command(name = "quire")]
#[command(version, about = "Render compiled books", long_about = None)]
#[command(after_help = "EXAMPLES:
    quire book.json book.pdf               Render to PDF
    quire book.json book.docx              Render to DOCX
    quire book.json out.txt -f markdown    Render plain text
    quire -i book.json                     Show title, author and contents")]
struct Cli {
    /// Compiled content (JSON)
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output file (PDF, DOCX, HTML or MD)
    #[arg(value_name = "OUTPUT", required_unless_present = "info")]
    output: Option<String>,

    /// Output format, when the extension does not say
    #[arg(short, long, value_name = "FORMAT")]
    format: Option<Format>,

    /// Exporter options (JSON, keyed by format: pdf, docx, html, markdown)
    #[arg(short, long, value_name = "FILE")]
    options: Option<String>,

    /// Show book contents without rendering
    #[arg(short, long)]
    info: bool,

    /// Suppress output messages
    #[arg(short, long)]
    quiet: bool,
}

/// Per-format exporter settings read from `--options`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Options {
    pdf: PdfConfig,
    docx: DocxConfig,
    html: HtmlConfig,
    markdown: MarkdownConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.quiet { "error" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match (&cli.output, cli.info) {
        (_, true) => show_info(&cli.input),
        (Some(output), false) => render(&cli, output),
        (None, false) => Err("output required".to_string()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load(path: &str) -> Result<CompiledContent, String> {
    let raw = fs::read_to_string(path).map_err(|e| format!("{path}: {e}"))?;
    serde_json::from_str(&raw).map_err(|e| format!("{path}: {e}"))
}

fn show_info(path: &str) -> Result<(), String> {
    let content = load(path)?;
    let manuscript = Manuscript::prepare(&content, Markup::Plain).map_err(|e| e.to_string())?;

    println!("File: {path}");
    println!("Title: {}", manuscript.title);
    println!("Author: {}", manuscript.author);
    println!("Chapters: {}", manuscript.chapters().count());
    println!("TOC entries: {}", manuscript.toc.len());
    for (i, entry) in manuscript.toc.iter().enumerate() {
        println!("  {:>3}. {}", i + 1, entry.title);
    }
    println!("Images: {}", manuscript.images.len());
    if !manuscript.warnings.is_empty() {
        println!("Dropped: {}", manuscript.warnings.len());
    }

    Ok(())
}

fn render(cli: &Cli, output: &str) -> Result<(), String> {
    let format = cli
        .format
        .or_else(|| Format::from_path(output))
        .ok_or_else(|| format!("cannot tell the format of {output}; use --format"))?;

    let options = match &cli.options {
        Some(path) => {
            let raw = fs::read_to_string(path).map_err(|e| format!("{path}: {e}"))?;
            serde_json::from_str::<Options>(&raw).map_err(|e| format!("{path}: {e}"))?
        }
        None => Options::default(),
    };

    let content = load(&cli.input)?;
    let file = File::create(output).map_err(|e| format!("{output}: {e}"))?;
    let mut writer = BufWriter::new(file);

    let result = match format {
        Format::Pdf => PdfExporter::with_config(options.pdf).export(&content, &mut writer),
        Format::Docx => DocxExporter::with_config(options.docx).export(&content, &mut writer),
        Format::Html => HtmlExporter::with_config(options.html).export(&content, &mut writer),
        Format::Markdown => {
            MarkdownExporter::with_config(options.markdown).export(&content, &mut writer)
        }
    };

    if let Err(e) = result {
        drop(writer);
        // No partial documents.
        let _ = fs::remove_file(output);
        return Err(e.to_string());
    }
    writer
        .into_inner()
        .map_err(|e| format!("{output}: {}", e.error()))?;

    if !cli.quiet {
        eprintln!("{} -> {output} ({format})", cli.input);
    }
    Ok(())
}
