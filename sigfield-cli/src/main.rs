mod config;
mod fixtures;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use config::FixtureConfig;
use serde::Serialize;
use sigfield::{collect_signature_fields, copy_pages, BaseDocument, PdfReader, Rectangle};
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "sigfield")]
#[command(about = "Generate PDF fixtures with signature placeholder fields", long_about = None)]
#[command(version)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the no-field, single-field and multi-field fixtures
    Generate {
        /// JSON layout file (defaults to the built-in layout)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory the output paths are resolved against
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
    },

    /// Copy a PDF and add an unsigned signature field to one of its pages
    ///
    /// Fields the input already registers are kept, and the new name must not
    /// clash with them. Only inputs with a classic cross-reference table are
    /// read: files that store it as a cross-reference stream (usual for
    /// PDF 1.5 and later producers) are rejected.
    AddField {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file
        #[arg(short, long)]
        output: PathBuf,

        /// Field name
        #[arg(short, long)]
        name: String,

        /// Field rectangle as left,bottom,right,top in points
        #[arg(short, long, value_parser = parse_rect, allow_hyphen_values = true)]
        rect: Rectangle,

        /// Zero-based page index
        #[arg(short, long, default_value_t = 0)]
        page: usize,
    },

    /// List the signature fields of a PDF
    ///
    /// Reads classic cross-reference tables only; cross-reference streams
    /// are rejected.
    Inspect {
        /// Input PDF file
        input: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the built-in fixture layout as JSON
    DefaultConfig,
}

#[derive(Serialize)]
struct FieldReport {
    name: String,
    page_index: Option<usize>,
    rect: Option<[f64; 4]>,
    widgets: usize,
    signed: bool,
}

fn parse_rect(value: &str) -> std::result::Result<Rectangle, String> {
    let coords = value
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid number in {value:?}: {e}"))?;
    match coords[..] {
        [left, bottom, right, top] => Ok(Rectangle::from_coords(left, bottom, right, top)),
        _ => Err(format!(
            "expected left,bottom,right,top, got {} values",
            coords.len()
        )),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "sigfield=debug,sigfield_cli=debug"
    } else {
        "sigfield=info,sigfield_cli=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Generate { config, root } => {
            let config = match config {
                Some(path) => FixtureConfig::load(&path)?,
                None => FixtureConfig::default(),
            };
            let report = fixtures::generate(&config, &root)?;

            for path in &report.written {
                println!("✓ {}", path.display());
            }
            for (path, reason) in &report.failed {
                eprintln!("✗ {}: {reason}", path.display());
            }
            if !report.is_success() {
                bail!(
                    "{} of {} fixtures could not be written",
                    report.failed.len(),
                    report.written.len() + report.failed.len()
                );
            }
        }

        Commands::AddField {
            input,
            output,
            name,
            rect,
            page,
        } => {
            let base = BaseDocument::open(&input)
                .with_context(|| format!("opening {}", input.display()))?;
            let mut doc = copy_pages(&base)?;
            if let Some(title) = base.reader().info().and_then(|info| info.get_string("Title")) {
                doc.set_title(title);
            }
            doc.add_signature_field(&name, rect, page)?;
            doc.save(&output)?;
            println!("✓ Added signature field {name} to page {page} of {}", output.display());
        }

        Commands::Inspect { input, json } => {
            let reader = PdfReader::open(&input)
                .with_context(|| format!("opening {}", input.display()))?;
            let fields: Vec<FieldReport> = collect_signature_fields(&reader)?
                .into_iter()
                .map(|field| FieldReport {
                    name: field.name,
                    page_index: field.page_index,
                    rect: field.rect.map(|rect| rect.to_array()),
                    widgets: field.widget_count,
                    signed: field.signed,
                })
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&fields)?);
            } else if fields.is_empty() {
                println!("No signature fields in {}", input.display());
            } else {
                println!("Signature fields in {}:", input.display());
                for field in &fields {
                    let page = field
                        .page_index
                        .map_or_else(|| "?".to_string(), |index| index.to_string());
                    let rect = field.rect.map_or_else(
                        || "no rectangle".to_string(),
                        |[l, b, r, t]| format!("[{l} {b} {r} {t}]"),
                    );
                    let state = if field.signed { "signed" } else { "unsigned" };
                    println!("  {} (page {page}) {rect} {state}", field.name);
                }
            }
        }

        Commands::DefaultConfig => {
            println!("{}", FixtureConfig::default().to_json()?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rect() {
        let rect = parse_rect("61.2, 79.2,306,158.4").unwrap();
        assert_eq!(rect, Rectangle::from_coords(61.2, 79.2, 306.0, 158.4));
        assert!(parse_rect("1,2,3").is_err());
        assert!(parse_rect("1,2,x,4").is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
