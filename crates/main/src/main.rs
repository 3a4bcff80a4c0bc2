use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use invoice_composer::format;
use invoice_composer::model::InvoiceBundle;
use invoice_composer::pricing::Pricing;
use invoice_composer::{ComposeError, DocumentComposer};

/// Renders invoice bundles to PDF from the command line.
///
/// A bundle is a JSON file shaped like `{"invoice": {...}, "user": {...},
/// "client": {...}}`.  Fonts are looked up in `--fonts-dir`, then
/// `INVOICE_COMPOSER_FONTS_DIR`, then `assets/fonts`, falling back to a
/// system sans-serif family.  Set `RUST_LOG=debug` to trace layout decisions.
#[derive(Parser)]
#[command(author, version, about = "Render invoice records to PDF")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the invoice to `<out-dir>/Invoice-<number>.pdf` and print the path.
    Render {
        #[command(flatten)]
        input: InputArgs,

        /// Directory the PDF is written to.
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Print the invoice as a base64 encoded PDF.
    Encode {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Print classified line items and totals without rendering.
    Summary {
        /// Path to the invoice bundle JSON file.
        bundle: PathBuf,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Path to the invoice bundle JSON file.
    bundle: PathBuf,

    /// Directory containing the Roboto font files.
    #[arg(long, env = "INVOICE_COMPOSER_FONTS_DIR")]
    fonts_dir: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Render { input, out_dir } => render(&input, &out_dir),
        Commands::Encode { input } => encode(&input),
        Commands::Summary { bundle } => summary(&bundle),
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        print_error_sources(&err);
        std::process::exit(1);
    }
}

fn load_bundle(path: &Path) -> Result<InvoiceBundle, ComposeError> {
    let text = fs::read_to_string(path).map_err(|source| ComposeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("loaded invoice bundle from {}", path.display());
    Ok(InvoiceBundle::from_json(&text)?)
}

fn composer(input: &InputArgs) -> DocumentComposer {
    DocumentComposer::new().with_fonts_dir(input.fonts_dir.clone())
}

fn render(input: &InputArgs, out_dir: &Path) -> Result<(), ComposeError> {
    let bundle = load_bundle(&input.bundle)?;
    let path = composer(input).render_to_file(
        &bundle.record,
        bundle.business.as_ref(),
        bundle.client.as_ref(),
        out_dir,
    )?;
    println!("{}", path.display());
    Ok(())
}

fn encode(input: &InputArgs) -> Result<(), ComposeError> {
    let bundle = load_bundle(&input.bundle)?;
    let encoded = composer(input).render_to_encoded_string(
        &bundle.record,
        bundle.business.as_ref(),
        bundle.client.as_ref(),
    )?;
    println!("{}", encoded);
    Ok(())
}

fn summary(path: &Path) -> Result<(), ComposeError> {
    let bundle = load_bundle(path)?;
    let pricing = Pricing::from_record(&bundle.record);

    println!(
        "Invoice {}",
        bundle.record.invoice_number().unwrap_or("Draft")
    );
    for bucket in pricing.buckets() {
        if bucket.is_empty() {
            continue;
        }
        println!("{}", bucket.kind().heading());
        for item in bucket.items() {
            println!(
                "  {:<40} {:>8} x {:>12} = {:>12}",
                item.description,
                format::quantity(item.quantity),
                format::currency(item.rate),
                format::currency(item.amount)
            );
        }
        println!(
            "  {} {}",
            bucket.kind().subtotal_label(),
            format::currency(bucket.subtotal())
        );
    }

    let totals = pricing.totals();
    println!("Subtotal: {}", format::currency(totals.subtotal));
    if totals.shows_tax() {
        println!("Tax: {}", format::currency(totals.tax));
    }
    println!("TOTAL: {}", format::currency(totals.total));
    Ok(())
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
