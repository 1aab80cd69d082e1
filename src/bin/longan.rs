//! Longan CLI entry point.

use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use clap::Parser;
use log::{LevelFilter, error, info};

use longan::ConvertOptions;

/// Convert Markdown files to PowerPoint presentations.
#[derive(Debug, Parser)]
#[command(name = "longan", version, about)]
struct Args {
    /// Path to the Markdown file
    #[arg(short, long)]
    markdown: PathBuf,

    /// Path to a PowerPoint template file
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Output PowerPoint file path (defaults to the input with .pptx)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// DPI for rendered diagrams
    #[arg(long, default_value_t = 150)]
    dpi: u32,

    /// Mermaid CLI executable
    #[arg(long, default_value = "mmdc")]
    mermaid_command: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using 'info' instead.", args.log_level);
        LevelFilter::Info
    });
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    let mut options = ConvertOptions::new()
        .with_dpi(args.dpi)
        .with_mermaid_command(args.mermaid_command);
    if let Some(template) = args.template {
        options = options.with_template(template);
    }
    if let Some(output) = args.output {
        options = options.with_output(output);
    }

    match longan::convert_file(&args.markdown, &options) {
        Ok(output) => {
            info!("conversion finished");
            println!("Successfully created: {}", output.display());
        }
        Err(err) => {
            error!("conversion failed: {err}");
            process::exit(1);
        }
    }
}
