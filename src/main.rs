mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use discref::diagnostics;

#[derive(Parser)]
#[command(name = "discref", version, about = "Build dvdauthor documents with resolved navigation references")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the document and run the authoring tool
    Build {
        /// Project file describing the disc
        project: PathBuf,
        /// Directory the disc image is written to
        #[arg(short, long, default_value = "dvd")]
        output: PathBuf,
        /// Where to write the document (default: <output>/dvdauthor.xml)
        #[arg(long)]
        xml: Option<PathBuf>,
    },
    /// Print the resolved document
    Render {
        /// Project file describing the disc
        project: PathBuf,
        /// Directory named in the document's `dest` attribute
        #[arg(short, long, default_value = "dvd")]
        output: PathBuf,
    },
    /// Show the address each project id resolves to
    Addresses {
        /// Project file describing the disc
        project: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Build { project, output, xml } => commands::build(&project, &output, xml.as_deref()),
        Commands::Render { project, output } => commands::render(&project, &output),
        Commands::Addresses { project, json } => commands::addresses(&project, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::FAILURE
        },
    }
}
