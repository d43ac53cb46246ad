use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;

use iflow_generator::config::GeneratorConfig;
use iflow_generator::docs::DocFormat;
use iflow_generator::domain::iflow::Iflow;
use iflow_generator::package::IflowPackage;
use iflow_generator::{document_bpml_file, logger};

#[derive(Parser)]
#[command(author, version, about = "Generates SAP Integration Suite iFlow packages from metadata JSON", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the iFlow package for a metadata file
    Generate {
        /// Metadata JSON describing the flow
        metadata: PathBuf,
        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
        /// Generator config JSON (package defaults, layout grid)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write the project as a directory tree instead of a zip archive
        #[arg(long)]
        unpacked: bool,
    },
    /// Check a metadata file without writing anything
    Validate {
        metadata: PathBuf,
    },
    /// Document a Sterling BPML business process
    Document {
        bpml: PathBuf,
        /// Output file, stdout when absent
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Emit JSON instead of Markdown
        #[arg(long)]
        json: bool,
    },
}

fn print_summary(iflow: &Iflow) {
    println!("{} {} ({})", "iFlow".bold(), iflow.info.name.cyan(), iflow.info.id);
    println!("  participants:   {}", iflow.participants.len());
    println!("  components:     {}", iflow.components.len());
    println!("  end events:     {}", iflow.end_events.len());
    println!("  sequence flows: {}", iflow.sequence_flows.len());
    println!("  message flows:  {}", iflow.message_flows.len());
    println!("  parameters:     {}", iflow.parameters.len());
    println!("  resources:      {}", iflow.resources().len());
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate { metadata, output, config, unpacked } => {
            let config = GeneratorConfig::load(config.as_deref()).context("Failed to load generator config")?;
            let iflow = Iflow::load(&metadata)
                .with_context(|| format!("Failed to build iFlow from '{}'", metadata.display()))?;
            print_summary(&iflow);

            let package = IflowPackage::build(&iflow, &config).context("Failed to assemble the package")?;
            let result = if unpacked { package.write_dir(&output) } else { package.write_to_file(&output) };
            let written = result.with_context(|| format!("Failed to write package to '{}'", output.display()))?;
            println!("{} {}", "Generated".green().bold(), written.display());
        }
        Commands::Validate { metadata } => {
            let iflow = Iflow::load(&metadata)
                .with_context(|| format!("'{}' is not a valid iFlow description", metadata.display()))?;
            print_summary(&iflow);
            println!("{}", "Valid".green().bold());
        }
        Commands::Document { bpml, output, json } => {
            let format = if json { DocFormat::Json } else { DocFormat::Markdown };
            let rendered = document_bpml_file(&bpml, format)
                .with_context(|| format!("Failed to document '{}'", bpml.display()))?;
            match output {
                Some(path) => {
                    fs::write(&path, rendered).with_context(|| format!("Failed to write '{}'", path.display()))?;
                    println!("{} {}", "Documented".green().bold(), path.display());
                }
                None => print!("{}", rendered),
            }
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    logger::init();
    log::info!("Logger initialized. Starting iflow_generator.");

    let cli = Cli::parse();
    run(cli).inspect_err(|e| log::error!("{:#}", e))
}
