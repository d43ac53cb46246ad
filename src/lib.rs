use std::path::Path;

use crate::config::GeneratorConfig;
use crate::docs::DocFormat;
use crate::domain::iflow::Iflow;
use crate::error::Result;
use crate::package::IflowPackage;

pub mod api;
pub mod config;
pub mod docs;
pub mod domain;
pub mod error;
pub mod generator;
pub mod loader;
pub mod logger;
pub mod package;

/// Loads a metadata JSON file and builds the complete iFlow package in memory.
pub fn generate_iflow_package(file_path: impl AsRef<Path>, config: &GeneratorConfig) -> Result<IflowPackage> {
    let iflow = Iflow::load(file_path)?;

    let package = IflowPackage::build(&iflow, config)?;
    log::info!("iFlow package '{}' assembled ({} files).", package.iflow_id, package.entries.len());

    Ok(package)
}

/// Parses a BPML file and renders its documentation.
pub fn document_bpml_file(file_path: impl AsRef<Path>, format: DocFormat) -> Result<String> {
    let process = docs::parse_bpml_file(file_path)?;
    match format {
        DocFormat::Markdown => Ok(process.to_markdown()),
        DocFormat::Json => process.to_json(),
    }
}
