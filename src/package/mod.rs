//! Assembles the importable iFlow project: manifest, project files, the
//! `.iflw` document, parameters and shipped resources.

pub mod manifest;
pub mod project_files;

use std::fs;
use std::io::{Seek, Write};
use std::path::{Component, Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::config::GeneratorConfig;
use crate::domain::iflow::Iflow;
use crate::domain::layout;
use crate::domain::resource::ResourceFolder;
use crate::error::{Error, Result};
use crate::generator::write_iflow;

pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";
pub const IFLOW_FOLDER: &str = "src/main/resources/scenarioflows/integrationflow";
pub const PARAMETERS_PROP_PATH: &str = "src/main/resources/parameters.prop";
pub const PARAMETERS_PROPDEF_PATH: &str = "src/main/resources/parameters.propdef";

#[derive(Debug, Clone, PartialEq)]
pub struct PackageEntry {
    /// Forward slash separated path inside the archive.
    pub path: String,
    pub content: Vec<u8>,
}

/// In-memory iFlow project, written out as a zip archive or a directory tree.
#[derive(Debug, Clone)]
pub struct IflowPackage {
    pub iflow_id: String,
    pub entries: Vec<PackageEntry>,
}

impl IflowPackage {
    pub fn build(iflow: &Iflow, config: &GeneratorConfig) -> Result<IflowPackage> {
        let timestamp = chrono::Local::now().format("%a %b %d %H:%M:%S %Z %Y").to_string();
        let diagram = layout::compute(iflow, &config.layout);

        let mut package = IflowPackage { iflow_id: iflow.info.id.clone(), entries: Vec::new() };

        package.push(MANIFEST_PATH, manifest::render(&manifest::headers(iflow, config)));
        package.push(".project", project_files::project_file(iflow)?);
        package.push("metainfo.prop", project_files::metainfo_prop(iflow, &timestamp));
        let iflow_path = package.iflow_path();
        package.push(&iflow_path, write_iflow(iflow, &diagram, config)?);
        package.push(PARAMETERS_PROP_PATH, project_files::parameters_prop(&iflow.parameters, &timestamp));
        package.push(PARAMETERS_PROPDEF_PATH, project_files::parameters_propdef(&iflow.parameters)?);

        for resource in iflow.resources() {
            package.push(&resource.package_path(), resource.content.clone());
        }

        log::debug!("Package '{}' holds {} files.", package.iflow_id, package.entries.len());
        Ok(package)
    }

    fn push(&mut self, path: &str, content: impl Into<Vec<u8>>) {
        self.entries.push(PackageEntry { path: path.to_string(), content: content.into() });
    }

    pub fn iflow_path(&self) -> String {
        format!("{}/{}.iflw", IFLOW_FOLDER, self.iflow_id)
    }

    pub fn archive_name(&self) -> String {
        format!("{}.zip", self.iflow_id)
    }

    pub fn entry(&self, path: &str) -> Option<&PackageEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    /// Writes the archive with fixed timestamps so equal input gives equal bytes.
    pub fn write_zip<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());

        for folder in ResourceFolder::all() {
            zip.add_directory(format!("{}/", folder.path()), options)?;
        }
        for entry in &self.entries {
            check_entry_path(&entry.path)?;
            zip.start_file(entry.path.as_str(), options)?;
            zip.write_all(&entry.content)?;
        }

        Ok(zip.finish()?)
    }

    /// Writes `<dir>/<id>.zip` and returns its path.
    pub fn write_to_file(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(self.archive_name());
        let file = fs::File::create(&path)?;
        self.write_zip(file)?;
        log::info!("Wrote package '{}'.", path.display());
        Ok(path)
    }

    /// Writes the unpacked project below `<dir>/<id>/` and returns that directory.
    pub fn write_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let root = dir.as_ref().join(&self.iflow_id);
        for folder in ResourceFolder::all() {
            fs::create_dir_all(root.join(folder.path()))?;
        }
        for entry in &self.entries {
            let path = root.join(check_entry_path(&entry.path)?);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, &entry.content)?;
        }
        log::info!("Wrote unpacked project '{}'.", root.display());
        Ok(root)
    }
}

/// Entry paths must be relative and must not climb out of the package root.
fn check_entry_path(path: &str) -> Result<&Path> {
    let relative = Path::new(path);
    if !path.is_empty() && relative.components().all(|c| matches!(c, Component::Normal(_))) {
        return Ok(relative);
    }
    log::error!("Package entry '{}' is not a plain relative path.", path);
    Err(Error::ModelConstructionError(format!("package entry '{}' escapes the package root", path)))
}
