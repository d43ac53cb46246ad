use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::metadata_dto::IflowMetadataDto;
use crate::error::{Error, Result};

/// Component config keys that point at a file next to the metadata JSON,
/// paired with the key their content is loaded into.
const COMPONENT_RESOURCE_KEYS: &[(&str, &str)] = &[
    ("script_path", "script_content"),
    ("mapping_path", "mapping_content"),
];

/// Parses a JSON file into a given type `T`.
///
/// Errors are automatically converted into `crate::error::Error` variants:
/// - `Error::IoError` if the file cannot be read.
/// - `Error::DeserializationError` if the JSON is malformed.
pub fn parse_json_file<T: DeserializeOwned>(file_path: impl AsRef<Path>) -> Result<T> {
    let data = fs::read_to_string(file_path.as_ref())?;
    parse_json_str(&data)
}

pub fn parse_json_str<T: DeserializeOwned>(data: &str) -> Result<T> {
    let parsed_data: T = serde_json::from_str(data)?;
    Ok(parsed_data)
}

/// Reads a resource file referenced from the metadata, relative to `base_dir`.
pub fn read_resource(base_dir: &Path, relative: &str) -> Result<String> {
    let path: PathBuf = base_dir.join(relative);
    fs::read_to_string(&path).map_err(|e| {
        log::error!("Resource '{}' could not be read: {}", path.display(), e);
        Error::IoError(e)
    })
}

/// Replaces every `*_path` reference in the metadata with the file content.
///
/// Inline `*_content` always wins over a path. Paths are resolved against
/// `base_dir`, normally the directory holding the metadata JSON.
pub fn resolve_resource_paths(dto: &mut IflowMetadataDto, base_dir: &Path) -> Result<()> {
    for component in &mut dto.components {
        let Value::Object(config) = &mut component.config else {
            continue;
        };

        for (path_key, content_key) in COMPONENT_RESOURCE_KEYS {
            if config.get(*content_key).is_some_and(|v| !v.is_null()) {
                continue;
            }
            if let Some(Value::String(relative)) = config.get(*path_key) {
                let content = read_resource(base_dir, relative)?;
                log::debug!("Loaded '{}' for component '{}'.", relative, component.id);
                config.insert(content_key.to_string(), Value::String(content));
            }
        }
    }

    for endpoint in &mut dto.endpoints {
        if endpoint.wsdl_content.is_none() {
            if let Some(relative) = &endpoint.wsdl_path {
                endpoint.wsdl_content = Some(read_resource(base_dir, relative)?);
            }
        }
        if endpoint.schema_content.is_none() {
            if let Some(relative) = &endpoint.schema_path {
                endpoint.schema_content = Some(read_resource(base_dir, relative)?);
            }
        }
    }

    Ok(())
}
