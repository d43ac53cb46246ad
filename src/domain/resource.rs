use crate::error::{Error, Result};

/// Resource folders of an iFlow project, below `src/main/resources`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceFolder {
    Script,
    Mapping,
    Xsd,
    Wsdl,
}

impl ResourceFolder {
    pub fn path(&self) -> &'static str {
        match self {
            ResourceFolder::Script => "src/main/resources/script",
            ResourceFolder::Mapping => "src/main/resources/mapping",
            ResourceFolder::Xsd => "src/main/resources/xsd",
            ResourceFolder::Wsdl => "src/main/resources/wsdl",
        }
    }

    pub fn all() -> [ResourceFolder; 4] {
        [ResourceFolder::Script, ResourceFolder::Mapping, ResourceFolder::Xsd, ResourceFolder::Wsdl]
    }
}

/// A file shipped inside the package next to the iFlow (script, mapping, schema, WSDL).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub folder: ResourceFolder,
    pub file_name: String,
    pub content: String,
}

impl Resource {
    pub fn new(folder: ResourceFolder, file_name: impl Into<String>, content: impl Into<String>) -> Self {
        Resource { folder, file_name: file_name.into(), content: content.into() }
    }

    pub fn package_path(&self) -> String {
        format!("{}/{}", self.folder.path(), self.file_name)
    }
}

/// Checks a user supplied resource file name. It must be a single path
/// segment so the file lands inside its resource folder.
pub fn checked_file_name(owner: &str, name: &str) -> Result<String> {
    let name = name.trim();
    let invalid = name.is_empty()
        || name.contains("..")
        || name.contains(['/', '\\', ':'])
        || name.chars().any(char::is_control);
    if invalid {
        log::error!("'{}' uses invalid resource file name '{}'.", owner, name);
        return Err(Error::ModelConstructionError(format!(
            "'{}' uses invalid resource file name '{}'",
            owner, name
        )));
    }
    Ok(name.to_string())
}
