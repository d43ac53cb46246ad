use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse metadata JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("XML processing failed: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("Failed to write package archive: {0}")]
    ArchiveError(#[from] zip::result::ZipError),

    #[error("Failed to build iFlow model: {0}")]
    ModelConstructionError(String),

    #[error("Sequence flow '{flow}' references unknown component '{id}'")]
    UnknownComponentReference { flow: String, id: String },

    #[error("Component '{component}' references unknown receiver endpoint '{id}'")]
    UnknownEndpointReference { component: String, id: String },

    #[error("Duplicate id '{0}' in metadata")]
    DuplicateId(String),

    #[error("Component '{id}' has unsupported type '{type_name}'")]
    InvalidComponentType { id: String, type_name: String },

    #[error("Endpoint '{endpoint}' uses adapter '{adapter}' which is not available as a {role}")]
    UnsupportedAdapter { endpoint: String, adapter: String, role: String },

    #[error("Component '{id}' is missing required config '{key}'")]
    MissingConfig { id: String, key: String },

    #[error("Invalid flow graph: {0}")]
    GraphInvariant(String),

    #[error("Failed to parse BPML document: {0}")]
    BpmlParseError(String),
}

pub type Result<T> = std::result::Result<T, Error>;
