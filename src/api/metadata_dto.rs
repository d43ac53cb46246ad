use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Root of the metadata JSON describing a single integration flow.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct IflowMetadataDto {
    pub iflow_info: IflowInfoDto,

    #[serde(default)]
    pub endpoints: Vec<EndpointDto>,

    #[serde(default)]
    pub components: Vec<ComponentDto>,

    /// When empty, components are chained in declaration order.
    #[serde(default)]
    pub sequence_flows: Vec<SequenceFlowDto>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct IflowInfoDto {
    pub name: String,

    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub version: Option<String>,

    /// Only used when the flow has no sender endpoint.
    #[serde(default)]
    pub schedule: Option<ScheduleDto>,

    /// Default values for externalized `{{Name}}` parameters.
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScheduleDto {
    Once,
    Interval { minutes: u32 },
    Cron { expression: String },
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EndpointRoleDto {
    Sender,
    Receiver,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EndpointDto {
    pub id: String,
    pub role: EndpointRoleDto,

    #[serde(default)]
    pub name: Option<String>,

    pub adapter: String,

    #[serde(default)]
    pub properties: BTreeMap<String, Value>,

    #[serde(default)]
    pub wsdl_file: Option<String>,
    #[serde(default)]
    pub wsdl_content: Option<String>,
    #[serde(default)]
    pub wsdl_path: Option<String>,

    #[serde(default)]
    pub schema_file: Option<String>,
    #[serde(default)]
    pub schema_content: Option<String>,
    #[serde(default)]
    pub schema_path: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ComponentDto {
    pub id: String,

    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default)]
    pub name: Option<String>,

    /// Type specific settings, decoded into one of the `*ConfigDto` structs below.
    #[serde(default)]
    pub config: Value,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SequenceFlowDto {
    #[serde(default)]
    pub id: Option<String>,

    pub source: String,
    pub target: String,

    #[serde(default)]
    pub name: Option<String>,

    /// Route condition; only meaningful on flows leaving a router.
    #[serde(default)]
    pub condition: Option<String>,

    #[serde(default)]
    pub default: bool,
}

// --- Per component type configuration ---

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ContentModifierConfigDto {
    #[serde(default)]
    pub headers: Vec<TableEntryDto>,

    #[serde(default)]
    pub properties: Vec<TableEntryDto>,

    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TableEntryDto {
    pub name: String,

    /// `constant`, `expression`, `header`, `property`, `xpath`, ...
    #[serde(rename = "type", default = "default_table_entry_type")]
    pub value_type: String,

    #[serde(default)]
    pub value: String,

    #[serde(default)]
    pub datatype: Option<String>,

    #[serde(default)]
    pub default: Option<String>,
}

fn default_table_entry_type() -> String {
    "constant".to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ScriptConfigDto {
    #[serde(default)]
    pub script_file: Option<String>,

    #[serde(default)]
    pub script_content: Option<String>,

    #[serde(default)]
    pub script_path: Option<String>,

    #[serde(default)]
    pub function: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct MappingConfigDto {
    #[serde(default)]
    pub mapping_name: Option<String>,

    #[serde(default)]
    pub mapping_content: Option<String>,

    #[serde(default)]
    pub mapping_path: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct FilterConfigDto {
    #[serde(default)]
    pub xpath: Option<String>,

    #[serde(default)]
    pub value_type: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct JsonToXmlConfigDto {
    #[serde(default)]
    pub root_element: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ExternalCallConfigDto {
    #[serde(default)]
    pub receiver: Option<String>,
}
