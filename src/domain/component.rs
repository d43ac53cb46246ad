use serde::de::DeserializeOwned;

use crate::api::metadata_dto::{
    ComponentDto, ContentModifierConfigDto, ExternalCallConfigDto, FilterConfigDto, JsonToXmlConfigDto,
    MappingConfigDto, ScriptConfigDto, TableEntryDto,
};
use crate::domain::id::{IdAllocator, sanitize_file_stem};
use crate::domain::property::{PropertySet, PropertyTable};
use crate::domain::resource::{Resource, ResourceFolder, checked_file_name};
use crate::error::{Error, Result};

/// Types that must never appear in the metadata, start and end events are synthesized.
const RESERVED_TYPES: &[&str] = &["start_event", "end_event", "start", "end", "message_start_event", "message_end_event"];

/// The BPMN element a component is written as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BpmnElementType {
    CallActivity,
    ServiceTask,
    ExclusiveGateway,
}

impl BpmnElementType {
    pub fn id_prefix(&self) -> &'static str {
        match self {
            BpmnElementType::CallActivity => "CallActivity",
            BpmnElementType::ServiceTask => "ServiceTask",
            BpmnElementType::ExclusiveGateway => "ExclusiveGateway",
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            BpmnElementType::CallActivity => "bpmn2:callActivity",
            BpmnElementType::ServiceTask => "bpmn2:serviceTask",
            BpmnElementType::ExclusiveGateway => "bpmn2:exclusiveGateway",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ComponentKind {
    ContentModifier {
        headers: PropertyTable,
        properties: PropertyTable,
        body: Option<String>,
    },
    GroovyScript {
        script_file: String,
        function: String,
    },
    MessageMapping {
        mapping_name: String,
    },
    XsltMapping {
        mapping_name: String,
    },
    Filter {
        xpath: String,
        value_type: String,
    },
    JsonToXml {
        root_element: Option<String>,
    },
    XmlToJson,
    /// Keyed by the metadata id of the receiver endpoint.
    RequestReply {
        receiver: String,
    },
    Send {
        receiver: String,
    },
    /// `default_flow` is filled in once the outgoing routes are known.
    Router {
        default_flow: Option<String>,
    },
}

impl ComponentKind {
    pub fn element_type(&self) -> BpmnElementType {
        match self {
            ComponentKind::RequestReply { .. } | ComponentKind::Send { .. } => BpmnElementType::ServiceTask,
            ComponentKind::Router { .. } => BpmnElementType::ExclusiveGateway,
            _ => BpmnElementType::CallActivity,
        }
    }

    pub fn is_router(&self) -> bool {
        matches!(self, ComponentKind::Router { .. })
    }

    /// Receiver endpoint this step talks to, if any.
    pub fn receiver(&self) -> Option<&str> {
        match self {
            ComponentKind::RequestReply { receiver } | ComponentKind::Send { receiver } => Some(receiver.as_str()),
            _ => None,
        }
    }

    /// Name used when the metadata does not give one.
    pub fn default_name(&self) -> &'static str {
        match self {
            ComponentKind::ContentModifier { .. } => "Content Modifier",
            ComponentKind::GroovyScript { .. } => "Groovy Script",
            ComponentKind::MessageMapping { .. } => "Message Mapping",
            ComponentKind::XsltMapping { .. } => "XSLT Mapping",
            ComponentKind::Filter { .. } => "Filter",
            ComponentKind::JsonToXml { .. } => "JSON to XML Converter",
            ComponentKind::XmlToJson => "XML to JSON Converter",
            ComponentKind::RequestReply { .. } => "Request Reply",
            ComponentKind::Send { .. } => "Send",
            ComponentKind::Router { .. } => "Router",
        }
    }

    /// The `ifl:property` block written for this step.
    pub fn properties(&self) -> PropertySet {
        match self {
            ComponentKind::ContentModifier { headers, properties, body } => {
                let mut set = PropertySet::from_pairs(&[
                    ("bodyType", if body.is_some() { "constant" } else { "expression" }),
                    ("propertyTable", properties.encode().as_str()),
                    ("headerTable", headers.encode().as_str()),
                    ("wrapContent", body.as_deref().unwrap_or("")),
                ]);
                set.set("componentVersion", "1.5");
                set.set("activityType", "Enricher");
                set.set("cmdVariantUri", "ctype::FlowstepVariant/cname::Enricher/version::1.5.1");
                set
            }
            ComponentKind::GroovyScript { script_file, function } => PropertySet::from_pairs(&[
                ("scriptFunction", function.as_str()),
                ("scriptBundleId", ""),
                ("componentVersion", "1.1"),
                ("activityType", "Script"),
                ("cmdVariantUri", "ctype::FlowstepVariant/cname::GroovyScript/version::1.1.2"),
                ("subActivityType", "GroovyScript"),
                ("script", script_file.as_str()),
            ]),
            ComponentKind::MessageMapping { mapping_name } => PropertySet::from_pairs(&[
                ("mappinguri", format!("dir://mmap/src/main/resources/mapping/{}.mmap", mapping_name).as_str()),
                ("mappingname", mapping_name.as_str()),
                ("mappingType", "MessageMapping"),
                ("mappingpath", format!("src/main/resources/mapping/{}", mapping_name).as_str()),
                ("componentVersion", "1.3"),
                ("activityType", "Mapping"),
                ("cmdVariantUri", "ctype::FlowstepVariant/cname::MessageMapping/version::1.3.1"),
            ]),
            ComponentKind::XsltMapping { mapping_name } => PropertySet::from_pairs(&[
                ("mappinguri", format!("dir://mapping/xslt/src/main/resources/mapping/{}.xsl", mapping_name).as_str()),
                ("mappingname", mapping_name.as_str()),
                ("mappingType", "XSLTMapping"),
                ("mappingpath", format!("src/main/resources/mapping/{}", mapping_name).as_str()),
                ("mappingoutputformat", "Bytes"),
                ("componentVersion", "1.2"),
                ("activityType", "Mapping"),
                ("cmdVariantUri", "ctype::FlowstepVariant/cname::XSLTMapping/version::1.2.0"),
            ]),
            ComponentKind::Filter { xpath, value_type } => PropertySet::from_pairs(&[
                ("xpathType", value_type.as_str()),
                ("wrapContent", xpath.as_str()),
                ("componentVersion", "1.1"),
                ("activityType", "Filter"),
                ("cmdVariantUri", "ctype::FlowstepVariant/cname::Filter/version::1.1.2"),
            ]),
            ComponentKind::JsonToXml { root_element } => PropertySet::from_pairs(&[
                ("addXMLRootElement", if root_element.is_some() { "true" } else { "false" }),
                ("additionalRootElementName", root_element.as_deref().unwrap_or("root")),
                ("additionalRootElementNamespace", ""),
                ("jsonNamespaceMapping", ""),
                ("useNamespaces", "false"),
                ("componentVersion", "1.1"),
                ("activityType", "JsonToXmlConverter"),
                ("cmdVariantUri", "ctype::FlowstepVariant/cname::JsonToXmlConverter/version::1.1.2"),
            ]),
            ComponentKind::XmlToJson => PropertySet::from_pairs(&[
                ("jsonOutputEncoding", "UTF-8"),
                ("xmlJsonPathTable", ""),
                ("xmlJsonUseStreaming", "false"),
                ("jsonNamespaceSeparator", ":"),
                ("componentVersion", "1.1"),
                ("activityType", "XmlToJsonConverter"),
                ("cmdVariantUri", "ctype::FlowstepVariant/cname::XmlToJsonConverter/version::1.1.2"),
            ]),
            ComponentKind::RequestReply { .. } => PropertySet::from_pairs(&[
                ("componentVersion", "1.0"),
                ("activityType", "ExternalCall"),
                ("cmdVariantUri", "ctype::FlowstepVariant/cname::ExternalCall/version::1.0.4"),
            ]),
            ComponentKind::Send { .. } => PropertySet::from_pairs(&[
                ("componentVersion", "1.0"),
                ("activityType", "Send"),
                ("cmdVariantUri", "ctype::FlowstepVariant/cname::Send/version::1.0.5"),
            ]),
            ComponentKind::Router { .. } => PropertySet::from_pairs(&[
                ("throwException", "false"),
                ("componentVersion", "1.1"),
                ("activityType", "ExclusiveGateway"),
                ("cmdVariantUri", "ctype::FlowstepVariant/cname::ExclusiveGateway/version::1.1.2"),
            ]),
        }
    }
}

/// A user supplied processing step of the integration process.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// Id used in the metadata JSON.
    pub id: String,
    /// Generated BPMN id, e.g. `CallActivity_2`.
    pub element_id: String,
    pub name: String,
    pub kind: ComponentKind,
    pub properties: PropertySet,
    pub resource: Option<Resource>,

    /// Keys to `Iflow.sequence_flows`
    pub incoming: Vec<String>,
    pub outgoing: Vec<String>,
}

impl Component {
    /// Checks the type and config of a single metadata component.
    ///
    /// Graph wiring (incoming/outgoing) is done later by the `Iflow` phases.
    pub fn from_dto(dto: &ComponentDto, ids: &mut IdAllocator) -> Result<Component> {
        let (kind, resource) = Self::build_kind(dto)?;
        let element_id = ids.next(kind.element_type().id_prefix());
        let name = dto
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| kind.default_name().to_string());
        let properties = kind.properties();

        Ok(Component {
            id: dto.id.clone(),
            element_id,
            name,
            kind,
            properties,
            resource,
            incoming: Vec::new(),
            outgoing: Vec::new(),
        })
    }

    fn build_kind(dto: &ComponentDto) -> Result<(ComponentKind, Option<Resource>)> {
        let type_name = dto.type_name.trim().to_ascii_lowercase();

        if RESERVED_TYPES.contains(&type_name.as_str()) {
            log::error!("Component '{}' uses reserved type '{}'.", dto.id, dto.type_name);
            return Err(Error::InvalidComponentType { id: dto.id.clone(), type_name: dto.type_name.clone() });
        }

        let display_name = dto.name.as_deref().unwrap_or(&dto.id);

        match type_name.as_str() {
            "content_modifier" => {
                let config: ContentModifierConfigDto = decode_config(dto)?;
                let kind = ComponentKind::ContentModifier {
                    headers: table_from_entries(&config.headers),
                    properties: table_from_entries(&config.properties),
                    body: config.body,
                };
                Ok((kind, None))
            }
            "groovy_script" => {
                let config: ScriptConfigDto = decode_config(dto)?;
                let function = config.function.unwrap_or_else(|| "processData".to_string());
                let mut script_file = match config.script_file {
                    Some(file) => checked_file_name(&dto.id, &file)?,
                    None => sanitize_file_stem(display_name),
                };
                if !script_file.ends_with(".groovy") && !script_file.ends_with(".gsh") {
                    script_file.push_str(".groovy");
                }
                let content = match config.script_content {
                    Some(content) => content,
                    None => {
                        log::warn!("No script content for component '{}', generating a '{}' stub.", dto.id, function);
                        groovy_stub(&function)
                    }
                };
                let resource = Resource::new(ResourceFolder::Script, script_file.clone(), content);
                Ok((ComponentKind::GroovyScript { script_file, function }, Some(resource)))
            }
            "message_mapping" => {
                let config: MappingConfigDto = decode_config(dto)?;
                let mapping_name = checked_mapping_name(dto, config.mapping_name.as_deref(), display_name)?;
                let resource = match config.mapping_content {
                    Some(content) => Some(Resource::new(ResourceFolder::Mapping, format!("{}.mmap", mapping_name), content)),
                    None => {
                        log::warn!("Message mapping '{}' has no content; the package references it without shipping it.", mapping_name);
                        None
                    }
                };
                Ok((ComponentKind::MessageMapping { mapping_name }, resource))
            }
            "xslt_mapping" => {
                let config: MappingConfigDto = decode_config(dto)?;
                let mapping_name = checked_mapping_name(dto, config.mapping_name.as_deref(), display_name)?;
                let content = config.mapping_content.unwrap_or_else(|| {
                    log::warn!("No XSLT content for component '{}', generating an identity transform.", dto.id);
                    IDENTITY_XSLT.to_string()
                });
                let resource = Resource::new(ResourceFolder::Mapping, format!("{}.xsl", mapping_name), content);
                Ok((ComponentKind::XsltMapping { mapping_name }, Some(resource)))
            }
            "filter" => {
                let config: FilterConfigDto = decode_config(dto)?;
                let xpath = config.xpath.ok_or_else(|| missing(dto, "xpath"))?;
                let value_type = config.value_type.unwrap_or_else(|| "Nodelist".to_string());
                Ok((ComponentKind::Filter { xpath, value_type }, None))
            }
            "json_to_xml" => {
                let config: JsonToXmlConfigDto = decode_config(dto)?;
                Ok((ComponentKind::JsonToXml { root_element: config.root_element }, None))
            }
            "xml_to_json" => Ok((ComponentKind::XmlToJson, None)),
            "request_reply" => {
                let config: ExternalCallConfigDto = decode_config(dto)?;
                let receiver = config.receiver.ok_or_else(|| missing(dto, "receiver"))?;
                Ok((ComponentKind::RequestReply { receiver }, None))
            }
            "send" => {
                let config: ExternalCallConfigDto = decode_config(dto)?;
                let receiver = config.receiver.ok_or_else(|| missing(dto, "receiver"))?;
                Ok((ComponentKind::Send { receiver }, None))
            }
            "router" => Ok((ComponentKind::Router { default_flow: None }, None)),
            _ => {
                log::error!("Component '{}' has unsupported type '{}'.", dto.id, dto.type_name);
                Err(Error::InvalidComponentType { id: dto.id.clone(), type_name: dto.type_name.clone() })
            }
        }
    }
}

fn checked_mapping_name(dto: &ComponentDto, name: Option<&str>, display_name: &str) -> Result<String> {
    match name {
        Some(name) => checked_file_name(&dto.id, name),
        None => Ok(sanitize_file_stem(display_name)),
    }
}

fn decode_config<T: DeserializeOwned + Default>(dto: &ComponentDto) -> Result<T> {
    if dto.config.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(dto.config.clone())
        .map_err(|e| Error::ModelConstructionError(format!("Component '{}' has invalid config: {}", dto.id, e)))
}

fn missing(dto: &ComponentDto, key: &str) -> Error {
    log::error!("Component '{}' is missing '{}'.", dto.id, key);
    Error::MissingConfig { id: dto.id.clone(), key: key.to_string() }
}

fn table_from_entries(entries: &[TableEntryDto]) -> PropertyTable {
    let mut table = PropertyTable::new();
    for entry in entries {
        table.push_row(&[
            ("Action", "Create"),
            ("Type", entry.value_type.as_str()),
            ("Value", entry.value.as_str()),
            ("Default", entry.default.as_deref().unwrap_or("")),
            ("Name", entry.name.as_str()),
            ("Datatype", entry.datatype.as_deref().unwrap_or("")),
        ]);
    }
    table
}

fn groovy_stub(function: &str) -> String {
    format!(
        "import com.sap.gateway.ip.core.customdev.util.Message\n\n\
         def Message {}(Message message) {{\n    \
         def body = message.getBody(java.lang.String)\n    \
         message.setBody(body)\n    \
         return message\n\
         }}\n",
        function
    )
}

const IDENTITY_XSLT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xsl:stylesheet version="2.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
    <xsl:template match="@*|node()">
        <xsl:copy>
            <xsl:apply-templates select="@*|node()"/>
        </xsl:copy>
    </xsl:template>
</xsl:stylesheet>
"#;
