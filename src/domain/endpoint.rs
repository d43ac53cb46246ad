use serde_json::Value;

use crate::api::metadata_dto::{EndpointDto, EndpointRoleDto};
use crate::domain::id::{IdAllocator, sanitize_file_stem};
use crate::domain::property::PropertySet;
use crate::domain::resource::{Resource, ResourceFolder, checked_file_name};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointRole {
    Sender,
    Receiver,
}

impl EndpointRole {
    pub fn direction(&self) -> &'static str {
        match self {
            EndpointRole::Sender => "Sender",
            EndpointRole::Receiver => "Receiver",
        }
    }

    /// Value of the participant's `ifl:type`.
    pub fn participant_type(&self) -> &'static str {
        match self {
            EndpointRole::Sender => "EndpointSender",
            // Spelling matches what the SAP designer writes.
            EndpointRole::Receiver => "EndpointRecevier",
        }
    }
}

fn map_endpoint_role(dto_role: EndpointRoleDto) -> EndpointRole {
    match dto_role {
        EndpointRoleDto::Sender => EndpointRole::Sender,
        EndpointRoleDto::Receiver => EndpointRole::Receiver,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterType {
    Https,
    Http,
    Soap,
    Sftp,
    OData,
    ProcessDirect,
    Mail,
}

impl AdapterType {
    pub fn parse(raw: &str) -> Option<AdapterType> {
        match raw.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "https" => Some(AdapterType::Https),
            "http" => Some(AdapterType::Http),
            "soap" => Some(AdapterType::Soap),
            "sftp" => Some(AdapterType::Sftp),
            "odata" | "hcio_data" | "odata_v2" => Some(AdapterType::OData),
            "processdirect" | "process_direct" => Some(AdapterType::ProcessDirect),
            "mail" | "smtp" => Some(AdapterType::Mail),
            _ => None,
        }
    }

    /// Name shown on the message flow in the designer.
    pub fn display_name(&self) -> &'static str {
        match self {
            AdapterType::Https => "HTTPS",
            AdapterType::Http => "HTTP",
            AdapterType::Soap => "SOAP",
            AdapterType::Sftp => "SFTP",
            AdapterType::OData => "OData",
            AdapterType::ProcessDirect => "ProcessDirect",
            AdapterType::Mail => "Mail",
        }
    }

    pub fn supports(&self, role: EndpointRole) -> bool {
        match self {
            AdapterType::Https => role == EndpointRole::Sender,
            AdapterType::Http | AdapterType::OData | AdapterType::Mail => role == EndpointRole::Receiver,
            AdapterType::Soap | AdapterType::Sftp | AdapterType::ProcessDirect => true,
        }
    }

    /// (ComponentType, TransportProtocol, MessageProtocol, variant version, componentVersion)
    fn variant(&self, role: EndpointRole) -> (&'static str, &'static str, &'static str, &'static str, &'static str) {
        match (self, role) {
            (AdapterType::Https, _) => ("HTTPS", "HTTPS", "None", "1.5.0", "1.5"),
            (AdapterType::Http, _) => ("HTTP", "HTTP", "None", "1.16.1", "1.16"),
            (AdapterType::Soap, EndpointRole::Sender) => ("SOAP", "HTTP", "SOAP 1.x", "1.8.0", "1.8"),
            (AdapterType::Soap, EndpointRole::Receiver) => ("SOAP", "HTTP", "SOAP 1.x", "1.9.0", "1.9"),
            (AdapterType::Sftp, EndpointRole::Sender) => ("SFTP", "SFTP", "File", "1.11.2", "1.11"),
            (AdapterType::Sftp, EndpointRole::Receiver) => ("SFTP", "SFTP", "File", "1.11.1", "1.11"),
            (AdapterType::OData, _) => ("HCIOData", "HTTP", "OData V2", "1.25.0", "1.25"),
            (AdapterType::ProcessDirect, EndpointRole::Sender) => ("ProcessDirect", "Not Applicable", "Not Applicable", "1.1.2", "1.1"),
            (AdapterType::ProcessDirect, EndpointRole::Receiver) => ("ProcessDirect", "Not Applicable", "Not Applicable", "1.0.0", "1.0"),
            (AdapterType::Mail, _) => ("Mail", "SMTP", "None", "1.10.0", "1.10"),
        }
    }

    /// Metadata keys accepted as shorthand for the adapter's own property name.
    fn aliases(&self, role: EndpointRole) -> &'static [(&'static str, &'static str)] {
        match (self, role) {
            (AdapterType::Https, _) => &[("address", "urlPath"), ("path", "urlPath")],
            (AdapterType::Http, _) => &[("address", "httpAddressWithoutQuery"), ("url", "httpAddressWithoutQuery"), ("method", "httpMethod")],
            (AdapterType::OData, _) => &[("url", "address"), ("resource", "resourcePath")],
            (AdapterType::Sftp, _) => &[("directory", "path"), ("file_name", "fileName"), ("credential", "credential_name")],
            (AdapterType::Mail, _) => &[("host", "server")],
            _ => &[("url", "address")],
        }
    }

    /// Full property block of a message flow using this adapter.
    pub fn default_properties(&self, role: EndpointRole) -> PropertySet {
        let (component_type, transport, message, variant_version, component_version) = self.variant(role);
        let direction = role.direction();

        let mut set = PropertySet::from_pairs(&[
            ("ComponentType", component_type),
            ("Description", ""),
            ("ComponentNS", "sap"),
            ("Name", self.display_name()),
            ("TransportProtocolVersion", component_version),
            ("ComponentSWCVName", "external"),
            ("ComponentSWCVId", component_version),
            ("direction", direction),
            ("TransportProtocol", transport),
            ("MessageProtocol", message),
            ("MessageProtocolVersion", component_version),
            ("componentVersion", component_version),
            (
                "cmdVariantUri",
                format!(
                    "ctype::AdapterVariant/cname::sap:{}/tp::{}/mp::{}/direction::{}/version::{}",
                    component_type, transport, message, direction, variant_version
                )
                .as_str(),
            ),
        ]);

        let specific: &[(&str, &str)] = match (self, role) {
            (AdapterType::Https, _) => &[
                ("urlPath", "/"),
                ("senderAuthType", "RoleBased"),
                ("userRole", "ESBMessaging.send"),
                ("maximumBodySize", "40"),
                ("xsrfProtection", "0"),
            ],
            (AdapterType::Http, _) => &[
                ("httpAddressWithoutQuery", ""),
                ("httpAddressQuery", ""),
                ("httpMethod", "POST"),
                ("authenticationMethod", "None"),
                ("credentialName", ""),
                ("httpRequestTimeout", "60000"),
                ("throwExceptionOnFailure", "true"),
            ],
            (AdapterType::Soap, EndpointRole::Sender) => &[
                ("address", "/"),
                ("serviceDefinition", "WSDL"),
                ("processingSettings", "WSStandard"),
                ("senderAuthType", "RoleBased"),
                ("userRole", "ESBMessaging.send"),
            ],
            (AdapterType::Soap, EndpointRole::Receiver) => &[
                ("address", ""),
                ("wsdlURL", ""),
                ("serviceName", ""),
                ("operationName", ""),
                ("authentication", "None"),
                ("credentialName", ""),
                ("requestTimeout", "60000"),
            ],
            (AdapterType::Sftp, EndpointRole::Sender) => &[
                ("host", ""),
                ("path", "/"),
                ("fileName", "*"),
                ("authentication", "public_key"),
                ("credential_name", ""),
                ("postProcessing", "delete"),
            ],
            (AdapterType::Sftp, EndpointRole::Receiver) => &[
                ("host", ""),
                ("path", "/"),
                ("fileName", "${date:now:yyyyMMddHHmmss}.xml"),
                ("authentication", "public_key"),
                ("credential_name", ""),
                ("fileExist", "Override"),
            ],
            (AdapterType::OData, _) => &[
                ("address", ""),
                ("resourcePath", ""),
                ("operation", "Query(GET)"),
                ("authenticationMethod", "None"),
                ("credentialName", ""),
            ],
            (AdapterType::ProcessDirect, _) => &[("address", "/")],
            (AdapterType::Mail, _) => &[
                ("server", ""),
                ("from", ""),
                ("to", ""),
                ("subject", ""),
                ("authentication", "None"),
                ("credentialName", ""),
            ],
        };

        for (k, v) in specific {
            set.set(*k, *v);
        }
        set
    }

    fn canonical_key(&self, role: EndpointRole, key: &str) -> String {
        self.aliases(role)
            .iter()
            .find(|(alias, _)| *alias == key)
            .map(|(_, canonical)| canonical.to_string())
            .unwrap_or_else(|| key.to_string())
    }
}

/// A sender or receiver system, drawn as a collaboration participant.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    /// Id used in the metadata JSON.
    pub id: String,
    pub element_id: String,
    pub name: String,
    pub role: EndpointRole,
    pub adapter: AdapterType,
    /// Adapter properties, written on the message flow.
    pub adapter_properties: PropertySet,
    pub resources: Vec<Resource>,
}

impl Participant {
    pub fn from_dto(dto: &EndpointDto, ids: &mut IdAllocator) -> Result<Participant> {
        let role = map_endpoint_role(dto.role);
        let adapter = AdapterType::parse(&dto.adapter)
            .filter(|adapter| adapter.supports(role))
            .ok_or_else(|| {
                log::error!("Endpoint '{}' uses unsupported adapter '{}'.", dto.id, dto.adapter);
                Error::UnsupportedAdapter {
                    endpoint: dto.id.clone(),
                    adapter: dto.adapter.clone(),
                    role: role.direction().to_lowercase(),
                }
            })?;

        let mut adapter_properties = adapter.default_properties(role);
        let mut resources = Vec::new();

        if let Some(content) = &dto.wsdl_content {
            let file_name = match &dto.wsdl_file {
                Some(file) => checked_file_name(&dto.id, file)?,
                None => format!("{}.wsdl", sanitize_file_stem(&dto.id)),
            };
            let key = match role {
                EndpointRole::Sender => "serviceDefinitionUrl",
                EndpointRole::Receiver => "wsdlURL",
            };
            adapter_properties.set(key, format!("/wsdl/{}", file_name));
            resources.push(Resource::new(ResourceFolder::Wsdl, file_name, content.clone()));
        }
        if let Some(content) = &dto.schema_content {
            let file_name = match &dto.schema_file {
                Some(file) => checked_file_name(&dto.id, file)?,
                None => format!("{}.xsd", sanitize_file_stem(&dto.id)),
            };
            resources.push(Resource::new(ResourceFolder::Xsd, file_name, content.clone()));
        }

        for (key, value) in &dto.properties {
            adapter_properties.set(adapter.canonical_key(role, key), value_to_property(value));
        }

        let name = dto.name.clone().unwrap_or_else(|| dto.id.clone());

        Ok(Participant {
            id: dto.id.clone(),
            element_id: ids.next("Participant"),
            name,
            role,
            adapter,
            adapter_properties,
            resources,
        })
    }
}

/// JSON scalars become their plain text, anything else its JSON text.
fn value_to_property(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Adapter connection between a participant and the integration process.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageFlow {
    pub element_id: String,
    pub name: String,
    pub source: String,
    pub target: String,
    pub properties: PropertySet,
}
