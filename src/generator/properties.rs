use crate::config::GeneratorConfig;
use crate::domain::endpoint::EndpointRole;
use crate::domain::property::PropertySet;
use crate::error::Result;
use crate::generator::{XmlWriter, end, start, text_element};

/// Writes `<bpmn2:extensionElements>` with one `ifl:property` per entry.
pub fn write_extension_elements(writer: &mut XmlWriter, properties: &PropertySet) -> Result<()> {
    start(writer, "bpmn2:extensionElements", &[])?;
    for (key, value) in properties.iter() {
        start(writer, "ifl:property", &[])?;
        text_element(writer, "key", key, &[])?;
        text_element(writer, "value", value, &[])?;
        end(writer, "ifl:property")?;
    }
    end(writer, "bpmn2:extensionElements")
}

/// Integration flow wide settings on the collaboration element.
pub fn collaboration_properties(config: &GeneratorConfig) -> PropertySet {
    let return_exception = config.iflow.return_exception_to_sender.to_string();
    PropertySet::from_pairs(&[
        ("namespaceMapping", ""),
        ("httpSessionHandling", "None"),
        ("accessControlMaxAge", ""),
        ("returnExceptionToSender", return_exception.as_str()),
        ("log", config.iflow.log_level.as_str()),
        ("corsEnabled", "false"),
        ("exposedHeaders", ""),
        ("componentVersion", "1.2"),
        ("allowedHeaderList", ""),
        ("ServerTrace", "false"),
        ("allowedOrigins", ""),
        ("accessControlAllowCredentials", "false"),
        ("allowedHeaders", ""),
        ("allowedMethods", ""),
        ("cmdVariantUri", "ctype::IFlowVariant/cname::IFlowConfiguration/version::1.2.4"),
    ])
}

pub fn process_properties(config: &GeneratorConfig) -> PropertySet {
    let timeout = config.iflow.transaction_timeout.to_string();
    PropertySet::from_pairs(&[
        ("transactionTimeout", timeout.as_str()),
        ("componentVersion", "1.2"),
        ("cmdVariantUri", "ctype::FlowElementVariant/cname::IntegrationProcess/version::1.2.1"),
        ("transactionalHandling", config.iflow.transactional_handling.as_str()),
    ])
}

pub fn participant_properties(role: EndpointRole) -> PropertySet {
    let mut set = PropertySet::new();
    if role == EndpointRole::Sender {
        set.set("enableBasicAuthentication", "false");
    }
    set.set("ifl:type", role.participant_type());
    set
}

pub fn process_participant_properties() -> PropertySet {
    PropertySet::from_pairs(&[("ifl:type", "IntegrationProcess")])
}
