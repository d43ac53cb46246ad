use quick_xml::Writer;
use quick_xml::events::{BytesDecl, Event};

use crate::config::GeneratorConfig;
use crate::domain::component::{Component, ComponentKind};
use crate::domain::event::StartEventKind;
use crate::domain::iflow::{COLLABORATION_ID, Iflow, PROCESS_ID, PROCESS_PARTICIPANT_ID};
use crate::domain::layout::Diagram;
use crate::domain::sequence_flow::SequenceFlow;
use crate::error::{Error, Result};
use crate::generator::diagram::write_diagram;
use crate::generator::properties::{
    collaboration_properties, participant_properties, process_participant_properties, process_properties,
    write_extension_elements,
};
use crate::generator::{XmlWriter, empty, end, start, text_element};

const NAMESPACES: &[(&str, &str)] = &[
    ("xmlns:bpmn2", "http://www.omg.org/spec/BPMN/20100524/MODEL"),
    ("xmlns:bpmndi", "http://www.omg.org/spec/BPMN/20100524/DI"),
    ("xmlns:dc", "http://www.omg.org/spec/DD/20100524/DC"),
    ("xmlns:di", "http://www.omg.org/spec/DD/20100524/DI"),
    ("xmlns:ifl", "http:///com.sap.ifl.model/Ifl.xsd"),
    ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
];

/// Serializes the iFlow into the `.iflw` document.
///
/// Element order is fixed: collaboration (participants, message flows),
/// process (start event, end events, components in declaration order,
/// sequence flows), diagram.
pub fn write_iflow(iflow: &Iflow, diagram: &Diagram, config: &GeneratorConfig) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root_attributes: Vec<(&str, &str)> = NAMESPACES.to_vec();
    root_attributes.push(("id", "Definitions_1"));
    start(&mut writer, "bpmn2:definitions", &root_attributes)?;

    write_collaboration(&mut writer, iflow, config)?;
    write_process(&mut writer, iflow, config)?;
    write_diagram(&mut writer, diagram)?;

    end(&mut writer, "bpmn2:definitions")?;

    String::from_utf8(writer.into_inner())
        .map_err(|e| Error::ModelConstructionError(format!("generated iFlow XML is not UTF-8: {}", e)))
}

fn write_collaboration(writer: &mut XmlWriter, iflow: &Iflow, config: &GeneratorConfig) -> Result<()> {
    start(writer, "bpmn2:collaboration", &[("id", COLLABORATION_ID), ("name", "Default Collaboration")])?;
    write_extension_elements(writer, &collaboration_properties(config))?;

    for participant in &iflow.participants {
        start(
            writer,
            "bpmn2:participant",
            &[
                ("id", participant.element_id.as_str()),
                ("ifl:type", participant.role.participant_type()),
                ("name", participant.name.as_str()),
            ],
        )?;
        write_extension_elements(writer, &participant_properties(participant.role))?;
        end(writer, "bpmn2:participant")?;
    }

    start(
        writer,
        "bpmn2:participant",
        &[
            ("id", PROCESS_PARTICIPANT_ID),
            ("ifl:type", "IntegrationProcess"),
            ("name", "Integration Process"),
            ("processRef", PROCESS_ID),
        ],
    )?;
    write_extension_elements(writer, &process_participant_properties())?;
    end(writer, "bpmn2:participant")?;

    for flow in &iflow.message_flows {
        start(
            writer,
            "bpmn2:messageFlow",
            &[
                ("id", flow.element_id.as_str()),
                ("name", flow.name.as_str()),
                ("sourceRef", flow.source.as_str()),
                ("targetRef", flow.target.as_str()),
            ],
        )?;
        write_extension_elements(writer, &flow.properties)?;
        end(writer, "bpmn2:messageFlow")?;
    }

    end(writer, "bpmn2:collaboration")
}

fn write_process(writer: &mut XmlWriter, iflow: &Iflow, config: &GeneratorConfig) -> Result<()> {
    start(writer, "bpmn2:process", &[("id", PROCESS_ID), ("name", "Integration Process")])?;
    write_extension_elements(writer, &process_properties(config))?;

    // Start event
    let start_event = &iflow.start_event;
    start(
        writer,
        "bpmn2:startEvent",
        &[("id", start_event.element_id.as_str()), ("name", start_event.name.as_str())],
    )?;
    write_extension_elements(writer, &start_event.properties())?;
    for flow_id in &start_event.outgoing {
        text_element(writer, "bpmn2:outgoing", flow_id, &[])?;
    }
    match start_event.kind {
        StartEventKind::Message => empty(writer, "bpmn2:messageEventDefinition", &[])?,
        StartEventKind::Timer(_) => empty(writer, "bpmn2:timerEventDefinition", &[])?,
    }
    end(writer, "bpmn2:startEvent")?;

    // End events
    for end_event in &iflow.end_events {
        start(writer, "bpmn2:endEvent", &[("id", end_event.element_id.as_str()), ("name", end_event.name.as_str())])?;
        write_extension_elements(writer, &end_event.properties())?;
        for flow_id in &end_event.incoming {
            text_element(writer, "bpmn2:incoming", flow_id, &[])?;
        }
        if iflow.message_flows.iter().any(|m| m.source == end_event.element_id) {
            empty(writer, "bpmn2:messageEventDefinition", &[])?;
        }
        end(writer, "bpmn2:endEvent")?;
    }

    for component in &iflow.components {
        write_component(writer, component)?;
    }

    for flow in &iflow.sequence_flows {
        let from_router = iflow.component(&flow.source).is_some_and(|c| c.kind.is_router());
        write_sequence_flow(writer, flow, from_router)?;
    }

    end(writer, "bpmn2:process")
}

fn write_component(writer: &mut XmlWriter, component: &Component) -> Result<()> {
    let tag = component.kind.element_type().tag();

    let mut attributes: Vec<(&str, &str)> = Vec::new();
    if let ComponentKind::Router { default_flow: Some(default_flow) } = &component.kind {
        attributes.push(("default", default_flow.as_str()));
    }
    attributes.push(("id", component.element_id.as_str()));
    attributes.push(("name", component.name.as_str()));

    start(writer, tag, &attributes)?;
    write_extension_elements(writer, &component.properties)?;
    for flow_id in &component.incoming {
        text_element(writer, "bpmn2:incoming", flow_id, &[])?;
    }
    for flow_id in &component.outgoing {
        text_element(writer, "bpmn2:outgoing", flow_id, &[])?;
    }
    end(writer, tag)
}

fn write_sequence_flow(writer: &mut XmlWriter, flow: &SequenceFlow, from_router: bool) -> Result<()> {
    let mut attributes: Vec<(&str, &str)> = vec![("id", flow.element_id.as_str())];
    if let Some(name) = &flow.name {
        attributes.push(("name", name.as_str()));
    }
    attributes.push(("sourceRef", flow.source.as_str()));
    attributes.push(("targetRef", flow.target.as_str()));

    if !from_router {
        return empty(writer, "bpmn2:sequenceFlow", &attributes);
    }

    start(writer, "bpmn2:sequenceFlow", &attributes)?;
    write_extension_elements(writer, &flow.route_properties())?;
    if let (Some(condition), false) = (&flow.condition, flow.is_default) {
        let expression_id = format!("FormalExpression_{}", flow.element_id);
        text_element(
            writer,
            "bpmn2:conditionExpression",
            condition,
            &[("id", expression_id.as_str()), ("xsi:type", "bpmn2:tFormalExpression")],
        )?;
    }
    end(writer, "bpmn2:sequenceFlow")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::metadata_dto::IflowMetadataDto;
    use crate::domain::layout;
    use crate::loader::parser::parse_json_str;

    fn render(json: &str) -> String {
        let dto: IflowMetadataDto = parse_json_str(json).unwrap();
        let iflow = Iflow::try_from(dto).unwrap();
        let config = GeneratorConfig::default();
        let diagram = layout::compute(&iflow, &config.layout);
        write_iflow(&iflow, &diagram, &config).unwrap()
    }

    fn end_event_xml(xml: &str) -> &str {
        let from = xml.find("<bpmn2:endEvent").unwrap();
        let to = xml[from..].find("</bpmn2:endEvent>").unwrap();
        &xml[from..from + to]
    }

    #[test]
    fn test_end_event_with_delivery_is_a_message_event() {
        let xml = render(
            r#"{
                "iflow_info": { "name": "Delivery" },
                "endpoints": [ { "id": "archive", "role": "receiver", "adapter": "SFTP" } ],
                "components": [ { "id": "cm", "type": "content_modifier" } ]
            }"#,
        );

        assert!(end_event_xml(&xml).contains("<bpmn2:messageEventDefinition/>"));
        assert!(xml.contains("sourceRef=\"EndEvent_1\""));
    }

    #[test]
    fn test_linear_flow_document_structure() {
        let xml = render(
            r#"{
                "iflow_info": { "name": "Linear" },
                "endpoints": [ { "id": "in", "role": "sender", "adapter": "HTTPS", "properties": { "urlPath": "/orders" } } ],
                "components": [
                    { "id": "cm", "type": "content_modifier", "name": "Set Header",
                      "config": { "headers": [ { "name": "Source", "value": "ERP" } ] } }
                ]
            }"#,
        );

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<bpmn2:participant id=\"Participant_1\" ifl:type=\"EndpointSender\" name=\"in\">"));
        assert!(xml.contains("<bpmn2:messageFlow id=\"MessageFlow_1\" name=\"HTTPS\" sourceRef=\"Participant_1\" targetRef=\"StartEvent_1\">"));
        assert!(xml.contains("<key>urlPath</key>"));
        assert!(xml.contains("<value>/orders</value>"));
        assert!(xml.contains("<bpmn2:callActivity id=\"CallActivity_1\" name=\"Set Header\">"));
        assert!(xml.contains("<bpmn2:sequenceFlow id=\"SequenceFlow_1\" sourceRef=\"StartEvent_1\" targetRef=\"CallActivity_1\"/>"));
        assert!(xml.contains("<bpmn2:sequenceFlow id=\"SequenceFlow_2\" sourceRef=\"CallActivity_1\" targetRef=\"EndEvent_1\"/>"));
        // Only the start event receives a message; nothing leaves the end event
        assert_eq!(xml.matches("<bpmn2:messageEventDefinition/>").count(), 1);
        assert!(!end_event_xml(&xml).contains("messageEventDefinition"));
        assert!(xml.contains("<bpmndi:BPMNShape bpmnElement=\"CallActivity_1\" id=\"BPMNShape_CallActivity_1\">"));
        assert!(xml.contains("<bpmndi:BPMNEdge bpmnElement=\"SequenceFlow_1\" id=\"BPMNEdge_SequenceFlow_1\""));
    }

    #[test]
    fn test_property_table_is_html_encoded() {
        let xml = render(
            r#"{
                "iflow_info": { "name": "Tables" },
                "components": [
                    { "id": "cm", "type": "content_modifier",
                      "config": { "properties": [ { "name": "limit", "type": "expression", "value": "${header.a} < 5" } ] } }
                ]
            }"#,
        );

        assert!(xml.contains(
            "<value>&lt;row&gt;&lt;cell id='Action'&gt;Create&lt;/cell&gt;&lt;cell id='Type'&gt;expression&lt;/cell&gt;"
        ));
        // The cell value was escaped once in the table and once more as XML text.
        assert!(xml.contains("${header.a} &amp;lt; 5"));
        assert!(!xml.contains("<row>"));
    }

    #[test]
    fn test_router_writes_default_and_conditions() {
        let xml = render(
            r#"{
                "iflow_info": { "name": "Routing" },
                "components": [
                    { "id": "route", "type": "router" },
                    { "id": "high", "type": "content_modifier" },
                    { "id": "low", "type": "content_modifier" }
                ],
                "sequence_flows": [
                    { "id": "r1", "source": "route", "target": "high", "condition": "/Order/Priority = 'HIGH'" },
                    { "id": "r2", "source": "route", "target": "low" }
                ]
            }"#,
        );

        assert!(xml.contains("<bpmn2:exclusiveGateway default=\"SequenceFlow_2\" id=\"ExclusiveGateway_1\" name=\"Router\">"));
        assert!(xml.contains(
            "<bpmn2:conditionExpression id=\"FormalExpression_SequenceFlow_1\" xsi:type=\"bpmn2:tFormalExpression\">/Order/Priority = 'HIGH'</bpmn2:conditionExpression>"
        ));
        assert!(xml.contains("<value>XML</value>"));
        assert_eq!(xml.matches("<bpmn2:conditionExpression").count(), 1);
        assert!(xml.contains("<bpmn2:timerEventDefinition/>"));
    }
}
