/// Unit tests for the phases of `Iflow::try_from` in `iflow.rs`.
///
/// Each helper is tested on its own; `tests/test_iflow_loading.rs` covers
/// the whole pipeline from a metadata file.
#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::{Value, json};

    use crate::{
        api::metadata_dto::{
            ComponentDto, EndpointDto, EndpointRoleDto, IflowInfoDto, IflowMetadataDto, ScheduleDto, SequenceFlowDto,
        },
        config::GeneratorConfig,
        domain::{
            component::ComponentKind,
            event::{Schedule, StartEventKind},
            id::IdAllocator,
            iflow::Iflow,
            layout,
        },
        error::Error,
    };

    // --- HELPER FUNCTIONS FOR TEST SETUP ---

    fn mock_info(name: &str) -> IflowInfoDto {
        IflowInfoDto {
            name: name.to_string(),
            id: None,
            description: None,
            version: None,
            schedule: None,
            parameters: BTreeMap::new(),
        }
    }

    fn mock_metadata_dto(components: Vec<ComponentDto>, sequence_flows: Vec<SequenceFlowDto>) -> IflowMetadataDto {
        IflowMetadataDto { iflow_info: mock_info("Test Flow"), endpoints: vec![], components, sequence_flows }
    }

    fn mock_component(id: &str, type_name: &str, config: Value) -> ComponentDto {
        ComponentDto { id: id.to_string(), type_name: type_name.to_string(), name: None, config }
    }

    fn modifier(id: &str) -> ComponentDto {
        mock_component(id, "content_modifier", Value::Null)
    }

    fn mock_endpoint(id: &str, role: EndpointRoleDto, adapter: &str) -> EndpointDto {
        EndpointDto {
            id: id.to_string(),
            role,
            name: None,
            adapter: adapter.to_string(),
            properties: BTreeMap::new(),
            wsdl_file: None,
            wsdl_content: None,
            wsdl_path: None,
            schema_file: None,
            schema_content: None,
            schema_path: None,
        }
    }

    fn flow(id: &str, source: &str, target: &str) -> SequenceFlowDto {
        SequenceFlowDto {
            id: Some(id.to_string()),
            source: source.to_string(),
            target: target.to_string(),
            name: None,
            condition: None,
            default: false,
        }
    }

    fn conditional(id: &str, source: &str, target: &str, condition: &str) -> SequenceFlowDto {
        SequenceFlowDto { condition: Some(condition.to_string()), ..flow(id, source, target) }
    }

    /// Router `route` branching to `a` (conditional) and `b` (default).
    fn router_dto() -> IflowMetadataDto {
        mock_metadata_dto(
            vec![modifier("prep"), mock_component("route", "router", Value::Null), modifier("a"), modifier("b")],
            vec![
                flow("f1", "prep", "route"),
                conditional("f2", "route", "a", "${header.kind} = 'A'"),
                flow("f3", "route", "b"),
            ],
        )
    }

    // --- UNIT TESTS FOR HELPER FUNCTIONS ---

    #[test]
    fn test_phase0_build_info_sanitizes_id() {
        let info = Iflow::build_info(&mock_info("Order Replication (v2)")).unwrap();
        assert_eq!(info.id, "Order_Replication_v2");
        assert_eq!(info.name, "Order Replication (v2)");
        assert_eq!(info.version, None);

        let mut dto = mock_info("Name");
        dto.id = Some("42-flow".to_string());
        assert_eq!(Iflow::build_info(&dto).unwrap().id, "IFlow_42_flow");
    }

    #[test]
    fn test_phase0_build_info_rejects_empty_id() {
        let result = Iflow::build_info(&mock_info("  ---  "));
        assert!(matches!(result, Err(Error::ModelConstructionError(_))));
    }

    #[test]
    fn test_phase0_build_info_rejects_multiline_values() {
        let result = Iflow::build_info(&mock_info("Orders\nBundle-Version: 9.9.9"));
        assert!(matches!(result, Err(Error::ModelConstructionError(ref m)) if m.contains("iflow_info.name")));

        let mut dto = mock_info("Orders");
        dto.version = Some("1.0.0\r\nSAP-NodeType: X".to_string());
        let result = Iflow::build_info(&dto);
        assert!(matches!(result, Err(Error::ModelConstructionError(ref m)) if m.contains("iflow_info.version")));
    }

    #[test]
    fn test_phase1_generate_components_in_order() {
        let dto = mock_metadata_dto(
            vec![modifier("a"), mock_component("call", "send", json!({ "receiver": "x" })), modifier("b")],
            vec![],
        );
        let mut ids = IdAllocator::new();
        let (components, registry) = Iflow::generate_components(&dto, &mut ids).unwrap();

        let element_ids: Vec<&str> = components.iter().map(|c| c.element_id.as_str()).collect();
        assert_eq!(element_ids, vec!["CallActivity_1", "ServiceTask_1", "CallActivity_2"]);
        assert_eq!(registry.element_id("b"), Some("CallActivity_2"));
        assert_eq!(registry.metadata_id("ServiceTask_1"), Some("call"));
    }

    #[test]
    fn test_phase1_duplicate_component_id() {
        let dto = mock_metadata_dto(vec![modifier("a"), modifier("a")], vec![]);
        let result = Iflow::generate_components(&dto, &mut IdAllocator::new());
        assert!(matches!(result, Err(Error::DuplicateId(ref id)) if id == "a"));
    }

    #[test]
    fn test_phase2_participants_share_id_space() {
        let mut dto = mock_metadata_dto(vec![modifier("erp")], vec![]);
        dto.endpoints = vec![mock_endpoint("erp", EndpointRoleDto::Receiver, "HTTP")];

        let mut ids = IdAllocator::new();
        let (_, mut registry) = Iflow::generate_components(&dto, &mut ids).unwrap();
        let result = Iflow::build_participants(&dto, &mut registry, &mut ids);
        assert!(matches!(result, Err(Error::DuplicateId(_))));
    }

    #[test]
    fn test_phase2_at_most_one_sender() {
        let mut dto = mock_metadata_dto(vec![], vec![]);
        dto.endpoints = vec![
            mock_endpoint("in1", EndpointRoleDto::Sender, "HTTPS"),
            mock_endpoint("in2", EndpointRoleDto::Sender, "SOAP"),
        ];

        let mut ids = IdAllocator::new();
        let (_, mut registry) = Iflow::generate_components(&dto, &mut ids).unwrap();
        let result = Iflow::build_participants(&dto, &mut registry, &mut ids);
        assert!(matches!(result, Err(Error::ModelConstructionError(_))));
    }

    #[test]
    fn test_phase2_unsupported_adapter_role() {
        let mut dto = mock_metadata_dto(vec![], vec![]);
        dto.endpoints = vec![mock_endpoint("in", EndpointRoleDto::Sender, "OData")];

        let mut ids = IdAllocator::new();
        let (_, mut registry) = Iflow::generate_components(&dto, &mut ids).unwrap();
        let result = Iflow::build_participants(&dto, &mut registry, &mut ids);
        assert!(matches!(result, Err(Error::UnsupportedAdapter { ref role, .. }) if role == "sender"));
    }

    #[test]
    fn test_phase3_implicit_chain() {
        let dto = mock_metadata_dto(vec![modifier("a"), modifier("b"), modifier("c")], vec![]);
        let mut ids = IdAllocator::new();
        let (components, registry) = Iflow::generate_components(&dto, &mut ids).unwrap();
        let flows = Iflow::resolve_sequence_flows(&dto, &components, &registry, &mut ids).unwrap();

        let pairs: Vec<(&str, &str)> = flows.iter().map(|f| (f.source.as_str(), f.target.as_str())).collect();
        assert_eq!(pairs, vec![("CallActivity_1", "CallActivity_2"), ("CallActivity_2", "CallActivity_3")]);
    }

    #[test]
    fn test_phase3_unknown_component_reference() {
        let dto = mock_metadata_dto(vec![modifier("a")], vec![flow("f1", "a", "ghost")]);
        let mut ids = IdAllocator::new();
        let (components, registry) = Iflow::generate_components(&dto, &mut ids).unwrap();
        let result = Iflow::resolve_sequence_flows(&dto, &components, &registry, &mut ids);

        match result {
            Err(Error::UnknownComponentReference { flow, id }) => {
                assert_eq!(flow, "f1");
                assert_eq!(id, "ghost");
            }
            other => panic!("expected UnknownComponentReference, got {:?}", other),
        }
    }

    #[test]
    fn test_phase3_flow_to_endpoint_is_unknown_component() {
        let mut dto = mock_metadata_dto(vec![modifier("a")], vec![flow("f1", "a", "erp")]);
        dto.endpoints = vec![mock_endpoint("erp", EndpointRoleDto::Receiver, "HTTP")];

        let mut ids = IdAllocator::new();
        let (components, mut registry) = Iflow::generate_components(&dto, &mut ids).unwrap();
        Iflow::build_participants(&dto, &mut registry, &mut ids).unwrap();
        let result = Iflow::resolve_sequence_flows(&dto, &components, &registry, &mut ids);
        assert!(matches!(result, Err(Error::UnknownComponentReference { .. })));
    }

    #[test]
    fn test_phase3_self_loop_and_duplicate_flow_id() {
        let dto = mock_metadata_dto(vec![modifier("a"), modifier("b")], vec![flow("f1", "a", "a")]);
        let mut ids = IdAllocator::new();
        let (components, registry) = Iflow::generate_components(&dto, &mut ids).unwrap();
        assert!(matches!(
            Iflow::resolve_sequence_flows(&dto, &components, &registry, &mut ids),
            Err(Error::GraphInvariant(_))
        ));

        let dto = mock_metadata_dto(vec![modifier("a"), modifier("b")], vec![flow("f1", "a", "b"), flow("f1", "b", "a")]);
        assert!(matches!(
            Iflow::resolve_sequence_flows(&dto, &components, &registry, &mut ids),
            Err(Error::DuplicateId(_))
        ));
    }

    #[test]
    fn test_phase4_events_for_linear_flow() {
        let iflow = Iflow::try_from(mock_metadata_dto(vec![modifier("a"), modifier("b")], vec![])).unwrap();

        assert_eq!(iflow.start_event.element_id, "StartEvent_1");
        assert_eq!(iflow.end_events.len(), 1);
        assert_eq!(iflow.end_events[0].name, "End");
        assert_eq!(iflow.sequence_flows.len(), 3);

        let first = iflow.component_by_id("a").unwrap();
        let last = iflow.component_by_id("b").unwrap();
        assert_eq!(iflow.start_event.outgoing, first.incoming);
        assert_eq!(iflow.end_events[0].incoming, last.outgoing);
    }

    #[test]
    fn test_phase4_timer_start_without_sender() {
        let mut dto = mock_metadata_dto(vec![modifier("a")], vec![]);
        dto.iflow_info.schedule = Some(ScheduleDto::Interval { minutes: 15 });
        let iflow = Iflow::try_from(dto).unwrap();
        assert_eq!(iflow.start_event.kind, StartEventKind::Timer(Schedule::Interval { minutes: 15 }));

        let mut dto = mock_metadata_dto(vec![modifier("a")], vec![]);
        dto.endpoints = vec![mock_endpoint("in", EndpointRoleDto::Sender, "HTTPS")];
        let iflow = Iflow::try_from(dto).unwrap();
        assert_eq!(iflow.start_event.kind, StartEventKind::Message);
    }

    #[test]
    fn test_phase4_empty_flow_connects_start_to_end() {
        let iflow = Iflow::try_from(mock_metadata_dto(vec![], vec![])).unwrap();
        assert_eq!(iflow.sequence_flows.len(), 1);
        assert_eq!(iflow.sequence_flows[0].source, iflow.start_event.element_id);
        assert_eq!(iflow.sequence_flows[0].target, iflow.end_events[0].element_id);
    }

    #[test]
    fn test_phase4_multiple_entries_rejected() {
        // `b` and `c` both lack incoming flows
        let dto = mock_metadata_dto(vec![modifier("a"), modifier("b"), modifier("c")], vec![flow("f1", "b", "a")]);
        let result = Iflow::try_from(dto);
        assert!(matches!(result, Err(Error::GraphInvariant(ref m)) if m.contains("b, c")));
    }

    #[test]
    fn test_phase5_unreachable_cycle_rejected() {
        // `a` is the single entry; `b` and `c` only feed each other
        let dto = mock_metadata_dto(
            vec![modifier("a"), modifier("b"), modifier("c")],
            vec![flow("f1", "b", "c"), flow("f2", "c", "b")],
        );
        let result = Iflow::try_from(dto);
        assert!(matches!(result, Err(Error::GraphInvariant(ref m)) if m.contains("not reachable") && m.contains("b, c")));
    }

    #[test]
    fn test_phase5_router_branches_get_end_events() {
        let iflow = Iflow::try_from(router_dto()).unwrap();

        assert_eq!(iflow.end_events.len(), 2);
        assert_eq!(iflow.end_events[0].name, "End 1");
        assert_eq!(iflow.end_events[1].name, "End 2");

        let router = iflow.component_by_id("route").unwrap();
        let ComponentKind::Router { default_flow: Some(default_flow) } = &router.kind else {
            panic!("router default not resolved");
        };
        let default = iflow.sequence_flow(default_flow).unwrap();
        assert_eq!(default.metadata_id.as_deref(), Some("f3"));
        assert!(default.is_default);
        assert_eq!(default.name.as_deref(), Some("Default"));

        let conditional = iflow.sequence_flows.iter().find(|f| f.metadata_id.as_deref() == Some("f2")).unwrap();
        assert_eq!(conditional.name.as_deref(), Some("Route 1"));
        assert!(!conditional.is_default);
    }

    #[test]
    fn test_phase5_router_needs_a_default() {
        let mut dto = router_dto();
        dto.sequence_flows[2].condition = Some("${header.kind} = 'B'".to_string());
        assert!(matches!(Iflow::try_from(dto), Err(Error::GraphInvariant(ref m)) if m.contains("default")));
    }

    #[test]
    fn test_phase5_explicit_default_wins() {
        let mut dto = router_dto();
        dto.sequence_flows[1].default = true;
        dto.sequence_flows[2].condition = Some("${header.kind} = 'B'".to_string());
        let iflow = Iflow::try_from(dto).unwrap();

        let default = iflow.sequence_flows.iter().find(|f| f.is_default).unwrap();
        assert_eq!(default.metadata_id.as_deref(), Some("f2"));
    }

    #[test]
    fn test_phase5_only_routers_branch() {
        let dto = mock_metadata_dto(
            vec![modifier("a"), modifier("b"), modifier("c")],
            vec![flow("f1", "a", "b"), flow("f2", "a", "c")],
        );
        assert!(matches!(Iflow::try_from(dto), Err(Error::GraphInvariant(ref m)) if m.contains("only routers")));
    }

    #[test]
    fn test_phase5_join_is_rejected() {
        let mut dto = router_dto();
        dto.components.push(modifier("join"));
        dto.sequence_flows.push(flow("f4", "a", "join"));
        dto.sequence_flows.push(flow("f5", "b", "join"));
        assert!(matches!(Iflow::try_from(dto), Err(Error::GraphInvariant(ref m)) if m.contains("incoming")));
    }

    #[test]
    fn test_phase5_message_flows() {
        let mut dto = mock_metadata_dto(
            vec![modifier("a"), mock_component("call", "request_reply", json!({ "receiver": "crm" }))],
            vec![],
        );
        dto.endpoints = vec![
            mock_endpoint("in", EndpointRoleDto::Sender, "HTTPS"),
            mock_endpoint("crm", EndpointRoleDto::Receiver, "OData"),
            mock_endpoint("archive", EndpointRoleDto::Receiver, "SFTP"),
        ];
        let iflow = Iflow::try_from(dto).unwrap();

        let connections: Vec<(&str, &str, &str)> = iflow
            .message_flows
            .iter()
            .map(|m| (m.source.as_str(), m.target.as_str(), m.name.as_str()))
            .collect();
        assert_eq!(
            connections,
            vec![
                ("Participant_1", "StartEvent_1", "HTTPS"),
                ("ServiceTask_1", "Participant_2", "OData"),
                ("EndEvent_1", "Participant_3", "SFTP"),
            ]
        );
    }

    #[test]
    fn test_phase5_unknown_receiver() {
        let dto =
            mock_metadata_dto(vec![mock_component("call", "send", json!({ "receiver": "nowhere" }))], vec![]);
        let result = Iflow::try_from(dto);
        assert!(matches!(result, Err(Error::UnknownEndpointReference { ref id, .. }) if id == "nowhere"));
    }

    #[test]
    fn test_phase6_externalized_parameters() {
        let mut dto = mock_metadata_dto(
            vec![mock_component("call", "send", json!({ "receiver": "erp" }))],
            vec![],
        );
        let mut erp = mock_endpoint("erp", EndpointRoleDto::Receiver, "HTTP");
        erp.properties.insert("address".to_string(), json!("https://{{ErpHost}}/{{ErpPath}}"));
        dto.endpoints = vec![erp];
        dto.iflow_info.parameters.insert("ErpHost".to_string(), "erp.internal".to_string());

        let iflow = Iflow::try_from(dto).unwrap();

        let names: Vec<&str> = iflow.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["ErpHost", "ErpPath"]);
        assert_eq!(iflow.parameters[0].value, "erp.internal");
        assert_eq!(iflow.parameters[1].value, "");
        assert!(iflow.parameters[0].referenced_by.contains("MessageFlow_1"));
    }

    #[test]
    fn test_phase6_conflicting_resources() {
        let dto = mock_metadata_dto(
            vec![
                mock_component("s1", "groovy_script", json!({ "script_file": "x.groovy", "script_content": "a" })),
                mock_component("s2", "groovy_script", json!({ "script_file": "x.groovy", "script_content": "b" })),
            ],
            vec![],
        );
        assert!(matches!(Iflow::try_from(dto), Err(Error::ModelConstructionError(ref m)) if m.contains("x.groovy")));
    }

    #[test]
    fn test_shared_resource_is_shipped_once() {
        let dto = mock_metadata_dto(
            vec![
                mock_component("s1", "groovy_script", json!({ "script_file": "x.groovy", "script_content": "a" })),
                mock_component("s2", "groovy_script", json!({ "script_file": "x.groovy", "script_content": "a" })),
            ],
            vec![],
        );
        let iflow = Iflow::try_from(dto).unwrap();
        assert_eq!(iflow.resources().len(), 1);
    }

    // --- LAYOUT ---

    #[test]
    fn test_layout_columns_follow_depth() {
        let iflow = Iflow::try_from(mock_metadata_dto(vec![modifier("a"), modifier("b")], vec![])).unwrap();
        let diagram = layout::compute(&iflow, &GeneratorConfig::default().layout);

        // pool + start + 2 components + end
        assert_eq!(diagram.shapes.len(), 5);
        assert_eq!(diagram.edges.len(), iflow.sequence_flows.len());

        let x = |id: &str| diagram.shape(id).unwrap().bounds.center().x;
        assert!(x("StartEvent_1") < x("CallActivity_1"));
        assert!(x("CallActivity_1") < x("CallActivity_2"));
        assert!(x("CallActivity_2") < x("EndEvent_1"));

        let y = |id: &str| diagram.shape(id).unwrap().bounds.center().y;
        assert_eq!(y("StartEvent_1"), y("EndEvent_1"));
    }

    #[test]
    fn test_layout_router_branches_use_rows() {
        let iflow = Iflow::try_from(router_dto()).unwrap();
        let diagram = layout::compute(&iflow, &GeneratorConfig::default().layout);

        let a = diagram.shape(iflow.component_by_id("a").unwrap().element_id.as_str()).unwrap();
        let b = diagram.shape(iflow.component_by_id("b").unwrap().element_id.as_str()).unwrap();
        assert_eq!(a.bounds.x, b.bounds.x);
        assert!(b.bounds.y > a.bounds.y);

        // The branch changing rows gets an elbow point
        let to_b = iflow.sequence_flows.iter().find(|f| f.metadata_id.as_deref() == Some("f3")).unwrap();
        let edge = diagram.edges.iter().find(|e| e.flow_id == to_b.element_id).unwrap();
        assert_eq!(edge.waypoints.len(), 3);
    }

    #[test]
    fn test_layout_participants_outside_pool() {
        let mut dto = mock_metadata_dto(vec![mock_component("call", "send", json!({ "receiver": "erp" }))], vec![]);
        dto.endpoints = vec![
            mock_endpoint("in", EndpointRoleDto::Sender, "HTTPS"),
            mock_endpoint("erp", EndpointRoleDto::Receiver, "HTTP"),
        ];
        let iflow = Iflow::try_from(dto).unwrap();
        let diagram = layout::compute(&iflow, &GeneratorConfig::default().layout);

        let pool = diagram.shape("Participant_Process_1").unwrap().bounds;
        let sender = diagram.shape("Participant_1").unwrap().bounds;
        let receiver = diagram.shape("Participant_2").unwrap().bounds;
        assert!(sender.x + sender.width < pool.x);
        assert!(receiver.x > pool.x + pool.width);
        assert_eq!(diagram.edges.len(), iflow.sequence_flows.len() + iflow.message_flows.len());
    }
}
