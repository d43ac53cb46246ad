use std::path::PathBuf;

use iflow_generator::{
    domain::{component::ComponentKind, endpoint::EndpointRole, event::StartEventKind, iflow::Iflow},
    error::{Error, Result},
};

fn data_path(file: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(file)
}

#[test]
fn test_load_order_replication() {
    let iflow: Result<Iflow> = Iflow::load(data_path("order_replication.json"));
    let iflow = iflow.expect("order_replication.json should load");

    assert_eq!(iflow.info.id, "Order_Replication");
    assert_eq!(iflow.info.version.as_deref(), Some("1.2.0"));
    assert_eq!(iflow.start_event.kind, StartEventKind::Message);

    // Components keep declaration order and SAP style ids
    let element_ids: Vec<&str> = iflow.components.iter().map(|c| c.element_id.as_str()).collect();
    assert_eq!(
        element_ids,
        vec!["CallActivity_1", "CallActivity_2", "ServiceTask_1", "CallActivity_3", "ServiceTask_2"]
    );

    // Implicit chain: 4 between components + start + end
    assert_eq!(iflow.sequence_flows.len(), 6);
    assert_eq!(iflow.end_events.len(), 1);
    for component in &iflow.components {
        assert_eq!(component.incoming.len(), 1, "{} incoming", component.id);
        assert_eq!(component.outgoing.len(), 1, "{} outgoing", component.id);
    }

    // The script was read from scripts/enrich.groovy
    let enrich = iflow.component_by_id("enrich").unwrap();
    let script = enrich.resource.as_ref().unwrap();
    assert_eq!(script.package_path(), "src/main/resources/script/Enrich_Order.groovy");
    assert!(script.content.contains("def Message enrichOrder(Message message)"));
    assert_eq!(enrich.properties.get("scriptFunction"), Some("enrichOrder"));

    let transform = iflow.component_by_id("transform").unwrap();
    assert!(matches!(&transform.kind, ComponentKind::XsltMapping { mapping_name } if mapping_name == "OrderToArchive"));

    // Adapter aliases resolve to the adapter's own keys
    let sender = iflow.participants.iter().find(|p| p.role == EndpointRole::Sender).unwrap();
    assert_eq!(sender.adapter_properties.get("urlPath"), Some("/orders/replicate"));
    let crm = iflow.participants.iter().find(|p| p.id == "crm").unwrap();
    assert_eq!(crm.adapter_properties.get("resourcePath"), Some("A_SalesOrder"));
    assert_eq!(crm.resources.len(), 1);

    assert_eq!(iflow.message_flows.len(), 3);

    let parameters: Vec<(&str, &str)> =
        iflow.parameters.iter().map(|p| (p.name.as_str(), p.value.as_str())).collect();
    assert_eq!(parameters, vec![("ArchiveHost", "sftp.example.com"), ("CrmHost", "crm.example.com")]);

    let resources: Vec<String> = iflow.resources().iter().map(|r| r.package_path()).collect();
    assert_eq!(
        resources,
        vec![
            "src/main/resources/script/Enrich_Order.groovy",
            "src/main/resources/mapping/OrderToArchive.xsl",
            "src/main/resources/xsd/crm.xsd",
        ]
    );
}

#[test]
fn test_load_router_flow() {
    let iflow = Iflow::load(data_path("router_flow.json")).unwrap();

    assert_eq!(iflow.info.id, "PriorityRouter");
    assert_eq!(iflow.end_events.len(), 2);

    let router = iflow.component_by_id("route").unwrap();
    assert_eq!(router.name, "By Priority");
    assert_eq!(router.outgoing.len(), 2);

    let ComponentKind::Router { default_flow: Some(default_flow) } = &router.kind else {
        panic!("router without default");
    };
    let default = iflow.sequence_flow(default_flow).unwrap();
    assert_eq!(default.target, iflow.component_by_id("to_json").unwrap().element_id);

    let sender = iflow.participants.iter().find(|p| p.role == EndpointRole::Sender).unwrap();
    assert_eq!(sender.adapter_properties.get("serviceDefinitionUrl"), Some("/wsdl/orders_in.wsdl"));
    assert!(sender.resources[0].content.contains("OrderService"));
}

#[test]
fn test_unknown_component_reference_is_reported() {
    let result = Iflow::load(data_path("invalid_unknown_component.json"));

    match result {
        Err(Error::UnknownComponentReference { flow, id }) => {
            assert_eq!(flow, "to_ghost");
            assert_eq!(id, "ghost");
        }
        other => panic!("expected UnknownComponentReference, got {:?}", other.map(|i| i.info.id)),
    }
}

#[test]
fn test_missing_file_and_malformed_json() {
    assert!(matches!(Iflow::load(data_path("does_not_exist.json")), Err(Error::IoError(_))));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ \"iflow_info\": ").unwrap();
    assert!(matches!(Iflow::load(&path), Err(Error::DeserializationError(_))));
}

#[test]
fn test_missing_script_path_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flow.json");
    std::fs::write(
        &path,
        r#"{ "iflow_info": { "name": "X" },
             "components": [ { "id": "s", "type": "groovy_script", "config": { "script_path": "nope.groovy" } } ] }"#,
    )
    .unwrap();

    assert!(matches!(Iflow::load(&path), Err(Error::IoError(_))));
}
