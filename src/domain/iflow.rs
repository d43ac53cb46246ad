use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::Path;

use crate::api::metadata_dto::{IflowInfoDto, IflowMetadataDto};
use crate::domain::component::{Component, ComponentKind};
use crate::domain::endpoint::{EndpointRole, MessageFlow, Participant};
use crate::domain::event::{EndEvent, Schedule, StartEvent, StartEventKind, map_schedule};
use crate::domain::id::{IdAllocator, IdRegistry, sanitize_id};
use crate::domain::parameters::{Parameter, collect_parameters};
use crate::domain::resource::Resource;
use crate::domain::sequence_flow::SequenceFlow;
use crate::error::{Error, Result};
use crate::loader::parser::{parse_json_file, resolve_resource_paths};

pub const COLLABORATION_ID: &str = "Collaboration_1";
pub const PROCESS_ID: &str = "Process_1";
pub const PROCESS_PARTICIPANT_ID: &str = "Participant_Process_1";

#[derive(Debug, Clone, PartialEq)]
pub struct IflowInfo {
    /// Artifact id, also the bundle symbolic name.
    pub id: String,
    pub name: String,
    pub description: String,
    /// `None` means the configured default version.
    pub version: Option<String>,
    pub schedule: Option<Schedule>,
    pub parameter_defaults: BTreeMap<String, String>,
}

/// A validated integration flow, ready to be written as an iFlow.
#[derive(Debug, Clone)]
pub struct Iflow {
    pub info: IflowInfo,

    pub participants: Vec<Participant>,

    /// In metadata declaration order, which is also the XML order.
    pub components: Vec<Component>,

    pub start_event: StartEvent,
    pub end_events: Vec<EndEvent>,

    pub sequence_flows: Vec<SequenceFlow>,
    pub message_flows: Vec<MessageFlow>,

    pub parameters: Vec<Parameter>,

    /// Metadata ids of components and endpoints mapped to element ids.
    pub ids: IdRegistry,
}

/// Constructs a complete Iflow from an IflowMetadataDto.
///
/// This is the main entry point for turning the metadata into the internal
/// model. Start and end events are synthesized here and never come from the
/// metadata.
impl TryFrom<IflowMetadataDto> for Iflow {
    type Error = Error;

    fn try_from(dto: IflowMetadataDto) -> Result<Self> {
        let mut ids = IdAllocator::new();

        // Phase 0: General information about the flow
        let info = Self::build_info(&dto.iflow_info)?;
        log::debug!("Building iFlow '{}' ({}).", info.name, info.id);

        // Phase 1: Components, in declaration order
        let (mut components, mut registry) = Self::generate_components(&dto, &mut ids)?;

        // Phase 2: Sender and receiver participants
        let participants = Self::build_participants(&dto, &mut registry, &mut ids)?;

        // Phase 3: User supplied (or implicit) sequence flows
        let mut sequence_flows = Self::resolve_sequence_flows(&dto, &components, &registry, &mut ids)?;

        // Phase 4: Start/end events and their flows, then the adjacency lists
        let (mut start_event, mut end_events) =
            Self::synthesize_events(&info, &participants, &components, &mut sequence_flows, &mut ids)?;
        Self::populate_adjacency_lists(&mut components, &mut start_event, &mut end_events, &sequence_flows);

        // Phase 5: Graph invariants, router defaults and adapter connections
        Self::validate_graph(&mut components, &mut sequence_flows, &start_event)?;
        let message_flows = Self::build_message_flows(&components, &participants, &start_event, &end_events, &mut ids)?;

        // Phase 6: Externalized parameters and shipped resources
        let parameters = Self::collect_externalized_parameters(&info, &components, &message_flows);
        Self::check_resources(&components, &participants)?;

        log::debug!(
            "iFlow '{}' has {} components, {} sequence flows, {} message flows, {} parameters.",
            info.id,
            components.len(),
            sequence_flows.len(),
            message_flows.len(),
            parameters.len()
        );

        Ok(Iflow {
            info,
            participants,
            components,
            start_event,
            end_events,
            sequence_flows,
            message_flows,
            parameters,
            ids: registry,
        })
    }
}

// Helper functions for the **TryFrom** implementation
impl Iflow {
    /// **Phase 0: Build IflowInfo**
    ///
    /// The artifact id comes from `iflow_info.id`, or from the name when absent.
    /// Name, id and version end up in manifest headers and must be single line.
    pub fn build_info(dto: &IflowInfoDto) -> Result<IflowInfo> {
        let single_line = [("name", Some(dto.name.as_str())), ("id", dto.id.as_deref()), ("version", dto.version.as_deref())];
        for (field, value) in single_line {
            if let Some(value) = value.filter(|v| v.chars().any(char::is_control)) {
                log::error!("iflow_info.{} contains control characters: {:?}", field, value);
                return Err(Error::ModelConstructionError(format!(
                    "iflow_info.{} must be a single line without control characters, got {:?}",
                    field, value
                )));
            }
        }

        let raw_id = dto.id.as_deref().unwrap_or(&dto.name);
        let id = sanitize_id(raw_id);
        if id.is_empty() {
            log::error!("iFlow id '{}' has no usable characters.", raw_id);
            return Err(Error::ModelConstructionError(format!(
                "iflow_info needs a name or id containing letters or digits, got '{}'",
                raw_id
            )));
        }

        let name = if dto.name.trim().is_empty() { id.clone() } else { dto.name.trim().to_string() };

        Ok(IflowInfo {
            id,
            name,
            description: dto.description.clone().unwrap_or_default(),
            version: dto.version.clone(),
            schedule: dto.schedule.as_ref().map(map_schedule),
            parameter_defaults: dto.parameters.clone(),
        })
    }

    /// **Phase 1: Generate Components**
    ///
    /// Builds every component and registers its metadata id. Ids must be unique.
    pub fn generate_components(dto: &IflowMetadataDto, ids: &mut IdAllocator) -> Result<(Vec<Component>, IdRegistry)> {
        let mut registry = IdRegistry::new();
        let mut components = Vec::with_capacity(dto.components.len());

        for component_dto in &dto.components {
            let component = Component::from_dto(component_dto, ids)?;
            if !registry.register(&component.id, &component.element_id) {
                log::error!("Component id '{}' is used more than once.", component.id);
                return Err(Error::DuplicateId(component.id));
            }
            components.push(component);
        }

        Ok((components, registry))
    }

    /// **Phase 2: Build Participants**
    ///
    /// Endpoint ids share the id space with components. At most one sender exists.
    pub fn build_participants(
        dto: &IflowMetadataDto,
        registry: &mut IdRegistry,
        ids: &mut IdAllocator,
    ) -> Result<Vec<Participant>> {
        let mut participants = Vec::with_capacity(dto.endpoints.len());

        for endpoint_dto in &dto.endpoints {
            let participant = Participant::from_dto(endpoint_dto, ids)?;
            if !registry.register(&participant.id, &participant.element_id) {
                log::error!("Endpoint id '{}' is already in use.", participant.id);
                return Err(Error::DuplicateId(participant.id));
            }
            participants.push(participant);
        }

        let senders: Vec<&str> = participants
            .iter()
            .filter(|p| p.role == EndpointRole::Sender)
            .map(|p| p.id.as_str())
            .collect();
        if senders.len() > 1 {
            return Err(Error::ModelConstructionError(format!(
                "an iFlow has at most one sender endpoint, found: {}",
                senders.join(", ")
            )));
        }

        Ok(participants)
    }

    /// **Phase 3: Resolve Sequence Flows**
    ///
    /// Maps the metadata flows onto element ids. Without any flows the
    /// components are chained in declaration order.
    pub fn resolve_sequence_flows(
        dto: &IflowMetadataDto,
        components: &[Component],
        registry: &IdRegistry,
        ids: &mut IdAllocator,
    ) -> Result<Vec<SequenceFlow>> {
        if dto.sequence_flows.is_empty() {
            log::debug!("No sequence flows given, chaining {} components in order.", components.len());
            return Ok(components
                .windows(2)
                .map(|pair| SequenceFlow::new(ids.next("SequenceFlow"), &pair[0].element_id, &pair[1].element_id))
                .collect());
        }

        let mut flows = Vec::with_capacity(dto.sequence_flows.len());
        let mut seen_ids = HashSet::new();

        for (index, flow_dto) in dto.sequence_flows.iter().enumerate() {
            let display_id = flow_dto.id.clone().unwrap_or_else(|| format!("#{}", index + 1));

            if let Some(id) = &flow_dto.id {
                if !seen_ids.insert(id.clone()) || registry.contains(id) {
                    return Err(Error::DuplicateId(id.clone()));
                }
            }

            let source = resolve_component(components, registry, &flow_dto.source, &display_id)?;
            let target = resolve_component(components, registry, &flow_dto.target, &display_id)?;

            if source == target {
                return Err(Error::GraphInvariant(format!(
                    "sequence flow '{}' connects '{}' to itself",
                    display_id, flow_dto.source
                )));
            }

            let mut flow = SequenceFlow::new(ids.next("SequenceFlow"), &source, &target);
            flow.metadata_id = flow_dto.id.clone();
            flow.name = flow_dto.name.clone();
            flow.condition = flow_dto.condition.clone().filter(|c| !c.trim().is_empty());
            flow.is_default = flow_dto.default;
            flows.push(flow);
        }

        Ok(flows)
    }

    /// **Phase 4: Synthesize Start and End Events**
    ///
    /// The start event connects to the single entry component (no incoming
    /// flow). Every non-router component without outgoing flow gets its own
    /// end event. The start event is a message start when a sender exists,
    /// a timer start otherwise.
    pub fn synthesize_events(
        info: &IflowInfo,
        participants: &[Participant],
        components: &[Component],
        flows: &mut Vec<SequenceFlow>,
        ids: &mut IdAllocator,
    ) -> Result<(StartEvent, Vec<EndEvent>)> {
        let has_sender = participants.iter().any(|p| p.role == EndpointRole::Sender);
        let start_event = if has_sender {
            StartEvent {
                element_id: ids.next("StartEvent"),
                name: "Start".to_string(),
                kind: StartEventKind::Message,
                outgoing: Vec::new(),
            }
        } else {
            let schedule = info.schedule.clone().unwrap_or(Schedule::Once);
            log::info!("No sender endpoint, using a timer start event ({:?}).", schedule);
            StartEvent {
                element_id: ids.next("StartEvent"),
                name: "Start Timer".to_string(),
                kind: StartEventKind::Timer(schedule),
                outgoing: Vec::new(),
            }
        };

        let (entries, sinks) = {
            let has_incoming: HashSet<&str> = flows.iter().map(|f| f.target.as_str()).collect();
            let has_outgoing: HashSet<&str> = flows.iter().map(|f| f.source.as_str()).collect();

            let entries: Vec<&Component> =
                components.iter().filter(|c| !has_incoming.contains(c.element_id.as_str())).collect();
            let sinks: Vec<String> = components
                .iter()
                .filter(|c| !c.kind.is_router() && !has_outgoing.contains(c.element_id.as_str()))
                .map(|c| c.element_id.clone())
                .collect();
            (entries, sinks)
        };

        let entry = match entries.as_slice() {
            [] if components.is_empty() => None,
            [entry] => Some(entry.element_id.clone()),
            [] => {
                return Err(Error::GraphInvariant(
                    "no entry component: every component has an incoming sequence flow".to_string(),
                ));
            }
            many => {
                let names: Vec<&str> = many.iter().map(|c| c.id.as_str()).collect();
                log::error!("Multiple entry components: {}.", names.join(", "));
                return Err(Error::GraphInvariant(format!(
                    "expected exactly one entry component, found {}: {}",
                    names.len(),
                    names.join(", ")
                )));
            }
        };

        let mut end_events = Vec::new();
        let sink_count = sinks.len().max(1);
        let mut new_end_event = |ids: &mut IdAllocator| {
            let number = end_events.len() + 1;
            let event = EndEvent {
                element_id: ids.next("EndEvent"),
                name: if sink_count == 1 { "End".to_string() } else { format!("End {}", number) },
                incoming: Vec::new(),
            };
            let id = event.element_id.clone();
            end_events.push(event);
            id
        };

        match entry {
            Some(entry) => {
                flows.push(SequenceFlow::new(ids.next("SequenceFlow"), &start_event.element_id, &entry));
                for sink in &sinks {
                    let end_id = new_end_event(ids);
                    flows.push(SequenceFlow::new(ids.next("SequenceFlow"), sink, &end_id));
                }
            }
            None => {
                log::warn!("iFlow '{}' has no components, connecting start and end directly.", info.id);
                let end_id = new_end_event(ids);
                flows.push(SequenceFlow::new(ids.next("SequenceFlow"), &start_event.element_id, &end_id));
            }
        }

        Ok((start_event, end_events))
    }

    /// Fills the incoming/outgoing lists of every flow node from the flows.
    pub fn populate_adjacency_lists(
        components: &mut [Component],
        start_event: &mut StartEvent,
        end_events: &mut [EndEvent],
        flows: &[SequenceFlow],
    ) {
        for flow in flows {
            if flow.source == start_event.element_id {
                start_event.outgoing.push(flow.element_id.clone());
            }
            if let Some(end) = end_events.iter_mut().find(|e| e.element_id == flow.target) {
                end.incoming.push(flow.element_id.clone());
            }
            for component in components.iter_mut() {
                if component.element_id == flow.source {
                    component.outgoing.push(flow.element_id.clone());
                }
                if component.element_id == flow.target {
                    component.incoming.push(flow.element_id.clone());
                }
            }
        }
    }

    /// **Phase 5: Validate Graph**
    ///
    /// - every component has exactly one incoming flow
    /// - only routers branch; a router has at least two routes and exactly one default
    /// - every component is reachable from the start event
    pub fn validate_graph(
        components: &mut [Component],
        flows: &mut [SequenceFlow],
        start_event: &StartEvent,
    ) -> Result<()> {
        for component in components.iter() {
            if component.incoming.len() != 1 {
                return Err(Error::GraphInvariant(format!(
                    "component '{}' has {} incoming sequence flows, expected exactly one",
                    component.id,
                    component.incoming.len()
                )));
            }
            if !component.kind.is_router() && component.outgoing.len() != 1 {
                return Err(Error::GraphInvariant(format!(
                    "component '{}' has {} outgoing sequence flows, only routers may branch",
                    component.id,
                    component.outgoing.len()
                )));
            }
        }

        for component in components.iter_mut() {
            if let ComponentKind::Router { default_flow } = &mut component.kind {
                *default_flow = Some(resolve_router_routes(&component.id, &component.outgoing, flows)?);
            }
        }

        for flow in flows.iter() {
            let from_router = components.iter().any(|c| c.kind.is_router() && c.element_id == flow.source);
            if !from_router && (flow.condition.is_some() || flow.is_default) {
                log::warn!("Sequence flow '{}' does not leave a router; its condition is ignored.", flow.display_id());
            }
        }

        // Breadth first walk from the start event
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(start_event.element_id.as_str());
        while let Some(node) = queue.pop_front() {
            if !visited.insert(node) {
                continue;
            }
            for flow in flows.iter().filter(|f| f.source == node) {
                queue.push_back(flow.target.as_str());
            }
        }

        let unreachable: Vec<&str> = components
            .iter()
            .filter(|c| !visited.contains(c.element_id.as_str()))
            .map(|c| c.id.as_str())
            .collect();
        if !unreachable.is_empty() {
            log::error!("Unreachable components: {}.", unreachable.join(", "));
            return Err(Error::GraphInvariant(format!(
                "components not reachable from the start event (cycle?): {}",
                unreachable.join(", ")
            )));
        }

        Ok(())
    }

    /// Connects sender, request-reply/send receivers and the remaining receivers.
    ///
    /// Receivers no step calls are attached to the first end event.
    pub fn build_message_flows(
        components: &[Component],
        participants: &[Participant],
        start_event: &StartEvent,
        end_events: &[EndEvent],
        ids: &mut IdAllocator,
    ) -> Result<Vec<MessageFlow>> {
        let mut message_flows = Vec::new();
        let mut connected: HashSet<&str> = HashSet::new();

        let new_flow = |ids: &mut IdAllocator, participant: &Participant, source: &str, target: &str| MessageFlow {
            element_id: ids.next("MessageFlow"),
            name: participant.adapter.display_name().to_string(),
            source: source.to_string(),
            target: target.to_string(),
            properties: participant.adapter_properties.clone(),
        };

        for sender in participants.iter().filter(|p| p.role == EndpointRole::Sender) {
            message_flows.push(new_flow(ids, sender, &sender.element_id, &start_event.element_id));
        }

        for component in components {
            let Some(receiver_id) = component.kind.receiver() else {
                continue;
            };
            let receiver = participants
                .iter()
                .find(|p| p.id == receiver_id && p.role == EndpointRole::Receiver)
                .ok_or_else(|| {
                    log::error!("Component '{}' calls unknown receiver '{}'.", component.id, receiver_id);
                    Error::UnknownEndpointReference { component: component.id.clone(), id: receiver_id.to_string() }
                })?;
            message_flows.push(new_flow(ids, receiver, &component.element_id, &receiver.element_id));
            connected.insert(receiver.id.as_str());
        }

        for receiver in participants.iter().filter(|p| p.role == EndpointRole::Receiver) {
            if connected.contains(receiver.id.as_str()) {
                continue;
            }
            let end_event = end_events.first().ok_or_else(|| {
                Error::GraphInvariant(format!("receiver '{}' has no end event to attach to", receiver.id))
            })?;
            log::debug!("Receiver '{}' is attached to '{}'.", receiver.id, end_event.element_id);
            message_flows.push(new_flow(ids, receiver, &end_event.element_id, &receiver.element_id));
        }

        Ok(message_flows)
    }

    /// **Phase 6: Collect Externalized Parameters**
    pub fn collect_externalized_parameters(
        info: &IflowInfo,
        components: &[Component],
        message_flows: &[MessageFlow],
    ) -> Vec<Parameter> {
        let component_refs = components
            .iter()
            .flat_map(|c| c.properties.values().map(move |v| (c.element_id.as_str(), v)));
        let message_flow_refs = message_flows
            .iter()
            .flat_map(|m| m.properties.values().map(move |v| (m.element_id.as_str(), v)));

        collect_parameters(component_refs.chain(message_flow_refs), &info.parameter_defaults)
    }

    /// Two resources may share a package path only when their content matches.
    pub fn check_resources(components: &[Component], participants: &[Participant]) -> Result<()> {
        let mut by_path: HashMap<String, &Resource> = HashMap::new();
        let all = components
            .iter()
            .filter_map(|c| c.resource.as_ref())
            .chain(participants.iter().flat_map(|p| p.resources.iter()));

        for resource in all {
            let path = resource.package_path();
            match by_path.get(&path) {
                Some(existing) if existing.content != resource.content => {
                    return Err(Error::ModelConstructionError(format!(
                        "resource '{}' is defined twice with different content",
                        path
                    )));
                }
                Some(_) => {}
                None => {
                    by_path.insert(path, resource);
                }
            }
        }
        Ok(())
    }
}

fn resolve_component(components: &[Component], registry: &IdRegistry, id: &str, flow: &str) -> Result<String> {
    let is_component = components.iter().any(|c| c.id == id);
    match registry.element_id(id) {
        Some(element_id) if is_component => Ok(element_id.to_string()),
        _ => {
            log::error!("Sequence flow '{}' references unknown component '{}'.", flow, id);
            Err(Error::UnknownComponentReference { flow: flow.to_string(), id: id.to_string() })
        }
    }
}

/// Marks the default route of a router and returns its flow id.
///
/// An explicit `default: true` wins; otherwise the single route without a
/// condition is the default. All other routes need a condition.
fn resolve_router_routes(router_id: &str, outgoing: &[String], flows: &mut [SequenceFlow]) -> Result<String> {
    if outgoing.len() < 2 {
        return Err(Error::GraphInvariant(format!(
            "router '{}' has {} routes, expected at least two",
            router_id,
            outgoing.len()
        )));
    }

    let routes: Vec<usize> = flows
        .iter()
        .enumerate()
        .filter(|(_, f)| outgoing.contains(&f.element_id))
        .map(|(i, _)| i)
        .collect();

    let explicit: Vec<usize> = routes.iter().copied().filter(|&i| flows[i].is_default).collect();
    let default_index = match explicit.as_slice() {
        [single] => *single,
        [] => {
            let unconditioned: Vec<usize> = routes.iter().copied().filter(|&i| flows[i].condition.is_none()).collect();
            match unconditioned.as_slice() {
                [single] => *single,
                _ => {
                    return Err(Error::GraphInvariant(format!(
                        "router '{}' needs exactly one default route (a route without condition or marked default)",
                        router_id
                    )));
                }
            }
        }
        _ => {
            return Err(Error::GraphInvariant(format!("router '{}' has more than one default route", router_id)));
        }
    };

    for (number, &i) in routes.iter().enumerate() {
        let flow = &mut flows[i];
        flow.is_default = i == default_index;
        if !flow.is_default && flow.condition.is_none() {
            return Err(Error::GraphInvariant(format!(
                "route '{}' of router '{}' has no condition",
                flow.display_id(),
                router_id
            )));
        }
        if flow.name.is_none() {
            flow.name = Some(if flow.is_default { "Default".to_string() } else { format!("Route {}", number + 1) });
        }
    }

    Ok(flows[default_index].element_id.clone())
}

impl Iflow {
    /// Reads the metadata file, loads referenced resources and builds the model.
    pub fn load(file_path: impl AsRef<Path>) -> Result<Iflow> {
        let file_path = file_path.as_ref();
        let mut dto: IflowMetadataDto = parse_json_file(file_path)?;
        log::info!("Metadata '{}' parsed successfully.", file_path.display());

        let base_dir = file_path.parent().unwrap_or_else(|| Path::new("."));
        resolve_resource_paths(&mut dto, base_dir)?;

        let iflow = Iflow::try_from(dto)?;
        log::info!("iFlow model '{}' constructed successfully.", iflow.info.id);
        Ok(iflow)
    }

    pub fn component(&self, element_id: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.element_id == element_id)
    }

    /// Looks a component up by its metadata id.
    pub fn component_by_id(&self, id: &str) -> Option<&Component> {
        self.ids.element_id(id).and_then(|element_id| self.component(element_id))
    }

    pub fn participant(&self, element_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.element_id == element_id)
    }

    pub fn sequence_flow(&self, element_id: &str) -> Option<&SequenceFlow> {
        self.sequence_flows.iter().find(|f| f.element_id == element_id)
    }

    pub fn end_event(&self, element_id: &str) -> Option<&EndEvent> {
        self.end_events.iter().find(|e| e.element_id == element_id)
    }

    /// Sequence flows leaving `element_id`, in flow order.
    pub fn flows_from<'a>(&'a self, element_id: &'a str) -> impl Iterator<Item = &'a SequenceFlow> + 'a {
        self.sequence_flows.iter().filter(move |f| f.source == element_id)
    }

    /// Resources to ship, without duplicates, in component then endpoint order.
    pub fn resources(&self) -> Vec<&Resource> {
        let mut seen = HashSet::new();
        self.components
            .iter()
            .filter_map(|c| c.resource.as_ref())
            .chain(self.participants.iter().flat_map(|p| p.resources.iter()))
            .filter(|r| seen.insert(r.package_path()))
            .collect()
    }
}
