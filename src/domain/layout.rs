//! Places the flow nodes of an iFlow on a grid for the BPMN diagram.
//!
//! Columns follow the breadth first depth from the start event. The first
//! route of a router stays on its row, every further route opens a new row
//! below. Participants sit outside the integration process pool: the sender
//! on the left, receivers stacked on the right.

use std::collections::{HashMap, VecDeque};

use crate::config::LayoutConfig;
use crate::domain::component::BpmnElementType;
use crate::domain::endpoint::EndpointRole;
use crate::domain::iflow::{Iflow, PROCESS_PARTICIPANT_ID};

const EVENT_SIZE: f64 = 32.0;
const ACTIVITY_WIDTH: f64 = 100.0;
const ACTIVITY_HEIGHT: f64 = 60.0;
const GATEWAY_SIZE: f64 = 40.0;
const PARTICIPANT_WIDTH: f64 = 100.0;
const PARTICIPANT_HEIGHT: f64 = 140.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    fn centered(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Bounds { x: cx - width / 2.0, y: cy - height / 2.0, width, height }
    }

    pub fn center(&self) -> Point {
        Point { x: self.x + self.width / 2.0, y: self.y + self.height / 2.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub element_id: String,
    pub bounds: Bounds,
}

impl Shape {
    pub fn shape_id(&self) -> String {
        format!("BPMNShape_{}", self.element_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub flow_id: String,
    pub source_element: String,
    pub target_element: String,
    pub waypoints: Vec<Point>,
}

impl Edge {
    pub fn edge_id(&self) -> String {
        format!("BPMNEdge_{}", self.flow_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagram {
    pub shapes: Vec<Shape>,
    pub edges: Vec<Edge>,
}

impl Diagram {
    pub fn shape(&self, element_id: &str) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.element_id == element_id)
    }
}

/// Grid position of a flow node: (column, row).
type Cell = (usize, usize);

/// Assigns columns by depth and rows by branch, walking from the start event.
fn assign_cells(iflow: &Iflow) -> HashMap<String, Cell> {
    let mut cells: HashMap<String, Cell> = HashMap::new();
    let mut next_row = 1;
    let mut queue: VecDeque<(String, Cell)> = VecDeque::new();
    queue.push_back((iflow.start_event.element_id.clone(), (0, 0)));

    while let Some((node, cell)) = queue.pop_front() {
        if cells.contains_key(&node) {
            continue;
        }
        cells.insert(node.clone(), cell);

        for (index, flow) in iflow.flows_from(&node).enumerate() {
            let row = if index == 0 {
                cell.1
            } else {
                let row = next_row;
                next_row += 1;
                row
            };
            queue.push_back((flow.target.clone(), (cell.0 + 1, row)));
        }
    }
    cells
}

fn node_size(iflow: &Iflow, element_id: &str) -> (f64, f64) {
    match iflow.component(element_id).map(|c| c.kind.element_type()) {
        Some(BpmnElementType::ExclusiveGateway) => (GATEWAY_SIZE, GATEWAY_SIZE),
        Some(_) => (ACTIVITY_WIDTH, ACTIVITY_HEIGHT),
        None => (EVENT_SIZE, EVENT_SIZE),
    }
}

/// Computes shape bounds for every participant and flow node, and edge
/// waypoints for every sequence and message flow.
pub fn compute(iflow: &Iflow, config: &LayoutConfig) -> Diagram {
    let cells = assign_cells(iflow);
    let columns = cells.values().map(|c| c.0).max().unwrap_or(0) + 1;
    let rows = cells.values().map(|c| c.1).max().unwrap_or(0) + 1;

    let has_sender = iflow.participants.iter().any(|p| p.role == EndpointRole::Sender);
    let pool_x = if has_sender {
        config.origin_x + PARTICIPANT_WIDTH + config.participant_gap
    } else {
        config.origin_x
    };
    let pool_y = config.origin_y;
    let pool_width = columns as f64 * config.column_width + 2.0 * config.pool_padding;
    let pool_height = (rows as f64 * config.row_height + 2.0 * config.pool_padding).max(PARTICIPANT_HEIGHT + 2.0 * config.pool_padding);

    let mut diagram = Diagram::default();

    diagram.shapes.push(Shape {
        element_id: PROCESS_PARTICIPANT_ID.to_string(),
        bounds: Bounds { x: pool_x, y: pool_y, width: pool_width, height: pool_height },
    });

    // Flow nodes in XML order: start, components, end events
    let mut node_ids: Vec<&str> = vec![iflow.start_event.element_id.as_str()];
    node_ids.extend(iflow.components.iter().map(|c| c.element_id.as_str()));
    node_ids.extend(iflow.end_events.iter().map(|e| e.element_id.as_str()));

    for element_id in node_ids {
        let Some(&(column, row)) = cells.get(element_id) else {
            continue;
        };
        let (width, height) = node_size(iflow, element_id);
        let cx = pool_x + config.pool_padding + column as f64 * config.column_width + config.column_width / 2.0;
        let cy = pool_y + config.pool_padding + row as f64 * config.row_height + config.row_height / 2.0;
        diagram.shapes.push(Shape { element_id: element_id.to_string(), bounds: Bounds::centered(cx, cy, width, height) });
    }

    let mut receiver_index = 0;
    for participant in &iflow.participants {
        let bounds = match participant.role {
            EndpointRole::Sender => Bounds {
                x: config.origin_x,
                y: pool_y + pool_height / 2.0 - PARTICIPANT_HEIGHT / 2.0,
                width: PARTICIPANT_WIDTH,
                height: PARTICIPANT_HEIGHT,
            },
            EndpointRole::Receiver => {
                let y = pool_y + receiver_index as f64 * (PARTICIPANT_HEIGHT + config.pool_padding);
                receiver_index += 1;
                Bounds {
                    x: pool_x + pool_width + config.participant_gap,
                    y,
                    width: PARTICIPANT_WIDTH,
                    height: PARTICIPANT_HEIGHT,
                }
            }
        };
        diagram.shapes.push(Shape { element_id: participant.element_id.clone(), bounds });
    }

    for flow in &iflow.sequence_flows {
        if let Some(edge) = edge_between(&diagram, &flow.element_id, &flow.source, &flow.target, true) {
            diagram.edges.push(edge);
        }
    }
    for flow in &iflow.message_flows {
        if let Some(edge) = edge_between(&diagram, &flow.element_id, &flow.source, &flow.target, false) {
            diagram.edges.push(edge);
        }
    }

    diagram
}

/// Straight line between shape centers; sequence flows changing rows get an elbow.
fn edge_between(diagram: &Diagram, flow_id: &str, source: &str, target: &str, orthogonal: bool) -> Option<Edge> {
    let from = diagram.shape(source)?.bounds.center();
    let to = diagram.shape(target)?.bounds.center();

    let mut waypoints = vec![from];
    if orthogonal && (from.y - to.y).abs() > f64::EPSILON {
        waypoints.push(Point { x: from.x, y: to.y });
    }
    waypoints.push(to);

    Some(Edge {
        flow_id: flow_id.to_string(),
        source_element: format!("BPMNShape_{}", source),
        target_element: format!("BPMNShape_{}", target),
        waypoints,
    })
}
