use crate::domain::iflow::COLLABORATION_ID;
use crate::domain::layout::{Bounds, Diagram};
use crate::error::Result;
use crate::generator::{XmlWriter, empty, end, start};

fn coordinate(value: f64) -> String {
    format!("{:.1}", value)
}

fn write_bounds(writer: &mut XmlWriter, bounds: &Bounds) -> Result<()> {
    let (height, width) = (coordinate(bounds.height), coordinate(bounds.width));
    let (x, y) = (coordinate(bounds.x), coordinate(bounds.y));
    empty(
        writer,
        "dc:Bounds",
        &[("height", height.as_str()), ("width", width.as_str()), ("x", x.as_str()), ("y", y.as_str())],
    )
}

/// Writes `bpmndi:BPMNDiagram` with one shape per node and one edge per flow.
pub fn write_diagram(writer: &mut XmlWriter, diagram: &Diagram) -> Result<()> {
    start(writer, "bpmndi:BPMNDiagram", &[("id", "BPMNDiagram_1"), ("name", "Default Collaboration Diagram")])?;
    start(writer, "bpmndi:BPMNPlane", &[("bpmnElement", COLLABORATION_ID), ("id", "BPMNPlane_1")])?;

    for shape in &diagram.shapes {
        let shape_id = shape.shape_id();
        start(writer, "bpmndi:BPMNShape", &[("bpmnElement", shape.element_id.as_str()), ("id", shape_id.as_str())])?;
        write_bounds(writer, &shape.bounds)?;
        end(writer, "bpmndi:BPMNShape")?;
    }

    for edge in &diagram.edges {
        let edge_id = edge.edge_id();
        start(
            writer,
            "bpmndi:BPMNEdge",
            &[
                ("bpmnElement", edge.flow_id.as_str()),
                ("id", edge_id.as_str()),
                ("sourceElement", edge.source_element.as_str()),
                ("targetElement", edge.target_element.as_str()),
            ],
        )?;
        for point in &edge.waypoints {
            let (x, y) = (coordinate(point.x), coordinate(point.y));
            empty(writer, "di:waypoint", &[("x", x.as_str()), ("xsi:type", "dc:Point"), ("y", y.as_str())])?;
        }
        end(writer, "bpmndi:BPMNEdge")?;
    }

    end(writer, "bpmndi:BPMNPlane")?;
    end(writer, "bpmndi:BPMNDiagram")
}
