use crate::domain::property::PropertySet;

/// A directed edge of the integration process, between element ids.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceFlow {
    pub element_id: String,
    /// Id from the metadata JSON; synthesized flows have none.
    pub metadata_id: Option<String>,
    pub name: Option<String>,
    pub source: String,
    pub target: String,
    pub condition: Option<String>,
    pub is_default: bool,
}

impl SequenceFlow {
    pub fn new(element_id: String, source: &str, target: &str) -> Self {
        SequenceFlow {
            element_id,
            metadata_id: None,
            name: None,
            source: source.to_string(),
            target: target.to_string(),
            condition: None,
            is_default: false,
        }
    }

    /// Id used in error messages: the metadata id when there is one.
    pub fn display_id(&self) -> &str {
        self.metadata_id.as_deref().unwrap_or(&self.element_id)
    }

    /// Properties of a router route. XPath conditions are evaluated as XML,
    /// everything else as a Camel simple expression.
    pub fn route_properties(&self) -> PropertySet {
        let expression_type = match &self.condition {
            Some(condition) if condition.trim_start().starts_with('/') => "XML",
            _ => "NonXML",
        };
        PropertySet::from_pairs(&[
            ("expressionType", expression_type),
            ("componentVersion", "1.0"),
            ("cmdVariantUri", "ctype::FlowElementVariant/cname::GatewayRoute/version::1.0.0"),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_expression_type() {
        let mut flow = SequenceFlow::new("SequenceFlow_1".to_string(), "ExclusiveGateway_1", "CallActivity_1");
        flow.condition = Some("/Order/Priority = 'HIGH'".to_string());
        assert_eq!(flow.route_properties().get("expressionType"), Some("XML"));

        flow.condition = Some("${header.priority} = 'HIGH'".to_string());
        assert_eq!(flow.route_properties().get("expressionType"), Some("NonXML"));
        assert_eq!(flow.display_id(), "SequenceFlow_1");
    }
}
