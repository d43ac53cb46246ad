//! Reads Sterling B2B business process (BPML) documents into an activity tree.

use std::collections::BTreeMap;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Serialize;

use crate::error::{Error, Result};

/// Generic element node, prefixes stripped.
#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    fn owned_attr(&self, key: &str) -> Option<String> {
        self.attr(key).map(str::to_string)
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BpmlProcess {
    pub name: String,
    pub rules: Vec<Rule>,
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub name: String,
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assign {
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub append: bool,
}

/// The `output` or `input` block of an operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub assigns: Vec<Assign>,
}

/// One `case` of a choice `select`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Case {
    pub rule: String,
    pub negative: bool,
    pub activity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Activity {
    Sequence {
        name: Option<String>,
        activities: Vec<Activity>,
    },
    Choice {
        name: Option<String>,
        cases: Vec<Case>,
        branches: Vec<Activity>,
    },
    Operation {
        name: Option<String>,
        participant: Option<String>,
        output: Option<MessageBlock>,
        input: Option<MessageBlock>,
    },
    Assign(Assign),
    Repeat {
        name: Option<String>,
        reference: Option<String>,
    },
    OnFault {
        code: Option<String>,
        activities: Vec<Activity>,
    },
    Spawn {
        name: Option<String>,
        activities: Vec<Activity>,
    },
    /// Any other element, kept so the outline stays complete.
    Other {
        element: String,
        name: Option<String>,
    },
}

impl Activity {
    pub fn kind_label(&self) -> &'static str {
        match self {
            Activity::Sequence { .. } => "Sequence",
            Activity::Choice { .. } => "Choice",
            Activity::Operation { .. } => "Operation",
            Activity::Assign(_) => "Assign",
            Activity::Repeat { .. } => "Repeat",
            Activity::OnFault { .. } => "On Fault",
            Activity::Spawn { .. } => "Spawn",
            Activity::Other { .. } => "Element",
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Activity::Sequence { name, .. }
            | Activity::Choice { name, .. }
            | Activity::Operation { name, .. }
            | Activity::Repeat { name, .. }
            | Activity::Spawn { name, .. }
            | Activity::Other { name, .. } => name.as_deref(),
            Activity::OnFault { code, .. } => code.as_deref(),
            Activity::Assign(assign) => Some(assign.to.as_str()),
        }
    }

    /// Nested activities, in document order.
    pub fn children(&self) -> &[Activity] {
        match self {
            Activity::Sequence { activities, .. }
            | Activity::OnFault { activities, .. }
            | Activity::Spawn { activities, .. } => activities,
            Activity::Choice { branches, .. } => branches,
            _ => &[],
        }
    }
}

/// Totals shown in the overview and in the JSON output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessSummary {
    pub name: String,
    pub activities: usize,
    pub operations: usize,
    pub assigns: usize,
    pub rules: usize,
    pub participants: Vec<String>,
}

impl BpmlProcess {
    /// Depth first walk over every activity with its nesting depth.
    pub fn walk(&self) -> Vec<(usize, &Activity)> {
        fn visit<'a>(activities: &'a [Activity], depth: usize, out: &mut Vec<(usize, &'a Activity)>) {
            for activity in activities {
                out.push((depth, activity));
                visit(activity.children(), depth + 1, out);
            }
        }
        let mut out = Vec::new();
        visit(&self.activities, 0, &mut out);
        out
    }

    /// Participants called by operations, mapped to the operations using them.
    pub fn participants(&self) -> BTreeMap<String, Vec<String>> {
        let mut participants: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (_, activity) in self.walk() {
            if let Activity::Operation { name, participant: Some(participant), .. } = activity {
                let users = participants.entry(participant.clone()).or_default();
                if let Some(name) = name {
                    if !users.contains(name) {
                        users.push(name.clone());
                    }
                }
            }
        }
        participants
    }

    pub fn summary(&self) -> ProcessSummary {
        let all = self.walk();
        ProcessSummary {
            name: self.name.clone(),
            activities: all.len(),
            operations: all.iter().filter(|(_, a)| matches!(a, Activity::Operation { .. })).count(),
            assigns: all.iter().filter(|(_, a)| matches!(a, Activity::Assign(_))).count(),
            rules: self.rules.len(),
            participants: self.participants().into_keys().collect(),
        }
    }

    /// `{ "summary": ..., "process": ... }` as pretty printed JSON.
    pub fn to_json(&self) -> Result<String> {
        #[derive(Serialize)]
        struct Report<'a> {
            summary: ProcessSummary,
            process: &'a BpmlProcess,
        }
        Ok(serde_json::to_string_pretty(&Report { summary: self.summary(), process: self })?)
    }
}

pub fn parse_bpml_file(path: impl AsRef<Path>) -> Result<BpmlProcess> {
    let path = path.as_ref();
    let xml = std::fs::read_to_string(path)?;
    let process = parse_bpml(&xml)?;
    log::info!("BPML process '{}' parsed from '{}'.", process.name, path.display());
    Ok(process)
}

pub fn parse_bpml(xml: &str) -> Result<BpmlProcess> {
    let root = read_tree(xml)?;
    if root.name != "process" {
        return Err(Error::BpmlParseError(format!("expected a <process> root element, found <{}>", root.name)));
    }

    let name = root.owned_attr("name").unwrap_or_else(|| "Unnamed Process".to_string());
    let rules = root
        .children_named("rule")
        .map(|rule| Rule {
            name: rule.owned_attr("name").unwrap_or_default(),
            condition: rule.child("condition").map(|c| c.text.clone()).unwrap_or_default(),
        })
        .collect();
    let activities = activities(&root);

    log::debug!("Process '{}' has {} top level activities.", name, activities.len());
    Ok(BpmlProcess { name, rules, activities })
}

fn read_tree(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text_start = true;
    reader.config_mut().trim_text_end = true;

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(element_from(&e)?),
            Event::Empty(e) => attach(&mut stack, &mut root, element_from(&e)?)?,
            Event::Text(e) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&e.unescape()?);
                }
            }
            Event::CData(e) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element)?;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(Error::BpmlParseError(format!("element <{}> is never closed", open.name)));
    }
    root.ok_or_else(|| Error::BpmlParseError("document has no root element".to_string()))
}

fn element_from(start: &BytesStart) -> Result<Element> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).to_string();
    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).to_string();
        let value = attribute.unescape_value()?.into_owned();
        attributes.push((key, value));
    }
    Ok(Element { name, attributes, ..Element::default() })
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(Error::BpmlParseError(format!("second root element <{}>", element.name)));
        }
    }
    Ok(())
}

fn activities(parent: &Element) -> Vec<Activity> {
    parent.children.iter().filter_map(activity).collect()
}

/// Converts an element into an activity; structural children such as
/// `rule`, `select` or `participant` yield `None`.
fn activity(element: &Element) -> Option<Activity> {
    let name = element.owned_attr("name");
    let activity = match element.name.as_str() {
        "sequence" => Activity::Sequence { name, activities: activities(element) },
        "choice" => Activity::Choice {
            name,
            cases: element
                .child("select")
                .map(|select| {
                    select
                        .children_named("case")
                        .map(|case| Case {
                            rule: case.owned_attr("ref").unwrap_or_default(),
                            negative: case.attr("negative").is_some_and(|v| v.eq_ignore_ascii_case("true")),
                            activity: case.owned_attr("activity").unwrap_or_default(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
            branches: activities(element),
        },
        "operation" => Activity::Operation {
            name,
            participant: element.child("participant").and_then(|p| p.owned_attr("name")),
            output: element.child("output").map(message_block),
            input: element.child("input").map(message_block),
        },
        "assign" => Activity::Assign(assign(element)),
        "repeat" => Activity::Repeat { name, reference: element.owned_attr("ref") },
        "onFault" => Activity::OnFault { code: element.owned_attr("code"), activities: activities(element) },
        "spawn" => Activity::Spawn { name, activities: activities(element) },
        "rule" | "condition" | "select" | "case" | "participant" | "output" | "input" => return None,
        other => Activity::Other { element: other.to_string(), name },
    };
    Some(activity)
}

fn assign(element: &Element) -> Assign {
    let text = element.text.trim();
    Assign {
        to: element.owned_attr("to").unwrap_or_default(),
        from: element.owned_attr("from"),
        value: if text.is_empty() { None } else { Some(text.to_string()) },
        append: element.attr("append").is_some_and(|v| v.eq_ignore_ascii_case("true")),
    }
}

fn message_block(element: &Element) -> MessageBlock {
    MessageBlock {
        message: element.owned_attr("message"),
        assigns: element.children_named("assign").map(assign).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROCESS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<process name="InboundOrders">
  <rule name="IsValid">
    <condition>Status = 'OK'</condition>
  </rule>
  <sequence name="Main">
    <operation name="Translate">
      <participant name="TranslationService"/>
      <output message="TranslationTypeInputMessage">
        <assign to="map_name">OrderMap</assign>
        <assign to="." from="*"/>
      </output>
      <input message="inmsg">
        <assign to="." from="*"/>
      </input>
    </operation>
    <choice name="CheckStatus">
      <select>
        <case ref="IsValid" activity="Deliver"/>
        <case ref="IsValid" negative="true" activity="Reject"/>
      </select>
      <sequence name="Deliver">
        <assign to="Target" from="string('ERP')" append="true"/>
      </sequence>
      <sequence name="Reject">
        <repeat name="Retry" ref="Main"/>
      </sequence>
    </choice>
  </sequence>
</process>"#;

    #[test]
    fn test_parse_activity_tree() {
        let process = parse_bpml(PROCESS).unwrap();

        assert_eq!(process.name, "InboundOrders");
        assert_eq!(process.rules, vec![Rule { name: "IsValid".to_string(), condition: "Status = 'OK'".to_string() }]);
        assert_eq!(process.activities.len(), 1);

        let Activity::Sequence { activities, .. } = &process.activities[0] else {
            panic!("expected a sequence");
        };
        let Activity::Operation { participant, output, input, .. } = &activities[0] else {
            panic!("expected an operation");
        };
        assert_eq!(participant.as_deref(), Some("TranslationService"));
        let output = output.as_ref().unwrap();
        assert_eq!(output.assigns[0].value.as_deref(), Some("OrderMap"));
        assert_eq!(output.assigns[1].from.as_deref(), Some("*"));
        assert_eq!(input.as_ref().unwrap().message.as_deref(), Some("inmsg"));

        let Activity::Choice { cases, branches, .. } = &activities[1] else {
            panic!("expected a choice");
        };
        assert_eq!(cases.len(), 2);
        assert!(cases[1].negative);
        assert_eq!(branches.len(), 2);
    }

    #[test]
    fn test_summary_counts_nested_activities() {
        let summary = parse_bpml(PROCESS).unwrap().summary();

        // Main, Translate, CheckStatus, Deliver, assign, Reject, Retry
        assert_eq!(summary.activities, 7);
        assert_eq!(summary.operations, 1);
        assert_eq!(summary.assigns, 1);
        assert_eq!(summary.participants, vec!["TranslationService".to_string()]);
    }

    #[test]
    fn test_wrong_root_and_broken_xml_are_rejected() {
        assert!(matches!(parse_bpml("<definitions/>"), Err(Error::BpmlParseError(_))));
        assert!(parse_bpml("<process><sequence></process>").is_err());
        assert!(matches!(parse_bpml(""), Err(Error::BpmlParseError(_))));
    }

    #[test]
    fn test_json_report_has_summary_and_tree() {
        let json = parse_bpml(PROCESS).unwrap().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["summary"]["operations"], 1);
        assert_eq!(value["process"]["activities"][0]["kind"], "sequence");
        assert_eq!(value["process"]["activities"][0]["activities"][1]["cases"][1]["negative"], true);
    }
}
